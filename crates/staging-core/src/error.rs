//! # Error Types: Staging Error Taxonomy
//!
//! Every failure the core can produce is one of three kinds:
//!
//! - [`ValidationError`]: a response envelope was constructed in violation
//!   of its contract. Always a programming error.
//! - [`StagingError::NotFound`]: addressing failed at exactly one tree level.
//! - [`StagingError::StorageUnavailable`]: the storage collaborator could
//!   not produce the stage. Rendered identically to a stage-level
//!   `NotFound`, but kept distinct so logs and tests can tell them apart.
//!
//! The HTTP boundary performs the final text rendering; inside the core
//! errors stay tagged.

use thiserror::Error;

use crate::store::StoreError;

/// Envelope contract violation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `status` was something other than `"success"` or `"fail"`.
    #[error("status MUST be 'success' or 'fail'")]
    InvalidStatus(String),

    /// `data` was neither null nor a mapping.
    #[error("data must be a mapping")]
    DataNotMapping,

    /// `errors` was neither null nor a sequence.
    #[error("errors must be an iterable of strings")]
    ErrorsNotIterable,

    /// An element of `errors` was not text.
    #[error("error must be a string")]
    ErrorNotText,

    /// A serialized envelope was not a JSON object.
    #[error("envelope must be an object with status, data and errors")]
    NotAnEnvelope,
}

/// The tree level at which an addressing step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Stage,
    Segment,
    MaterialSuite,
    Presform,
    TechnicalMetadata,
    Premis,
}

impl Level {
    /// Client-visible message for a failed lookup at this level.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Stage => "Bad Stage Identifier",
            Self::Segment => "Bad Segment Identifier",
            Self::MaterialSuite => "Bad MaterialSuite Identifier",
            Self::Presform => "Bad Presform Identifier",
            Self::TechnicalMetadata => "Bad Technical Metadata Identifier",
            Self::Premis => "Bad PREMIS Identifier",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Stage => "stage",
            Self::Segment => "segment",
            Self::MaterialSuite => "materialsuite",
            Self::Presform => "presform",
            Self::TechnicalMetadata => "technical_metadata",
            Self::Premis => "premis",
        };
        f.write_str(name)
    }
}

/// Top-level error for resolution and execution.
#[derive(Error, Debug)]
pub enum StagingError {
    /// Envelope construction failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No node, or more than one node, matched at `level`.
    #[error("{}", .level.message())]
    NotFound {
        /// Level at which the lookup failed.
        level: Level,
    },

    /// The storage collaborator failed.
    ///
    /// When a stage load failed this displays the same text as a
    /// stage-level `NotFound`; the cause is only available through
    /// [`std::error::Error::source`].
    #[error("{}", unavailable_message(.stage_id.is_some()))]
    StorageUnavailable {
        /// The stage identifier that was requested, or `None` when the
        /// stage listing itself failed.
        stage_id: Option<String>,
        /// Underlying collaborator failure.
        #[source]
        source: StoreError,
    },

    /// The request path does not describe any addressable resource.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

fn unavailable_message(loading_stage: bool) -> &'static str {
    if loading_stage {
        Level::Stage.message()
    } else {
        "Stage listing unavailable"
    }
}

impl StagingError {
    /// Shorthand for a level-specific `NotFound`.
    pub fn not_found(level: Level) -> Self {
        Self::NotFound { level }
    }

    /// The level this error is attributed to, if it is an addressing error.
    pub fn level(&self) -> Option<Level> {
        match self {
            Self::NotFound { level } => Some(*level),
            Self::StorageUnavailable { stage_id, .. } => stage_id.as_ref().map(|_| Level::Stage),
            Self::Validation(_) | Self::InvalidAddress(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_renders_level_message() {
        let err = StagingError::not_found(Level::MaterialSuite);
        assert_eq!(err.to_string(), "Bad MaterialSuite Identifier");
        assert_eq!(err.level(), Some(Level::MaterialSuite));
    }

    #[test]
    fn storage_unavailable_folds_into_stage_message() {
        let err = StagingError::StorageUnavailable {
            stage_id: Some("s1".to_string()),
            source: StoreError::Io(std::io::Error::other("disk gone")),
        };
        assert_eq!(err.to_string(), "Bad Stage Identifier");
        assert_eq!(err.level(), Some(Level::Stage));
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("io error: disk gone"));
    }

    #[test]
    fn listing_failure_has_its_own_message() {
        let err = StagingError::StorageUnavailable {
            stage_id: None,
            source: StoreError::Io(std::io::Error::other("eacces")),
        };
        assert_eq!(err.to_string(), "Stage listing unavailable");
        assert_eq!(err.level(), None);
    }

    #[test]
    fn validation_messages_are_distinct() {
        assert_ne!(
            ValidationError::ErrorsNotIterable.to_string(),
            ValidationError::ErrorNotText.to_string()
        );
    }
}
