//! # Storage Collaborator
//!
//! The core never reads storage itself. It asks a [`StageStore`] for a
//! fully materialized [`Stage`] and resolves against that snapshot.
//! Implementations may block; callers on an async runtime should move
//! calls onto a blocking pool.

use std::path::PathBuf;

use thiserror::Error;

use crate::tree::Stage;

/// Failure reported by a storage collaborator.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No stage with this identifier exists.
    #[error("stage not found: {0}")]
    StageNotFound(String),

    /// Stored data does not have the expected shape.
    #[error("malformed staging structure at {path}: {reason}")]
    Malformed {
        /// Location of the offending entry.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// Underlying I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of stages.
pub trait StageStore: Send + Sync {
    /// Identifiers of every stage known to storage.
    fn list_stage_identifiers(&self) -> Result<Vec<String>, StoreError>;

    /// Materialize one stage.
    fn load_stage(&self, identifier: &str) -> Result<Stage, StoreError>;
}

impl<T: StageStore + ?Sized> StageStore for std::sync::Arc<T> {
    fn list_stage_identifiers(&self) -> Result<Vec<String>, StoreError> {
        (**self).list_stage_identifiers()
    }

    fn load_stage(&self, identifier: &str) -> Result<Stage, StoreError> {
        (**self).load_stage(identifier)
    }
}
