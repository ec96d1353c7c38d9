//! # Custom Extractors
//!
//! [`StagingAddress`] reads the raw request path instead of axum's decoded
//! path parameters. Identifiers may contain an escaped `/` (`%2F`); the
//! address grammar must split before decoding, which decoded parameters
//! would make impossible.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use staging_core::{Address, StagingError};

use crate::error::AppError;

/// Mount point of the stage tree.
pub const STAGES_PREFIX: &str = "/v1/stages";

/// The [`Address`] named by the request path below [`STAGES_PREFIX`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingAddress(pub Address);

impl StagingAddress {
    /// Parse a full request path such as `/v1/stages/s1/g1`.
    pub fn from_request_path(path: &str) -> Result<Self, StagingError> {
        let rest = path
            .strip_prefix(STAGES_PREFIX)
            .filter(|rest| rest.is_empty() || rest.starts_with('/'))
            .ok_or_else(|| StagingError::InvalidAddress(format!("not a stage path: {path}")))?;
        Ok(Self(Address::from_raw_path(rest)?))
    }
}

impl<S> FromRequestParts<S> for StagingAddress
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_request_path(parts.uri.path())?)
    }
}
