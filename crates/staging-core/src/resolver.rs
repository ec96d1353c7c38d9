//! # Resolver
//!
//! Locates nodes and facets in a loaded stage. Every addressing step
//! filters one child collection and requires **exactly one** match: zero
//! matches and several matches both fail with the level's `NotFound`.
//! Duplicate or colliding names therefore surface as client-visible
//! errors instead of an arbitrary pick.
//!
//! | Step                         | Compared against      | Policy                 |
//! |------------------------------|-----------------------|------------------------|
//! | stage → segment              | `identifier`          | raw                    |
//! | segment → material suite     | `content.name`        | [`MatchPolicy::Escaped`] |
//! | suite → presform             | `content.name`        | [`MatchPolicy::Raw`]     |
//! | suite → technical metadata   | `name`                | [`MatchPolicy::Escaped`] |

use crate::codec::MatchPolicy;
use crate::error::{Level, StagingError};
use crate::store::{StageStore, StoreError};
use crate::tree::{Item, MaterialSuite, Presform, Segment, Stage};

/// Policy for suite lookup within a segment.
pub const MATERIAL_SUITE_POLICY: MatchPolicy = MatchPolicy::Escaped;
/// Policy for presform lookup within a suite.
pub const PRESFORM_POLICY: MatchPolicy = MatchPolicy::Raw;
/// Policy for technical-metadata lookup within a suite.
pub const TECHNICAL_METADATA_POLICY: MatchPolicy = MatchPolicy::Escaped;

/// Return the single element satisfying `pred`, or `NotFound(level)`.
fn exactly_one<'a, T: 'a>(
    items: impl IntoIterator<Item = &'a T>,
    mut pred: impl FnMut(&T) -> bool,
    level: Level,
) -> Result<&'a T, StagingError> {
    let mut found = None;
    for item in items {
        if pred(item) {
            if found.is_some() {
                tracing::debug!(%level, "ambiguous identifier");
                return Err(StagingError::not_found(level));
            }
            found = Some(item);
        }
    }
    found.ok_or_else(|| StagingError::not_found(level))
}

/// Load a stage from the storage collaborator.
///
/// A missing stage is a stage-level `NotFound`; any other storage failure
/// is `StorageUnavailable`. Both render as `"Bad Stage Identifier"`.
pub fn resolve_stage<S>(store: &S, stage_id: &str) -> Result<Stage, StagingError>
where
    S: StageStore + ?Sized,
{
    match store.load_stage(stage_id) {
        Ok(stage) => Ok(stage),
        Err(StoreError::StageNotFound(_)) => Err(StagingError::not_found(Level::Stage)),
        Err(source) => {
            tracing::warn!(stage_id, error = %source, "stage could not be loaded");
            Err(StagingError::StorageUnavailable {
                stage_id: Some(stage_id.to_string()),
                source,
            })
        }
    }
}

pub fn resolve_segment<'a>(stage: &'a Stage, segment_id: &str) -> Result<&'a Segment, StagingError> {
    exactly_one(
        &stage.segments,
        |s| s.identifier == segment_id,
        Level::Segment,
    )
}

/// `ms_id_escaped` is the escaped suite identifier, as listed to clients.
pub fn resolve_material_suite<'a>(
    segment: &'a Segment,
    ms_id_escaped: &str,
) -> Result<&'a MaterialSuite, StagingError> {
    exactly_one(
        &segment.material_suites,
        |ms| MATERIAL_SUITE_POLICY.matches(ms.name(), ms_id_escaped),
        Level::MaterialSuite,
    )
}

/// `presform_id` is the raw (unescaped) content name of the presform.
pub fn resolve_presform<'a>(
    suite: &'a MaterialSuite,
    presform_id: &str,
) -> Result<&'a Presform, StagingError> {
    exactly_one(
        &suite.presforms,
        |p| PRESFORM_POLICY.matches(p.name(), presform_id),
        Level::Presform,
    )
}

/// Walk a chain of presform identifiers, one nesting level per element.
///
/// An empty chain resolves to `suite` itself.
pub fn resolve_presform_chain<'a, I>(
    suite: &'a MaterialSuite,
    chain: I,
) -> Result<&'a MaterialSuite, StagingError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    chain
        .into_iter()
        .try_fold(suite, |current, id| resolve_presform(current, id.as_ref()))
}

/// `techmd_id_escaped` is the escaped metadata name, as listed to clients.
pub fn resolve_technical_metadata<'a>(
    suite: &'a MaterialSuite,
    techmd_id_escaped: &str,
) -> Result<&'a Item, StagingError> {
    exactly_one(
        &suite.technical_metadata,
        |t| TECHNICAL_METADATA_POLICY.matches(&t.name, techmd_id_escaped),
        Level::TechnicalMetadata,
    )
}

pub fn resolve_premis(suite: &MaterialSuite) -> Result<&Item, StagingError> {
    suite
        .premis
        .as_ref()
        .ok_or_else(|| StagingError::not_found(Level::Premis))
}
