//! # Listing Projections
//!
//! Read-only views of already-resolved nodes. Projections cannot fail on
//! their own; any failure happened upstream during resolution.
//!
//! Identifier presentation follows the lookup policy of the level being
//! listed: suites and technical metadata are listed escaped, segments and
//! presforms raw. A client can therefore feed a listed identifier straight
//! back into the matching lookup.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::resolver::{MATERIAL_SUITE_POLICY, PRESFORM_POLICY, TECHNICAL_METADATA_POLICY};
use crate::tree::{Item, MaterialSuite, Segment, Stage};

/// Convert a projection into an envelope `data` mapping.
///
/// # Errors
///
/// [`ValidationError::DataNotMapping`] if `projection` does not serialize
/// to a JSON object.
pub fn to_data<T: Serialize>(projection: &T) -> Result<Map<String, Value>, ValidationError> {
    match serde_json::to_value(projection) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(ValidationError::DataNotMapping),
    }
}

fn names(items: &[Item]) -> Vec<String> {
    items.iter().map(|i| i.name.clone()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageListing {
    pub stages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageSummary {
    pub stage_id: String,
    pub segments: Vec<String>,
    pub accession_records: Vec<String>,
    pub admin_notes: Vec<String>,
    pub legal_notes: Vec<String>,
}

impl StageSummary {
    pub fn new(stage: &Stage) -> Self {
        Self {
            stage_id: stage.identifier.clone(),
            segments: stage.segments.iter().map(|s| s.identifier.clone()).collect(),
            accession_records: names(&stage.accession_records),
            admin_notes: names(&stage.admin_notes),
            legal_notes: names(&stage.legal_notes),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentSummary {
    pub stage_id: String,
    pub segment_id: String,
    pub material_suites: Vec<String>,
}

impl SegmentSummary {
    pub fn new(stage: &Stage, segment: &Segment) -> Self {
        Self {
            stage_id: stage.identifier.clone(),
            segment_id: segment.identifier.clone(),
            material_suites: segment
                .material_suites
                .iter()
                .map(|ms| MATERIAL_SUITE_POLICY.present(ms.name()))
                .collect(),
        }
    }
}

/// Where a suite-shaped node sits in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteContext {
    pub stage_id: String,
    pub segment_id: String,
    /// Escaped identifier of the top-level suite.
    pub materialsuite_id: String,
    /// Raw presform identifiers walked from the top-level suite.
    pub presform_chain: Vec<String>,
}

impl SuiteContext {
    pub fn new(stage: &Stage, segment: &Segment, suite: &MaterialSuite, chain: &[String]) -> Self {
        Self {
            stage_id: stage.identifier.clone(),
            segment_id: segment.identifier.clone(),
            materialsuite_id: MATERIAL_SUITE_POLICY.present(suite.name()),
            presform_chain: chain.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuiteSummary {
    pub stage_id: String,
    pub segment_id: String,
    pub materialsuite_id: String,
    pub has_techmds: bool,
    pub has_premis: bool,
    pub has_presforms: bool,
}

impl SuiteSummary {
    pub fn new(ctx: &SuiteContext, suite: &MaterialSuite) -> Self {
        Self {
            stage_id: ctx.stage_id.clone(),
            segment_id: ctx.segment_id.clone(),
            materialsuite_id: ctx.materialsuite_id.clone(),
            has_techmds: suite.has_technical_metadata(),
            has_premis: suite.has_premis(),
            has_presforms: suite.has_presforms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TechnicalMetadataListing {
    pub stage_id: String,
    pub segment_id: String,
    pub materialsuite_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub presform_chain: Vec<String>,
    pub tech_mds: Vec<String>,
}

impl TechnicalMetadataListing {
    pub fn new(ctx: &SuiteContext, node: &MaterialSuite) -> Self {
        Self {
            stage_id: ctx.stage_id.clone(),
            segment_id: ctx.segment_id.clone(),
            materialsuite_id: ctx.materialsuite_id.clone(),
            presform_chain: ctx.presform_chain.clone(),
            tech_mds: node
                .technical_metadata
                .iter()
                .map(|t| TECHNICAL_METADATA_POLICY.present(&t.name))
                .collect(),
        }
    }
}

fn presform_ids(node: &MaterialSuite) -> Vec<String> {
    node.presforms
        .iter()
        .map(|p| PRESFORM_POLICY.present(p.name()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresformListing {
    pub stage_id: String,
    pub segment_id: String,
    pub materialsuite_id: String,
    pub presform_chain: Vec<String>,
    pub presforms: Vec<String>,
}

impl PresformListing {
    pub fn new(ctx: &SuiteContext, node: &MaterialSuite) -> Self {
        Self {
            stage_id: ctx.stage_id.clone(),
            segment_id: ctx.segment_id.clone(),
            materialsuite_id: ctx.materialsuite_id.clone(),
            presform_chain: ctx.presform_chain.clone(),
            presforms: presform_ids(node),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresformSummary {
    pub stage_id: String,
    pub segment_id: String,
    pub materialsuite_id: String,
    pub presform_id: String,
    pub presform_chain: Vec<String>,
    pub techmd: Vec<String>,
    pub premis: Option<String>,
    pub presforms: Vec<String>,
    pub has_techmds: bool,
    pub has_premis: bool,
    pub has_presforms: bool,
}

impl PresformSummary {
    pub fn new(ctx: &SuiteContext, presform: &MaterialSuite) -> Self {
        Self {
            stage_id: ctx.stage_id.clone(),
            segment_id: ctx.segment_id.clone(),
            materialsuite_id: ctx.materialsuite_id.clone(),
            presform_id: presform.name().to_string(),
            presform_chain: ctx.presform_chain.clone(),
            techmd: presform
                .technical_metadata
                .iter()
                .map(|t| TECHNICAL_METADATA_POLICY.present(&t.name))
                .collect(),
            premis: presform.premis.as_ref().map(|p| p.name.clone()),
            presforms: presform_ids(presform),
            has_techmds: presform.has_technical_metadata(),
            has_premis: presform.has_premis(),
            has_presforms: presform.has_presforms(),
        }
    }
}
