//! # Execution Pipeline
//!
//! Runs a parsed [`Address`] against a [`StageStore`]: load the stage, walk
//! segment, suite and presform chain, then select the requested facet.
//! Resolution stops at the first failing level.

use serde_json::{Map, Value};

use crate::address::{Address, Facet, SuitePath};
use crate::codec::escape;
use crate::error::StagingError;
use crate::projection::{
    to_data, PresformListing, PresformSummary, SegmentSummary, StageListing, StageSummary,
    SuiteContext, SuiteSummary, TechnicalMetadataListing,
};
use crate::resolver::{
    resolve_material_suite, resolve_premis, resolve_presform_chain, resolve_segment,
    resolve_stage, resolve_technical_metadata,
};
use crate::store::StageStore;
use crate::tree::Item;

/// Result of executing an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A projection, destined for the `data` field of a success envelope.
    Data(Map<String, Value>),
    /// A leaf item to be delivered as an attachment.
    Item(Item),
}

impl Outcome {
    pub fn into_data(self) -> Option<Map<String, Value>> {
        match self {
            Self::Data(map) => Some(map),
            Self::Item(_) => None,
        }
    }

    pub fn into_item(self) -> Option<Item> {
        match self {
            Self::Item(item) => Some(item),
            Self::Data(_) => None,
        }
    }
}

/// Execute `address` against `store`.
///
/// # Errors
///
/// - [`StagingError::NotFound`] at the first level that does not resolve
///   to exactly one node.
/// - [`StagingError::StorageUnavailable`] when the store cannot list or
///   load stages.
pub fn execute<S>(store: &S, address: &Address) -> Result<Outcome, StagingError>
where
    S: StageStore + ?Sized,
{
    let outcome = match address {
        Address::Stages => {
            let stages = store.list_stage_identifiers().map_err(|source| {
                tracing::warn!(error = %source, "stage listing failed");
                StagingError::StorageUnavailable {
                    stage_id: None,
                    source,
                }
            })?;
            Outcome::Data(to_data(&StageListing { stages })?)
        }
        Address::Stage { stage_id } => {
            let stage = resolve_stage(store, stage_id)?;
            Outcome::Data(to_data(&StageSummary::new(&stage))?)
        }
        Address::Segment {
            stage_id,
            segment_id,
        } => {
            let stage = resolve_stage(store, stage_id)?;
            let segment = resolve_segment(&stage, segment_id)?;
            Outcome::Data(to_data(&SegmentSummary::new(&stage, segment))?)
        }
        Address::Suite { path, facet } => execute_suite(store, path, facet)?,
    };
    tracing::debug!(address = %address.to_raw_path(), "address resolved");
    Ok(outcome)
}

fn execute_suite<S>(store: &S, path: &SuitePath, facet: &Facet) -> Result<Outcome, StagingError>
where
    S: StageStore + ?Sized,
{
    let stage = resolve_stage(store, &path.stage_id)?;
    let segment = resolve_segment(&stage, &path.segment_id)?;
    let suite = resolve_material_suite(segment, &escape(&path.ms_id))?;
    let node = resolve_presform_chain(suite, &path.presforms)?;
    let ctx = SuiteContext::new(&stage, segment, suite, &path.presforms);

    let outcome = match facet {
        Facet::Summary if path.presforms.is_empty() => {
            Outcome::Data(to_data(&SuiteSummary::new(&ctx, node))?)
        }
        Facet::Summary => Outcome::Data(to_data(&PresformSummary::new(&ctx, node))?),
        Facet::Content => Outcome::Item(node.content.clone()),
        Facet::Premis => Outcome::Item(resolve_premis(node)?.clone()),
        Facet::TechnicalMetadataList => {
            Outcome::Data(to_data(&TechnicalMetadataListing::new(&ctx, node))?)
        }
        Facet::TechnicalMetadata(techmd_id) => {
            Outcome::Item(resolve_technical_metadata(node, &escape(techmd_id))?.clone())
        }
        Facet::PresformList => Outcome::Data(to_data(&PresformListing::new(&ctx, node))?),
    };
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Level;
    use crate::store::StoreError;
    use crate::tree::{MaterialSuite, Segment, Stage};
    use serde_json::json;

    struct OneStage(Stage);

    impl StageStore for OneStage {
        fn list_stage_identifiers(&self) -> Result<Vec<String>, StoreError> {
            Ok(vec![self.0.identifier.clone()])
        }

        fn load_stage(&self, identifier: &str) -> Result<Stage, StoreError> {
            if identifier == self.0.identifier {
                Ok(self.0.clone())
            } else {
                Err(StoreError::StageNotFound(identifier.to_string()))
            }
        }
    }

    fn fixture() -> OneStage {
        let b = MaterialSuite::new(Item::inline("b.jpg", "b-bytes"))
            .with_technical_metadata(Item::inline("b-fits.xml", "<b/>"));
        let a = MaterialSuite::new(Item::inline("a.pdf", "a-bytes"))
            .with_technical_metadata(Item::inline("a-fits.xml", "<a/>"))
            .with_premis(Item::inline("a-premis.xml", "<p/>"))
            .with_presform(b);
        let one = MaterialSuite::new(Item::inline("file one.txt", "hello"))
            .with_technical_metadata(Item::inline("fits.xml", "<fits/>"));
        let two = MaterialSuite::new(Item::inline("scan.tif", "tif")).with_presform(a);
        OneStage(
            Stage::new("S1").with_segment(
                Segment::new("G1")
                    .with_material_suite(one)
                    .with_material_suite(two),
            ),
        )
    }

    fn run(store: &OneStage, raw: &str) -> Result<Outcome, StagingError> {
        execute(store, &Address::from_raw_path(raw)?)
    }

    fn data(store: &OneStage, raw: &str) -> Value {
        Value::Object(run(store, raw).unwrap().into_data().unwrap())
    }

    #[test]
    fn lists_stages() {
        assert_eq!(data(&fixture(), ""), json!({ "stages": ["S1"] }));
    }

    #[test]
    fn segment_listing_is_escaped_and_resolvable() {
        let store = fixture();
        let listing = data(&store, "S1/G1");
        assert_eq!(listing["material_suites"], json!(["file%20one.txt", "scan.tif"]));

        let summary = data(&store, "S1/G1/file%20one.txt");
        assert_eq!(summary["materialsuite_id"], json!("file%20one.txt"));
    }

    #[test]
    fn suite_summary_reports_presence() {
        let summary = data(&fixture(), "S1/G1/file%20one.txt");
        assert_eq!(summary["has_techmds"], json!(true));
        assert_eq!(summary["has_premis"], json!(false));
        assert_eq!(summary["has_presforms"], json!(false));
    }

    #[test]
    fn nested_presform_has_its_own_technical_metadata() {
        let store = fixture();
        let inner = data(&store, "S1/G1/scan.tif/presforms/a.pdf/presforms/b.jpg/techmds");
        assert_eq!(inner["tech_mds"], json!(["b-fits.xml"]));
        assert_eq!(inner["presform_chain"], json!(["a.pdf", "b.jpg"]));

        let outer = data(&store, "S1/G1/scan.tif/presforms/a.pdf/techmds");
        assert_eq!(outer["tech_mds"], json!(["a-fits.xml"]));
    }

    #[test]
    fn presform_summary_and_listing() {
        let store = fixture();
        let summary = data(&store, "S1/G1/scan.tif/presforms/a.pdf");
        assert_eq!(summary["presform_id"], json!("a.pdf"));
        assert_eq!(summary["premis"], json!("a-premis.xml"));
        assert_eq!(summary["presforms"], json!(["b.jpg"]));

        let listing = data(&store, "S1/G1/scan.tif/presforms");
        assert_eq!(listing["presforms"], json!(["a.pdf"]));
        assert_eq!(listing["presform_chain"], json!([]));
    }

    #[test]
    fn facets_yield_items() {
        let store = fixture();
        let content = run(&store, "S1/G1/file%20one.txt/content")
            .unwrap()
            .into_item()
            .unwrap();
        assert_eq!(content.read_all().unwrap(), b"hello");

        let techmd = run(&store, "S1/G1/file%20one.txt/techmds/fits.xml")
            .unwrap()
            .into_item()
            .unwrap();
        assert_eq!(techmd.name, "fits.xml");

        let premis = run(&store, "S1/G1/scan.tif/presforms/a.pdf/premis")
            .unwrap()
            .into_item()
            .unwrap();
        assert_eq!(premis.name, "a-premis.xml");
    }

    #[test]
    fn failures_name_their_level() {
        let store = fixture();
        let cases = [
            ("S2", Level::Stage),
            ("S1/G2", Level::Segment),
            ("S1/G1/file%20two.txt", Level::MaterialSuite),
            ("S1/G1/scan.tif/presforms/missing", Level::Presform),
            ("S1/G1/file%20one.txt/techmds/none.xml", Level::TechnicalMetadata),
            ("S1/G1/file%20one.txt/premis", Level::Premis),
        ];
        for (raw, level) in cases {
            let err = run(&store, raw).unwrap_err();
            assert_eq!(err.level(), Some(level), "{raw}");
        }
    }

    #[test]
    fn resolution_is_idempotent_across_loads() {
        let raw = "S1/G1/scan.tif/presforms/a.pdf/presforms/b.jpg";
        let first = run(&fixture(), raw).unwrap();
        let second = run(&fixture(), raw).unwrap();
        assert_eq!(first, second);
    }
}
