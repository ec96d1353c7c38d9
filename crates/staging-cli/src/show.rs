//! # Show CLI: resolve one staging address.
//!
//! `staging show <path>` parses an escaped identifier path such as
//! `s1/g1/a%20b.tif/presforms/a.jpg/techmds` and runs it through the
//! resolution pipeline. Listings and summaries are printed as a `success`
//! envelope; content, PREMIS and technical metadata are copied byte for
//! byte to `--output` or, without it, to stdout.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use staging_core::{execute, Address, Item, Outcome, ResponseEnvelope, StageStore};

use crate::{print_envelope, print_failure, EXIT_OK};

/// Show subcommand arguments.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Escaped identifier path below the stages root, e.g. `s1/g1/a%20b.tif`.
    pub path: String,

    /// Write item bytes to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Execute the show subcommand against `store`.
///
/// Envelopes, including failures, go to `out`. Item bytes go to
/// `args.output` when set and to `out` otherwise.
pub fn run_show<S>(args: &ShowArgs, store: &S, out: &mut dyn Write) -> Result<u8>
where
    S: StageStore + ?Sized,
{
    let address = match Address::from_raw_path(&args.path) {
        Ok(address) => address,
        Err(e) => return print_failure(out, e.to_string()),
    };

    match execute(store, &address) {
        Ok(Outcome::Data(data)) => {
            print_envelope(out, &ResponseEnvelope::success(data))?;
            Ok(EXIT_OK)
        }
        Ok(Outcome::Item(item)) => match copy_item(&item, args.output.as_deref(), out) {
            Ok(bytes) => {
                tracing::info!(item = %item.name, bytes, "item written");
                Ok(EXIT_OK)
            }
            Err(e) => {
                tracing::error!(item = %item.name, error = %e, "item could not be read");
                print_failure(out, format!("attachment could not be read: {e}"))
            }
        },
        Err(e) => {
            tracing::debug!(address = %address.to_raw_path(), error = %e, "resolution failed");
            print_failure(out, e.to_string())
        }
    }
}

fn copy_item(item: &Item, output: Option<&Path>, out: &mut dyn Write) -> io::Result<u64> {
    let mut reader = item.open()?;
    match output {
        Some(path) => {
            let mut file = File::create(path)?;
            let n = io::copy(&mut reader, &mut file)?;
            file.flush()?;
            Ok(n)
        }
        None => io::copy(&mut reader, out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EXIT_FAIL;
    use serde_json::{json, Value};
    use staging_core::{MaterialSuite, Presform, Segment, Stage};
    use staging_store::MemoryStageStore;

    fn store() -> MemoryStageStore {
        let suite = MaterialSuite::new(Item::inline("a b.tif", "tif bytes"))
            .with_technical_metadata(Item::inline("fits.xml", "<fits/>"))
            .with_presform(Presform::new(Item::inline("a.jpg", "jpg bytes")));
        let store = MemoryStageStore::new();
        store.insert(Stage::new("s1").with_segment(Segment::new("g1").with_material_suite(suite)));
        store
    }

    fn show(path: &str, output: Option<PathBuf>) -> (u8, Vec<u8>) {
        let args = ShowArgs {
            path: path.to_string(),
            output,
        };
        let mut out = Vec::new();
        let code = run_show(&args, &store(), &mut out).unwrap();
        (code, out)
    }

    #[test]
    fn prints_suite_summary() {
        let (code, out) = show("s1/g1/a%20b.tif", None);
        assert_eq!(code, EXIT_OK);
        let body: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["materialsuite_id"], "a%20b.tif");
        assert_eq!(body["data"]["has_presforms"], true);
    }

    #[test]
    fn writes_content_to_stdout() {
        let (code, out) = show("s1/g1/a%20b.tif/content", None);
        assert_eq!(code, EXIT_OK);
        assert_eq!(out, b"tif bytes");
    }

    #[test]
    fn writes_presform_content_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a.jpg");
        let (code, out) = show("s1/g1/a%20b.tif/presforms/a.jpg/content", Some(target.clone()));
        assert_eq!(code, EXIT_OK);
        assert!(out.is_empty());
        assert_eq!(std::fs::read(target).unwrap(), b"jpg bytes");
    }

    #[test]
    fn missing_premis_fails_at_its_level() {
        let (code, out) = show("s1/g1/a%20b.tif/premis", None);
        assert_eq!(code, EXIT_FAIL);
        let body: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(
            body,
            json!({ "status": "fail", "data": null, "errors": ["Bad PREMIS Identifier"] })
        );
    }

    #[test]
    fn double_escaped_identifier_does_not_match() {
        let (code, out) = show("s1/g1/a%2520b.tif", None);
        assert_eq!(code, EXIT_FAIL);
        let body: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(body["errors"][0], "Bad MaterialSuite Identifier");
    }

    #[test]
    fn malformed_path_fails() {
        let (code, out) = show("s1//g1", None);
        assert_eq!(code, EXIT_FAIL);
        let body: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(body["errors"].as_array().unwrap().len(), 1);
    }
}
