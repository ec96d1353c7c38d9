//! `staging stages`: list stage identifiers.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use staging_core::{execute, Address, ResponseEnvelope, StageStore};

use crate::{print_envelope, print_failure, EXIT_OK};

/// Stages subcommand arguments.
#[derive(Args, Debug, Default)]
pub struct StagesArgs {
    /// Print the full response envelope instead of one identifier per line.
    #[arg(long)]
    pub json: bool,
}

/// Execute the stages subcommand against `store`.
pub fn run_stages<S>(args: &StagesArgs, store: &S, out: &mut dyn Write) -> Result<u8>
where
    S: StageStore + ?Sized,
{
    let data = match execute(store, &Address::Stages) {
        Ok(outcome) => match outcome.into_data() {
            Some(data) => data,
            None => return print_failure(out, "stage listing produced no data"),
        },
        Err(e) => {
            tracing::debug!(error = %e, "stage listing failed");
            return print_failure(out, e.to_string());
        }
    };

    if args.json {
        print_envelope(out, &ResponseEnvelope::success(data))?;
        return Ok(EXIT_OK);
    }

    let stages = data
        .get("stages")
        .and_then(|v| v.as_array())
        .into_iter()
        .flatten()
        .filter_map(|v| v.as_str());
    for stage in stages {
        writeln!(out, "{stage}").context("writing stage identifier")?;
    }
    Ok(EXIT_OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EXIT_FAIL;
    use serde_json::Value;
    use staging_store::FsStageStore;

    fn root_with(stages: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for s in stages {
            std::fs::create_dir(dir.path().join(s)).unwrap();
        }
        dir
    }

    #[test]
    fn lists_one_identifier_per_line() {
        let root = root_with(&["s2", "s1"]);
        let mut out = Vec::new();
        let code = run_stages(&StagesArgs::default(), &FsStageStore::new(root.path()), &mut out)
            .unwrap();
        assert_eq!(code, EXIT_OK);
        assert_eq!(String::from_utf8(out).unwrap(), "s1\ns2\n");
    }

    #[test]
    fn json_flag_prints_envelope() {
        let root = root_with(&["s1"]);
        let mut out = Vec::new();
        run_stages(&StagesArgs { json: true }, &FsStageStore::new(root.path()), &mut out).unwrap();
        let body: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["stages"][0], "s1");
    }

    #[test]
    fn missing_root_fails() {
        let mut out = Vec::new();
        let code = run_stages(
            &StagesArgs::default(),
            &FsStageStore::new("/nonexistent/staging"),
            &mut out,
        )
        .unwrap();
        assert_eq!(code, EXIT_FAIL);
        let body: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(body["errors"][0], "Stage listing unavailable");
    }
}
