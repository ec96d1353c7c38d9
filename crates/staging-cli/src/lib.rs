//! # staging-cli: Command-Line Access to a Staging Root
//!
//! Provides the `staging` command, which runs the same resolution pipeline
//! as the HTTP service directly against a staging root on disk.
//!
//! ## Subcommands
//!
//! - `staging stages`: List stage identifiers.
//! - `staging show <path>`: Resolve an escaped identifier path and print
//!   its envelope, or write the addressed item's bytes.
//!
//! ```bash
//! staging --root /data/staging stages
//! staging --root /data/staging show s1/g1/a%20b.tif/techmds
//! staging --root /data/staging show s1/g1/a%20b.tif/content --output a.tif
//! ```
//!
//! Failures print a `fail` envelope and the command exits with status 1.

pub mod show;
pub mod stages;

use std::io::Write;

use anyhow::{Context, Result};
use staging_core::ResponseEnvelope;

/// Exit status for a request that resolved.
pub const EXIT_OK: u8 = 0;
/// Exit status for a request that produced a `fail` envelope.
pub const EXIT_FAIL: u8 = 1;

/// Write `envelope` as pretty JSON followed by a newline.
pub fn print_envelope(out: &mut dyn Write, envelope: &ResponseEnvelope) -> Result<()> {
    let json = serde_json::to_string_pretty(envelope).context("serializing envelope")?;
    writeln!(out, "{json}").context("writing envelope")?;
    Ok(())
}

/// Print a `fail` envelope carrying `message` and return [`EXIT_FAIL`].
pub fn print_failure(out: &mut dyn Write, message: impl Into<String>) -> Result<u8> {
    print_envelope(out, &ResponseEnvelope::fail(message))?;
    Ok(EXIT_FAIL)
}
