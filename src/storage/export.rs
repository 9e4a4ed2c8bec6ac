//! Record export.
//!
//! Mined records and their diagnostic trail are written as pretty JSON,
//! one pair of files per date. Downstream consumers (type coercion,
//! geocoding, persistence) read these files; nothing here interprets
//! the field values.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::pipeline::MineOutcome;
use crate::utils::fs::{ensure_dir, save_json};

/// Write one date's outcome under the output directory.
///
/// Produces `{dir}/{date}.json` with the full outcome (records, failures,
/// counters) and `{dir}/{date}.diagnostics.json` with the flat diagnostic
/// union for quick triage. Returns the outcome file path.
pub fn write_outcome(dir: &Path, outcome: &MineOutcome) -> Result<PathBuf> {
    ensure_dir(dir)?;

    let date = outcome.date.format("%Y-%m-%d");
    let outcome_path = dir.join(format!("{date}.json"));
    save_json(&outcome_path, outcome)?;

    let diagnostics = outcome.diagnostics();
    save_json(&dir.join(format!("{date}.diagnostics.json")), &diagnostics)?;

    Ok(outcome_path)
}
