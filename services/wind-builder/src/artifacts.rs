//! Artifact writing: one JSON file per level under a date-keyed directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use wind_core::LevelOutput;

/// Directory that receives one processing day's artifacts.
pub fn day_dir(output_dir: &Path, date: NaiveDate) -> PathBuf {
    output_dir.join(date.format("%Y-%m-%d").to_string())
}

/// Write every level output for a day. Failures here are above the level
/// boundary and therefore fatal.
pub fn write_day(output_dir: &Path, date: NaiveDate, outputs: &[LevelOutput]) -> Result<()> {
    let dir = day_dir(output_dir, date);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("cannot create output directory {}", dir.display()))?;

    for output in outputs {
        let path = dir.join(format!("{}.json", output.meta.level.key));
        let body = serde_json::to_string(output)
            .with_context(|| format!("cannot serialize level {}", output.meta.level.key))?;
        std::fs::write(&path, body)
            .with_context(|| format!("cannot write {}", path.display()))?;
        info!(
            path = %path.display(),
            points = output.points.len(),
            failed = output.meta.error.is_some(),
            "Wrote level artifact"
        );
    }
    Ok(())
}
