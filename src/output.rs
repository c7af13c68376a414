//! Final JSON export.

use std::path::Path;
use tracing::info;

use crate::fields::Record;
use crate::Result;

/// Write all records as one indented JSON array. Called once, at the end of
/// a successful run.
pub fn write_records(path: &Path, records: &[Record]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json)?;
    info!("Exported {} records to {}", records.len(), path.display());
    Ok(())
}
