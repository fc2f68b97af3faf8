// JSON export of normalized flight records

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::normalize::FlightRecord;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to serialize flight records: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes the full record list as a pretty-printed UTF-8 JSON array,
/// creating parent directories as needed. The list is serialized before any
/// filesystem mutation, so a failure never leaves a partial file behind.
pub fn write_records(records: &[FlightRecord], path: &Path) -> Result<(), ExportError> {
    let payload = serde_json::to_string_pretty(records)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, payload)?;
    Ok(())
}
