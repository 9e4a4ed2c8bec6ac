// src/utils/fs.rs

//! File system utilities.

use std::fs;
use std::path::Path;

use crate::error::Result;

/// Save data to a JSON file with pretty printing
pub fn save_json<T: serde::Serialize>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    fs::write(path, json)?;
    Ok(())
}

/// Ensure a directory exists
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)?;
    Ok(())
}
