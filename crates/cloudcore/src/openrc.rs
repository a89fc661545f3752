//! OpenRC file parsing
//!
//! Reads the `export OS_*=...` lines of an OpenStack RC file. The password
//! line is never read back.

use crate::error::Result;
use std::path::Path;

/// Parse an OpenRC file into lower-cased `(key, value)` pairs
///
/// Returns `Ok(None)` when the file does not exist.
pub fn parse(path: impl AsRef<Path>) -> Result<Option<Vec<(String, String)>>> {
    let path = path.as_ref();
    if !path.is_file() {
        tracing::warn!("OpenRC file \"{}\" does not exist", path.display());
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)?;
    Ok(Some(parse_str(&content)))
}

/// Parse OpenRC content
pub fn parse_str(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .filter_map(|line| {
            let rest = line.trim().strip_prefix("export")?;
            if !rest.starts_with(char::is_whitespace) || line.contains("OS_PASSWORD") {
                return None;
            }
            let cleaned = rest.trim().replace('"', "");
            let (key, value) = cleaned.split_once('=')?;
            Some((key.trim().to_lowercase(), value.trim().to_string()))
        })
        .collect()
}
