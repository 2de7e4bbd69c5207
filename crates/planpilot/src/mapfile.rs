//! Sync-map file I/O
//!
//! The engine never touches the filesystem; reading the previous map and
//! writing the new one after a successful run happens here. The file is
//! pretty-printed JSON with sorted entries, so successive runs of an
//! unchanged plan produce byte-identical files.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use planpilot_api::SyncMap;

/// Read the sync map, if one exists. A missing file is `None`, not an
/// error; anything unreadable or unparseable is.
pub fn read_sync_map(path: &Path) -> Result<Option<SyncMap>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read sync map {}", path.display()))?;
    let map = serde_json::from_str(&text)
        .with_context(|| format!("malformed sync map {}", path.display()))?;
    Ok(Some(map))
}

pub fn write_sync_map(path: &Path, map: &SyncMap) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    let mut text = serde_json::to_string_pretty(map).context("failed to serialize sync map")?;
    text.push('\n');
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
