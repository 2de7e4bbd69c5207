//! Plan file loading
//!
//! Two layouts are accepted: a set of typed files (epics/stories/tasks as
//! JSON arrays, the file role assigning the type and any `type` field in
//! the items ignored) or a single unified file (`{"items": [...]}` with an
//! explicit `type` per item). Path resolution is the caller's concern; the
//! loader takes absolute or already-resolved paths.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use planpilot_api::{ItemType, PlanItem, PlanLoadError};

/// Which files make up the plan.
#[derive(Debug, Clone)]
pub enum PlanSource {
    /// Any subset of typed files. At least one must be present.
    Typed {
        epics: Option<PathBuf>,
        stories: Option<PathBuf>,
        tasks: Option<PathBuf>,
    },
    /// One file with an `items` array.
    Unified(PathBuf),
}

/// Load all items from the given source. Returns them in file order; the
/// caller validates and hashes.
pub fn load_items(source: &PlanSource) -> Result<Vec<PlanItem>, PlanLoadError> {
    let items = match source {
        PlanSource::Typed {
            epics,
            stories,
            tasks,
        } => {
            let mut items = Vec::new();
            for (path, item_type) in [
                (epics, ItemType::Epic),
                (stories, ItemType::Story),
                (tasks, ItemType::Task),
            ] {
                if let Some(path) = path {
                    items.extend(load_typed_file(path, item_type)?);
                }
            }
            items
        }
        PlanSource::Unified(path) => load_unified_file(path)?,
    };

    if items.is_empty() {
        return Err(PlanLoadError::Empty);
    }
    tracing::debug!("[PlanLoader] Loaded {} plan item(s)", items.len());
    Ok(items)
}

fn read_json(path: &Path) -> Result<Value, PlanLoadError> {
    let text = fs::read_to_string(path).map_err(|source| PlanLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| PlanLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// A typed file is a JSON array of items. The file role wins over any
/// `type` field an item carries.
fn load_typed_file(path: &Path, item_type: ItemType) -> Result<Vec<PlanItem>, PlanLoadError> {
    let value = read_json(path)?;
    let Value::Array(entries) = value else {
        return Err(PlanLoadError::Schema {
            path: path.to_path_buf(),
            message: "expected a top-level JSON array".to_string(),
        });
    };

    entries
        .into_iter()
        .map(|mut entry| {
            if let Value::Object(ref mut fields) = entry {
                fields.insert(
                    "type".to_string(),
                    Value::String(item_type.as_str().to_string()),
                );
            }
            serde_json::from_value(entry).map_err(|source| PlanLoadError::Parse {
                path: path.to_path_buf(),
                source,
            })
        })
        .collect()
}

/// The unified file is `{"items": [...]}` and every item must declare its
/// own `type`.
fn load_unified_file(path: &Path) -> Result<Vec<PlanItem>, PlanLoadError> {
    let value = read_json(path)?;
    let items = value
        .as_object()
        .and_then(|obj| obj.get("items"))
        .and_then(Value::as_array)
        .cloned()
        .ok_or_else(|| PlanLoadError::Schema {
            path: path.to_path_buf(),
            message: "expected a top-level object with an \"items\" array".to_string(),
        })?;

    items
        .into_iter()
        .map(|entry| {
            serde_json::from_value(entry).map_err(|source| PlanLoadError::Parse {
                path: path.to_path_buf(),
                source,
            })
        })
        .collect()
}
