//! Map-sync planner
//!
//! Read-only reconstruction of the local sync map from remote state. The
//! provider is never mutated; the caller decides what to do with the
//! rebuilt map and the diff.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::info;

use planpilot_api::{
    ItemSearchFilters, MarkerBlock, Provider, SyncEntry, SyncError, SyncMap,
};

/// How to choose among discovered plan ids.
#[derive(Debug, Clone)]
pub enum PlanSelection {
    /// Use this plan id, discovered or not.
    Explicit(String),
    /// Exactly one candidate must exist.
    Auto,
}

/// Rebuilt map plus the diff against the previous local map.
#[derive(Debug, Clone)]
pub struct MapSyncOutcome {
    pub sync_map: SyncMap,
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub removed: Vec<String>,
}

/// Distinct plan ids present under `label`, sorted.
pub async fn discover_plan_ids(
    provider: &dyn Provider,
    label: &str,
) -> Result<Vec<String>, SyncError> {
    let filters = ItemSearchFilters {
        labels: [label.to_string()].into(),
        body_contains: Some("PLAN_ID:".to_string()),
    };
    let found = provider.search_items(&filters).await?;
    let ids: BTreeSet<String> = found
        .iter()
        .filter_map(|remote| MarkerBlock::parse(&remote.body))
        .map(|marker| marker.plan_id)
        .collect();
    Ok(ids.into_iter().collect())
}

/// Reconstruct the sync map for one plan from remote state and diff it
/// against `local`.
pub async fn map_sync(
    provider: Arc<dyn Provider>,
    label: &str,
    selection: PlanSelection,
    local: Option<&SyncMap>,
    target: &str,
    board_url: &str,
) -> Result<MapSyncOutcome, SyncError> {
    let plan_id = match selection {
        PlanSelection::Explicit(id) => id,
        PlanSelection::Auto => {
            let mut candidates = discover_plan_ids(provider.as_ref(), label).await?;
            match candidates.pop() {
                None => {
                    return Err(SyncError::Engine(format!(
                        "no plans found under label {label}"
                    )))
                }
                Some(only) if candidates.is_empty() => only,
                Some(last) => {
                    candidates.push(last);
                    return Err(SyncError::AmbiguousPlan { candidates });
                }
            }
        }
    };

    let filters = ItemSearchFilters {
        labels: [label.to_string()].into(),
        body_contains: Some(format!("PLAN_ID:{plan_id}")),
    };
    let found = provider.search_items(&filters).await?;

    let mut sync_map = SyncMap::new(plan_id.clone(), target, board_url);
    for remote in found {
        let Some(marker) = MarkerBlock::parse(&remote.body) else {
            continue;
        };
        if marker.plan_id != plan_id {
            continue;
        }
        sync_map
            .entries
            .insert(marker.item_id, SyncEntry::from_remote(&remote));
    }

    let mut added = Vec::new();
    let mut updated = Vec::new();
    let mut removed = Vec::new();
    if let Some(local) = local {
        for (item_id, entry) in &sync_map.entries {
            match local.entries.get(item_id) {
                None => added.push(item_id.clone()),
                Some(previous) if previous != entry => updated.push(item_id.clone()),
                Some(_) => {}
            }
        }
        for item_id in local.entries.keys() {
            if !sync_map.entries.contains_key(item_id) {
                removed.push(item_id.clone());
            }
        }
    } else {
        added = sync_map.entries.keys().cloned().collect();
    }

    info!(
        "[MapSync] Rebuilt map for plan {}: {} entries (+{} ~{} -{})",
        plan_id,
        sync_map.entries.len(),
        added.len(),
        updated.len(),
        removed.len()
    );

    Ok(MapSyncOutcome {
        sync_map,
        added,
        updated,
        removed,
    })
}
