//! Remote item model and provider request bags
//!
//! `RemoteItem` is the read-only view of a work item in the external
//! tracker. Relation operations live on the [`Provider`](crate::provider::Provider)
//! and take the record as an argument, so items never outlive their
//! provider.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::plan::ItemType;

/// A work item as returned by a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteItem {
    /// Opaque provider identifier.
    pub id: String,
    /// Human-readable short reference, e.g. `#42`.
    pub key: String,
    pub url: String,
    pub title: String,
    pub body: String,
    pub item_type: Option<ItemType>,
}

/// Persisted identity of one plan item in the external tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncEntry {
    pub id: String,
    pub key: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_type: Option<ItemType>,
}

impl SyncEntry {
    pub fn from_remote(item: &RemoteItem) -> Self {
        Self {
            id: item.id.clone(),
            key: item.key.clone(),
            url: item.url.clone(),
            item_type: item.item_type,
        }
    }
}

/// Mapping from plan item id to external identity. A cache, never the
/// source of truth: discovery always goes through marker blocks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncMap {
    pub plan_id: String,
    pub target: String,
    pub board_url: String,
    pub entries: BTreeMap<String, SyncEntry>,
}

impl SyncMap {
    pub fn new(plan_id: impl Into<String>, target: impl Into<String>, board_url: impl Into<String>) -> Self {
        Self {
            plan_id: plan_id.into(),
            target: target.into(),
            board_url: board_url.into(),
            entries: BTreeMap::new(),
        }
    }
}

/// Outcome of one engine run.
#[derive(Debug, Clone)]
pub struct SyncResult {
    pub sync_map: SyncMap,
    /// Items created during upsert, per type. Every type is present, with
    /// zero for levels that only matched existing items.
    pub items_created: BTreeMap<ItemType, usize>,
    pub dry_run: bool,
    /// Skipped cyclic edges and omitted partial-plan references.
    pub warnings: Vec<String>,
}

impl SyncResult {
    /// Total number of items created across all levels.
    pub fn total_created(&self) -> usize {
        self.items_created.values().sum()
    }
}

/// Request bag for `create_item`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateItemInput {
    pub title: String,
    pub body: String,
    pub item_type: Option<ItemType>,
    pub labels: BTreeSet<String>,
    pub size: Option<String>,
}

/// Request bag for `update_item`. Only non-`None` fields are applied;
/// labels are unioned with the existing set, never replaced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateItemInput {
    pub title: Option<String>,
    pub body: Option<String>,
    pub item_type: Option<ItemType>,
    pub labels: BTreeSet<String>,
    pub size: Option<String>,
}

/// Filters for `search_items`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemSearchFilters {
    pub labels: BTreeSet<String>,
    pub body_contains: Option<String>,
}

/// Provider-advertised feature set, exposed by `setup`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub discovery_by_body_contains: bool,
    pub supports_parent_relation: bool,
    pub supports_dependency_relation: bool,
    pub supports_issue_types: bool,
}

impl Capabilities {
    /// Everything on, as an in-memory provider advertises.
    pub fn full() -> Self {
        Self {
            discovery_by_body_contains: true,
            supports_parent_relation: true,
            supports_dependency_relation: true,
            supports_issue_types: true,
        }
    }
}

/// What a relation reconciliation actually changed on the provider.
/// Both zero means the call was a no-op, which reruns rely on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelationDelta {
    pub added: usize,
    pub removed: usize,
}

impl RelationDelta {
    pub fn is_noop(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_map_serialization_is_stable() {
        let mut map = SyncMap::new("abc123def456", "owner/repo", "https://example.test/board");
        map.entries.insert(
            "T1".to_string(),
            SyncEntry {
                id: "node-1".to_string(),
                key: "#7".to_string(),
                url: "https://example.test/7".to_string(),
                item_type: Some(ItemType::Task),
            },
        );
        map.entries.insert(
            "E1".to_string(),
            SyncEntry {
                id: "node-2".to_string(),
                key: "#3".to_string(),
                url: "https://example.test/3".to_string(),
                item_type: Some(ItemType::Epic),
            },
        );

        let a = serde_json::to_string(&map).unwrap();
        let b = serde_json::to_string(&serde_json::from_str::<SyncMap>(&a).unwrap()).unwrap();
        assert_eq!(a, b);
        // BTreeMap keys serialize sorted regardless of insertion order.
        assert!(a.find("\"E1\"").unwrap() < a.find("\"T1\"").unwrap());
    }
}
