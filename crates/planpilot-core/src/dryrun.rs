//! In-memory provider
//!
//! Satisfies the full `Provider` contract without external I/O: search is
//! served from its own state with real label and substring filtering,
//! mutations update that state, and every call is appended to an
//! operation log tests can inspect. Used both as the dry-run execution
//! mode and as the engine's test double.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use planpilot_api::{
    Capabilities, CreateItemInput, ItemSearchFilters, ItemType, Provider, ProviderError,
    RelationDelta, RemoteItem, UpdateItemInput,
};

/// Synthetic key assigned to every created item.
pub const DRY_RUN_KEY: &str = "dry-run";

/// One recorded provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedOp {
    Setup,
    Teardown,
    Search,
    Create { id: String },
    Update { id: String },
    Get { id: String },
    Delete { id: String },
    Relations { id: String, added: usize, removed: usize },
}

#[derive(Debug, Clone)]
struct StoredItem {
    id: String,
    key: String,
    url: String,
    title: String,
    body: String,
    item_type: Option<ItemType>,
    labels: BTreeSet<String>,
    size: Option<String>,
    parent: Option<String>,
    blockers: BTreeSet<String>,
}

impl StoredItem {
    fn to_remote(&self) -> RemoteItem {
        RemoteItem {
            id: self.id.clone(),
            key: self.key.clone(),
            url: self.url.clone(),
            title: self.title.clone(),
            body: self.body.clone(),
            item_type: self.item_type,
        }
    }
}

/// Seed for pre-populating provider state in tests and recovery scenarios.
#[derive(Debug, Clone, Default)]
pub struct SeedItem {
    pub title: String,
    pub body: String,
    pub item_type: Option<ItemType>,
    pub labels: BTreeSet<String>,
}

pub struct DryRunProvider {
    state: RwLock<HashMap<String, StoredItem>>,
    ops: Mutex<Vec<RecordedOp>>,
    set_up: AtomicBool,
    /// When set, refuse to delete an item that still has children. Mimics
    /// trackers with relation constraints, which the clean planner's
    /// multi-pass retry exists to absorb.
    strict_delete: bool,
}

impl DryRunProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: RwLock::new(HashMap::new()),
            ops: Mutex::new(Vec::new()),
            set_up: AtomicBool::new(false),
            strict_delete: false,
        })
    }

    pub fn with_strict_delete() -> Arc<Self> {
        Arc::new(Self {
            state: RwLock::new(HashMap::new()),
            ops: Mutex::new(Vec::new()),
            set_up: AtomicBool::new(false),
            strict_delete: true,
        })
    }

    /// Insert an item directly into provider state, bypassing the log.
    /// Returns the assigned id.
    pub async fn seed(&self, seed: SeedItem) -> RemoteItem {
        let id = format!("dryrun-{}", Uuid::new_v4());
        let stored = StoredItem {
            id: id.clone(),
            key: DRY_RUN_KEY.to_string(),
            url: format!("dryrun://items/{id}"),
            title: seed.title,
            body: seed.body,
            item_type: seed.item_type,
            labels: seed.labels,
            size: None,
            parent: None,
            blockers: BTreeSet::new(),
        };
        let remote = stored.to_remote();
        self.state.write().await.insert(id, stored);
        remote
    }

    pub async fn recorded_ops(&self) -> Vec<RecordedOp> {
        self.ops.lock().await.clone()
    }

    /// Number of recorded calls matching `predicate`.
    pub async fn count_ops(&self, predicate: impl Fn(&RecordedOp) -> bool) -> usize {
        self.ops.lock().await.iter().filter(|op| predicate(op)).count()
    }

    pub async fn clear_ops(&self) {
        self.ops.lock().await.clear();
    }

    pub async fn item_count(&self) -> usize {
        self.state.read().await.len()
    }

    /// Remote relations of one item: `(parent, blockers)`.
    pub async fn relations_of(&self, id: &str) -> Option<(Option<String>, BTreeSet<String>)> {
        self.state
            .read()
            .await
            .get(id)
            .map(|item| (item.parent.clone(), item.blockers.clone()))
    }

    pub async fn labels_of(&self, id: &str) -> Option<BTreeSet<String>> {
        self.state.read().await.get(id).map(|item| item.labels.clone())
    }

    async fn record(&self, op: RecordedOp) {
        self.ops.lock().await.push(op);
    }
}

#[async_trait]
impl Provider for DryRunProvider {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn setup(&self) -> Result<Capabilities, ProviderError> {
        self.set_up.store(true, Ordering::SeqCst);
        self.record(RecordedOp::Setup).await;
        Ok(Capabilities::full())
    }

    async fn teardown(&self) -> Result<(), ProviderError> {
        self.record(RecordedOp::Teardown).await;
        Ok(())
    }

    fn capabilities(&self) -> Capabilities {
        if self.set_up.load(Ordering::SeqCst) {
            Capabilities::full()
        } else {
            Capabilities::default()
        }
    }

    async fn search_items(
        &self,
        filters: &ItemSearchFilters,
    ) -> Result<Vec<RemoteItem>, ProviderError> {
        self.record(RecordedOp::Search).await;
        let state = self.state.read().await;
        let mut matches: Vec<RemoteItem> = state
            .values()
            .filter(|item| filters.labels.is_subset(&item.labels))
            .filter(|item| {
                filters
                    .body_contains
                    .as_deref()
                    .map_or(true, |needle| item.body.contains(needle))
            })
            .map(StoredItem::to_remote)
            .collect();
        matches.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(matches)
    }

    async fn create_item(&self, input: CreateItemInput) -> Result<RemoteItem, ProviderError> {
        let id = format!("dryrun-{}", Uuid::new_v4());
        let stored = StoredItem {
            id: id.clone(),
            key: DRY_RUN_KEY.to_string(),
            url: format!("dryrun://items/{id}"),
            title: input.title,
            body: input.body,
            item_type: input.item_type,
            labels: input.labels,
            size: input.size,
            parent: None,
            blockers: BTreeSet::new(),
        };
        let remote = stored.to_remote();
        self.state.write().await.insert(id.clone(), stored);
        self.record(RecordedOp::Create { id }).await;
        Ok(remote)
    }

    async fn update_item(
        &self,
        id: &str,
        input: UpdateItemInput,
    ) -> Result<RemoteItem, ProviderError> {
        let mut state = self.state.write().await;
        let stored = state
            .get_mut(id)
            .ok_or_else(|| ProviderError::NotFound(id.to_string()))?;

        if let Some(title) = input.title {
            stored.title = title;
        }
        if let Some(body) = input.body {
            stored.body = body;
        }
        if let Some(item_type) = input.item_type {
            stored.item_type = Some(item_type);
        }
        if let Some(size) = input.size {
            stored.size = Some(size);
        }
        // Union, never replace: labels added out-of-band survive updates.
        stored.labels.extend(input.labels);

        let remote = stored.to_remote();
        drop(state);
        self.record(RecordedOp::Update { id: id.to_string() }).await;
        Ok(remote)
    }

    async fn get_item(&self, id: &str) -> Result<RemoteItem, ProviderError> {
        self.record(RecordedOp::Get { id: id.to_string() }).await;
        self.state
            .read()
            .await
            .get(id)
            .map(StoredItem::to_remote)
            .ok_or_else(|| ProviderError::NotFound(id.to_string()))
    }

    async fn delete_item(&self, id: &str) -> Result<(), ProviderError> {
        let mut state = self.state.write().await;
        if !state.contains_key(id) {
            return Err(ProviderError::NotFound(id.to_string()));
        }
        if self.strict_delete {
            let has_children = state.values().any(|item| item.parent.as_deref() == Some(id));
            if has_children {
                return Err(ProviderError::retryable(format!(
                    "cannot delete {id}: children still attached"
                )));
            }
        }
        state.remove(id);
        // Deleting an item also drops edges pointing at it.
        for item in state.values_mut() {
            if item.parent.as_deref() == Some(id) {
                item.parent = None;
            }
            item.blockers.remove(id);
        }
        drop(state);
        self.record(RecordedOp::Delete { id: id.to_string() }).await;
        Ok(())
    }

    async fn reconcile_relations(
        &self,
        item: &RemoteItem,
        parent: Option<&RemoteItem>,
        blockers: &[RemoteItem],
    ) -> Result<RelationDelta, ProviderError> {
        let desired_parent = parent.map(|p| p.id.clone());
        let desired_blockers: BTreeSet<String> =
            blockers.iter().map(|b| b.id.clone()).collect();

        let mut state = self.state.write().await;
        let stored = state
            .get_mut(&item.id)
            .ok_or_else(|| ProviderError::NotFound(item.id.clone()))?;

        let mut delta = RelationDelta::default();
        if stored.parent != desired_parent {
            if stored.parent.is_some() {
                delta.removed += 1;
            }
            if desired_parent.is_some() {
                delta.added += 1;
            }
            stored.parent = desired_parent;
        }
        delta.added += desired_blockers.difference(&stored.blockers).count();
        delta.removed += stored.blockers.difference(&desired_blockers).count();
        stored.blockers = desired_blockers;
        drop(state);

        self.record(RecordedOp::Relations {
            id: item.id.clone(),
            added: delta.added,
            removed: delta.removed,
        })
        .await;
        Ok(delta)
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: &str, body: &str, labels: &[&str]) -> CreateItemInput {
        CreateItemInput {
            title: title.to_string(),
            body: body.to_string(),
            item_type: Some(ItemType::Task),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            size: None,
        }
    }

    #[tokio::test]
    async fn search_filters_by_label_and_body_substring() {
        let provider = DryRunProvider::new();
        provider
            .create_item(input("a", "PLAN_ID:abc here", &["planpilot"]))
            .await
            .unwrap();
        provider
            .create_item(input("b", "PLAN_ID:other", &["planpilot"]))
            .await
            .unwrap();
        provider
            .create_item(input("c", "PLAN_ID:abc unlabeled", &[]))
            .await
            .unwrap();

        let filters = ItemSearchFilters {
            labels: ["planpilot".to_string()].into(),
            body_contains: Some("PLAN_ID:abc".to_string()),
        };
        let found = provider.search_items(&filters).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "a");
    }

    #[tokio::test]
    async fn update_merges_labels_additively() {
        let provider = DryRunProvider::new();
        let created = provider
            .create_item(input("a", "body", &["planpilot", "manual"]))
            .await
            .unwrap();

        provider
            .update_item(
                &created.id,
                UpdateItemInput {
                    body: Some("new body".to_string()),
                    labels: ["planpilot".to_string()].into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let labels = provider.labels_of(&created.id).await.unwrap();
        assert!(labels.contains("manual"), "out-of-band label was dropped");
        assert!(labels.contains("planpilot"));
    }

    #[tokio::test]
    async fn reconcile_relations_is_idempotent() {
        let provider = DryRunProvider::new();
        let a = provider.create_item(input("a", "a", &[])).await.unwrap();
        let b = provider.create_item(input("b", "b", &[])).await.unwrap();
        let c = provider.create_item(input("c", "c", &[])).await.unwrap();

        let first = provider
            .reconcile_relations(&a, Some(&b), std::slice::from_ref(&c))
            .await
            .unwrap();
        assert_eq!(first, RelationDelta { added: 2, removed: 0 });

        let second = provider
            .reconcile_relations(&a, Some(&b), std::slice::from_ref(&c))
            .await
            .unwrap();
        assert!(second.is_noop());
    }

    #[tokio::test]
    async fn reconcile_removes_stale_relations() {
        let provider = DryRunProvider::new();
        let a = provider.create_item(input("a", "a", &[])).await.unwrap();
        let b = provider.create_item(input("b", "b", &[])).await.unwrap();
        let c = provider.create_item(input("c", "c", &[])).await.unwrap();

        provider
            .reconcile_relations(&a, Some(&b), std::slice::from_ref(&c))
            .await
            .unwrap();
        let delta = provider.reconcile_relations(&a, None, &[]).await.unwrap();
        assert_eq!(delta, RelationDelta { added: 0, removed: 2 });

        let (parent, blockers) = provider.relations_of(&a.id).await.unwrap();
        assert_eq!(parent, None);
        assert!(blockers.is_empty());
    }

    #[tokio::test]
    async fn strict_delete_refuses_parents_with_children() {
        let provider = DryRunProvider::with_strict_delete();
        let parent = provider.create_item(input("p", "p", &[])).await.unwrap();
        let child = provider.create_item(input("c", "c", &[])).await.unwrap();
        provider
            .reconcile_relations(&child, Some(&parent), &[])
            .await
            .unwrap();

        let err = provider.delete_item(&parent.id).await.unwrap_err();
        assert!(matches!(err, ProviderError::Api { retryable: true, .. }));

        provider.delete_item(&child.id).await.unwrap();
        provider.delete_item(&parent.id).await.unwrap();
        assert_eq!(provider.item_count().await, 0);
    }
}
