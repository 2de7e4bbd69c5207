//! Provider interface
//!
//! An adapter to an external issue tracker. Lifecycle is
//! `setup() -> operations -> teardown()`. Setup resolves the target,
//! verifies authentication, caches board and field identifiers in
//! provider-private state, and reports the capability descriptor.
//!
//! Board workflow fields (status, priority, iteration) are
//! provider-authoritative after initial creation and are never written
//! again. Title, body, type, labels, size, and relations are
//! plan-authoritative.

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::item::{
    Capabilities, CreateItemInput, ItemSearchFilters, RelationDelta, RemoteItem, UpdateItemInput,
};

#[async_trait]
pub trait Provider: Send + Sync {
    /// Short identifier used in logs and the provider factory.
    fn name(&self) -> &str;

    /// Resolve the target and cache provider-private identifiers.
    /// Must be called exactly once, before any operation.
    async fn setup(&self) -> Result<Capabilities, ProviderError>;

    /// Release any resources held since `setup`. Items returned by this
    /// provider must not be used afterwards.
    async fn teardown(&self) -> Result<(), ProviderError>;

    /// Capability descriptor as reported by `setup`. All-false before
    /// setup has completed.
    fn capabilities(&self) -> Capabilities;

    /// Return ALL items matching the filters, paginating internally.
    async fn search_items(
        &self,
        filters: &ItemSearchFilters,
    ) -> Result<Vec<RemoteItem>, ProviderError>;

    /// Create an item atomically from the caller's perspective, running
    /// whatever multi-step sequence the external system requires. A
    /// mid-sequence failure surfaces as
    /// [`ProviderError::PartialCreate`](crate::error::ProviderError)
    /// carrying the identity assigned so far; discovery must be able to
    /// find and complete such items on the next run.
    async fn create_item(&self, input: CreateItemInput) -> Result<RemoteItem, ProviderError>;

    /// Apply only the non-`None` fields. Labels are additive: the union of
    /// the existing set and `input.labels`, never a replacement.
    async fn update_item(
        &self,
        id: &str,
        input: UpdateItemInput,
    ) -> Result<RemoteItem, ProviderError>;

    async fn get_item(&self, id: &str) -> Result<RemoteItem, ProviderError>;

    /// Destructive. Only the clean workflow calls this.
    async fn delete_item(&self, id: &str) -> Result<(), ProviderError>;

    /// Converge the item's remote relations to exactly `{parent} ∪ blockers`,
    /// issuing only the adds and removes needed. Idempotent: a second call
    /// with the same arguments reports a zero delta.
    async fn reconcile_relations(
        &self,
        item: &RemoteItem,
        parent: Option<&RemoteItem>,
        blockers: &[RemoteItem],
    ) -> Result<RelationDelta, ProviderError>;

    /// Whether this provider performs no external I/O.
    fn is_dry_run(&self) -> bool {
        false
    }
}
