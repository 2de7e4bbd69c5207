//! Sync engine
//!
//! Phased orchestrator: discover → upsert → enrich → relate. Phase
//! boundaries are strict barriers; within a phase, work is dispatched
//! concurrently under one semaphore. The engine owns dispatch concurrency
//! only; retries, backoff, and rate limiting belong to the provider.
//!
//! Identity comes exclusively from marker blocks found through provider
//! search. The sync map is an output, never an input.

pub mod relations;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use planpilot_api::{
    CreateItemInput, ItemSearchFilters, ItemType, MarkerBlock, Plan, PlanItem, Provider,
    RemoteItem, RenderContext, Renderer, SyncEntry, SyncError, SyncMap, SyncResult,
    UpdateItemInput,
};

use relations::{plan_relations, RelationPlan};

pub const DEFAULT_LABEL: &str = "planpilot";
pub const DEFAULT_MAX_CONCURRENT: usize = 5;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub label: String,
    pub target: String,
    pub board_url: String,
    pub max_concurrent: usize,
    pub dry_run: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            label: DEFAULT_LABEL.to_string(),
            target: String::new(),
            board_url: String::new(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            dry_run: false,
        }
    }
}

pub struct SyncEngine {
    config: EngineConfig,
    cancel: CancellationToken,
}

impl SyncEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Attach an external cancellation signal. In-flight provider calls
    /// settle before the run fails with `SyncError::Cancelled`.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run all phases against an already-set-up provider.
    #[tracing::instrument(name = "engine.sync", skip_all, fields(plan_id = %plan.plan_id))]
    pub async fn run(
        &self,
        plan: &Plan,
        provider: Arc<dyn Provider>,
        renderer: &dyn Renderer,
    ) -> Result<SyncResult, SyncError> {
        if self.cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        let capabilities = provider.capabilities();
        if !capabilities.discovery_by_body_contains {
            return Err(planpilot_api::ProviderError::missing_capability(
                "discovery_by_body_contains",
            )
            .into());
        }

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent.max(1)));

        // Phase 1: discovery.
        let existing = self.discover(plan, provider.as_ref()).await?;
        info!(
            "[SyncEngine] Phase 1: discovered {} existing item(s)",
            existing.len()
        );

        // Phase 2: upsert, level by level.
        let mut sync_map = SyncMap::new(
            plan.plan_id.clone(),
            self.config.target.clone(),
            self.config.board_url.clone(),
        );
        let mut remotes: HashMap<String, RemoteItem> = HashMap::new();
        let mut items_created: BTreeMap<ItemType, usize> =
            ItemType::LEVELS.iter().map(|t| (*t, 0)).collect();

        for level in ItemType::LEVELS {
            let level_items = plan.level(level);
            if level_items.is_empty() {
                continue;
            }
            let outcomes = self
                .upsert_level(
                    plan,
                    &level_items,
                    &existing,
                    &sync_map,
                    provider.clone(),
                    renderer,
                    semaphore.clone(),
                )
                .await?;

            // Per-level merge keeps the map single-writer.
            for (item_id, remote, created) in outcomes {
                if created {
                    *items_created.entry(level).or_default() += 1;
                }
                sync_map
                    .entries
                    .insert(item_id.clone(), SyncEntry::from_remote(&remote));
                remotes.insert(item_id, remote);
            }
        }
        info!(
            "[SyncEngine] Phase 2: upserted {} item(s), created {:?}",
            sync_map.entries.len(),
            items_created
        );

        // Relation planning happens once; its warnings cover both the
        // omitted references (enrich) and the skipped cyclic edges (relate).
        let relation_plan = plan_relations(plan);

        // Phase 3: enrich every item with the full cross-reference context.
        self.enrich(plan, &sync_map, provider.clone(), renderer, semaphore.clone())
            .await?;
        info!("[SyncEngine] Phase 3: enriched {} item(s)", sync_map.entries.len());

        // Phase 4: relations.
        self.relate(plan, &relation_plan, &remotes, provider.clone(), semaphore)
            .await?;
        info!("[SyncEngine] Phase 4: relations reconciled");

        Ok(SyncResult {
            sync_map,
            items_created,
            dry_run: self.config.dry_run || provider.is_dry_run(),
            warnings: relation_plan.warnings,
        })
    }

    /// Marker-based discovery. Items whose marker fails to parse or names
    /// a different plan are foreign and ignored.
    async fn discover(
        &self,
        plan: &Plan,
        provider: &dyn Provider,
    ) -> Result<HashMap<String, RemoteItem>, SyncError> {
        let filters = ItemSearchFilters {
            labels: [self.config.label.clone()].into(),
            body_contains: Some(format!("PLAN_ID:{}", plan.plan_id)),
        };
        let found = provider.search_items(&filters).await?;

        let mut existing = HashMap::new();
        for remote in found {
            let Some(marker) = MarkerBlock::parse(&remote.body) else {
                debug!("[SyncEngine] Ignoring {}: no marker block", remote.key);
                continue;
            };
            if marker.plan_id != plan.plan_id {
                continue;
            }
            if plan.get(&marker.item_id).is_none() {
                debug!(
                    "[SyncEngine] Ignoring {}: item {} not in plan",
                    remote.key, marker.item_id
                );
                continue;
            }
            existing.insert(marker.item_id, remote);
        }
        Ok(existing)
    }

    #[allow(clippy::too_many_arguments)]
    async fn upsert_level(
        &self,
        plan: &Plan,
        level_items: &[&PlanItem],
        existing: &HashMap<String, RemoteItem>,
        sync_map: &SyncMap,
        provider: Arc<dyn Provider>,
        renderer: &dyn Renderer,
        semaphore: Arc<Semaphore>,
    ) -> Result<Vec<(String, RemoteItem, bool)>, SyncError> {
        let futures = level_items.iter().map(|item| {
            let provider = provider.clone();
            let semaphore = semaphore.clone();
            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|_| SyncError::Engine("semaphore closed".to_string()))?;
                if self.cancel.is_cancelled() {
                    return Err(SyncError::Cancelled);
                }

                if let Some(remote) = existing.get(&item.id) {
                    debug!("[SyncEngine] {} exists as {}", item.id, remote.key);
                    return Ok((item.id.clone(), remote.clone(), false));
                }

                // Preliminary render: the parent level is complete, so its
                // reference resolves; children and dependencies come later.
                let parent_ref = item
                    .parent_id
                    .as_deref()
                    .and_then(|pid| sync_map.entries.get(pid))
                    .map(|entry| entry.key.clone());
                let body = renderer.render(
                    item,
                    &RenderContext::preliminary(plan.plan_id.clone(), parent_ref),
                );

                let input = CreateItemInput {
                    title: item.title.clone(),
                    body,
                    item_type: Some(item.item_type),
                    labels: [self.config.label.clone()].into(),
                    size: item.tshirt().map(str::to_string),
                };
                let remote = provider.create_item(input).await?;
                info!("[SyncEngine] Created {} as {}", item.id, remote.key);
                Ok((item.id.clone(), remote, true))
            }
        });

        // join_all, not try_join: every dispatched call settles before the
        // phase resolves, even when one of them fails.
        let results = futures::future::join_all(futures).await;
        results.into_iter().collect()
    }

    async fn enrich(
        &self,
        plan: &Plan,
        sync_map: &SyncMap,
        provider: Arc<dyn Provider>,
        renderer: &dyn Renderer,
        semaphore: Arc<Semaphore>,
    ) -> Result<(), SyncError> {
        let mut items: Vec<&PlanItem> = plan.items.iter().collect();
        items.sort_by_key(|item| item.sort_key());

        let futures = items.into_iter().map(|item| {
            let provider = provider.clone();
            let semaphore = semaphore.clone();
            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|_| SyncError::Engine("semaphore closed".to_string()))?;
                if self.cancel.is_cancelled() {
                    return Err(SyncError::Cancelled);
                }

                let entry = sync_map.entries.get(&item.id).ok_or_else(|| {
                    SyncError::Engine(format!("{} missing from sync map after upsert", item.id))
                })?;

                let ctx = RenderContext {
                    plan_id: plan.plan_id.clone(),
                    parent_ref: item
                        .parent_id
                        .as_deref()
                        .and_then(|pid| sync_map.entries.get(pid))
                        .map(|parent| parent.key.clone()),
                    sub_items: plan
                        .children_of(&item.id)
                        .iter()
                        .filter_map(|child| {
                            sync_map
                                .entries
                                .get(&child.id)
                                .map(|e| (e.key.clone(), child.title.clone()))
                        })
                        .collect(),
                    dependencies: item
                        .depends_on
                        .iter()
                        .filter_map(|dep| {
                            sync_map.entries.get(dep).map(|e| (dep.clone(), e.key.clone()))
                        })
                        .collect(),
                };

                let input = UpdateItemInput {
                    title: Some(item.title.clone()),
                    body: Some(renderer.render(item, &ctx)),
                    item_type: Some(item.item_type),
                    labels: [self.config.label.clone()].into(),
                    size: item.tshirt().map(str::to_string),
                };
                provider.update_item(&entry.id, input).await?;
                Ok(())
            }
        });

        let results: Vec<Result<(), SyncError>> = futures::future::join_all(futures).await;
        results.into_iter().collect()
    }

    async fn relate(
        &self,
        plan: &Plan,
        relation_plan: &RelationPlan,
        remotes: &HashMap<String, RemoteItem>,
        provider: Arc<dyn Provider>,
        semaphore: Arc<Semaphore>,
    ) -> Result<(), SyncError> {
        let capabilities = provider.capabilities();
        if relation_plan.has_parents() && !capabilities.supports_parent_relation {
            return Err(planpilot_api::ProviderError::missing_capability(
                "supports_parent_relation",
            )
            .into());
        }
        if relation_plan.has_blockers() && !capabilities.supports_dependency_relation {
            return Err(planpilot_api::ProviderError::missing_capability(
                "supports_dependency_relation",
            )
            .into());
        }

        let mut items: Vec<&PlanItem> = plan.items.iter().collect();
        items.sort_by_key(|item| item.sort_key());

        // Every item is reconciled, including ones with no desired
        // relations, so stale remote edges are removed.
        let futures = items.into_iter().map(|item| {
            let provider = provider.clone();
            let semaphore = semaphore.clone();
            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|_| SyncError::Engine("semaphore closed".to_string()))?;
                if self.cancel.is_cancelled() {
                    return Err(SyncError::Cancelled);
                }

                let Some(remote) = remotes.get(&item.id) else {
                    return Err(SyncError::Engine(format!(
                        "{} missing from remotes after upsert",
                        item.id
                    )));
                };
                let parent = relation_plan
                    .parents
                    .get(&item.id)
                    .and_then(|pid| remotes.get(pid));
                let blockers: Vec<RemoteItem> = relation_plan
                    .blockers
                    .get(&item.id)
                    .map(|ids| {
                        ids.iter()
                            .filter_map(|id| remotes.get(id))
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default();

                let delta = provider
                    .reconcile_relations(remote, parent, &blockers)
                    .await?;
                if !delta.is_noop() {
                    debug!(
                        "[SyncEngine] {}: relations converged (+{} -{})",
                        item.id, delta.added, delta.removed
                    );
                }
                Ok(())
            }
        });

        let results: Vec<Result<(), SyncError>> = futures::future::join_all(futures).await;
        results.into_iter().collect()
    }
}
