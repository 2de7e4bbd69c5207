//! Clean planner
//!
//! The only workflow that deletes. Candidates come from marker discovery,
//! deletion order is children before parents, and execution retries in
//! passes so providers with transient relation constraints (refusing to
//! delete a parent whose children still exist) eventually drain. A pass
//! that makes no progress fails with the first recorded error, bounding
//! the planner at `items + 1` passes.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use planpilot_api::{
    ItemSearchFilters, MarkerBlock, Provider, ProviderError, RemoteItem, SyncError,
};

/// Which labeled items to delete.
#[derive(Debug, Clone)]
pub enum CleanScope {
    /// Only items of this plan.
    Plan(String),
    /// Every item carrying the label, across all plans.
    AllPlans,
}

#[derive(Debug, Clone)]
pub struct CleanOutcome {
    pub planned: usize,
    pub deleted: usize,
    pub passes: usize,
    pub dry_run: bool,
}

pub struct CleanPlanner {
    label: String,
    scope: CleanScope,
    dry_run: bool,
}

impl CleanPlanner {
    pub fn new(label: impl Into<String>, scope: CleanScope, dry_run: bool) -> Self {
        Self {
            label: label.into(),
            scope,
            dry_run,
        }
    }

    #[tracing::instrument(name = "clean.run", skip_all)]
    pub async fn run(&self, provider: Arc<dyn Provider>) -> Result<CleanOutcome, SyncError> {
        let candidates = self.discover(provider.as_ref()).await?;
        let planned = candidates.len();
        info!("[Clean] {} candidate(s) for deletion", planned);

        if self.dry_run {
            return Ok(CleanOutcome {
                planned,
                deleted: 0,
                passes: 0,
                dry_run: true,
            });
        }

        let mut remaining = order_leaf_first(candidates);
        let mut deleted = 0;
        let mut passes = 0;

        while !remaining.is_empty() {
            passes += 1;
            let before = remaining.len();
            let mut failed: Vec<(RemoteItem, MarkerBlock)> = Vec::new();
            let mut first_error: Option<ProviderError> = None;

            for (remote, marker) in remaining {
                match provider.delete_item(&remote.id).await {
                    Ok(()) => {
                        info!("[Clean] Deleted {} ({})", remote.key, marker.item_id);
                        deleted += 1;
                    }
                    Err(err) => {
                        warn!("[Clean] Failed to delete {}: {}", remote.key, err);
                        if first_error.is_none() {
                            first_error = Some(err);
                        }
                        failed.push((remote, marker));
                    }
                }
            }

            // A pass that deletes nothing will never make progress later.
            if failed.len() == before {
                if let Some(err) = first_error {
                    return Err(err.into());
                }
            }
            remaining = failed;
        }

        Ok(CleanOutcome {
            planned,
            deleted,
            passes,
            dry_run: false,
        })
    }

    async fn discover(
        &self,
        provider: &dyn Provider,
    ) -> Result<Vec<(RemoteItem, MarkerBlock)>, SyncError> {
        let body_contains = match &self.scope {
            CleanScope::Plan(plan_id) => format!("PLAN_ID:{plan_id}"),
            CleanScope::AllPlans => "PLAN_ID:".to_string(),
        };
        let filters = ItemSearchFilters {
            labels: [self.label.clone()].into(),
            body_contains: Some(body_contains),
        };
        let found = provider.search_items(&filters).await?;

        let mut candidates = Vec::new();
        for remote in found {
            let Some(marker) = MarkerBlock::parse(&remote.body) else {
                continue;
            };
            if let CleanScope::Plan(plan_id) = &self.scope {
                if &marker.plan_id != plan_id {
                    continue;
                }
            }
            candidates.push((remote, marker));
        }
        Ok(candidates)
    }
}

/// Order children before parents. Parent links come from the marker
/// blocks themselves so the ordering works without any plan loaded,
/// including in all-plans mode where several hierarchies mix.
fn order_leaf_first(
    candidates: Vec<(RemoteItem, MarkerBlock)>,
) -> Vec<(RemoteItem, MarkerBlock)> {
    // Depth per (plan, item): roots at 0, children below. Cycles and
    // dangling parents stop the walk.
    let parent_of: HashMap<(String, String), Option<String>> = candidates
        .iter()
        .map(|(_, marker)| {
            (
                (marker.plan_id.clone(), marker.item_id.clone()),
                marker.parent_id.clone(),
            )
        })
        .collect();

    let depth_of = |marker: &MarkerBlock| -> usize {
        let mut depth = 0;
        let mut current = marker.parent_id.clone();
        while let Some(parent_id) = current {
            if depth > parent_of.len() {
                break;
            }
            depth += 1;
            current = parent_of
                .get(&(marker.plan_id.clone(), parent_id))
                .cloned()
                .flatten();
        }
        depth
    };

    let mut ordered = candidates;
    ordered.sort_by_key(|(remote, marker)| {
        (Reverse(depth_of(marker)), marker.plan_id.clone(), remote.id.clone())
    });
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dryrun::{DryRunProvider, RecordedOp, SeedItem};
    use planpilot_api::ItemType;

    fn body(plan_id: &str, item_id: &str, item_type: ItemType, parent: Option<&str>) -> String {
        format!(
            "{}\nbody",
            MarkerBlock::new(plan_id, item_id, item_type, parent.map(str::to_string)).render()
        )
    }

    async fn seed(
        provider: &DryRunProvider,
        plan_id: &str,
        item_id: &str,
        item_type: ItemType,
        parent: Option<&str>,
    ) -> RemoteItem {
        provider
            .seed(SeedItem {
                title: item_id.to_string(),
                body: body(plan_id, item_id, item_type, parent),
                item_type: Some(item_type),
                labels: ["planpilot".to_string()].into(),
            })
            .await
    }

    #[tokio::test]
    async fn dry_run_counts_without_deleting() {
        let provider = DryRunProvider::new();
        seed(&provider, "aaaaaaaaaaaa", "E1", ItemType::Epic, None).await;
        seed(&provider, "aaaaaaaaaaaa", "S1", ItemType::Story, Some("E1")).await;

        let planner = CleanPlanner::new(
            "planpilot",
            CleanScope::Plan("aaaaaaaaaaaa".to_string()),
            true,
        );
        let outcome = planner.run(provider.clone()).await.unwrap();
        assert_eq!(outcome.planned, 2);
        assert_eq!(outcome.deleted, 0);
        assert!(outcome.dry_run);
        assert_eq!(provider.item_count().await, 2);
        assert_eq!(
            provider
                .count_ops(|op| matches!(op, RecordedOp::Delete { .. }))
                .await,
            0
        );
    }

    #[tokio::test]
    async fn plan_scope_only_touches_that_plan() {
        let provider = DryRunProvider::new();
        seed(&provider, "aaaaaaaaaaaa", "E1", ItemType::Epic, None).await;
        seed(&provider, "bbbbbbbbbbbb", "E1", ItemType::Epic, None).await;

        let planner = CleanPlanner::new(
            "planpilot",
            CleanScope::Plan("aaaaaaaaaaaa".to_string()),
            false,
        );
        let outcome = planner.run(provider.clone()).await.unwrap();
        assert_eq!(outcome.deleted, 1);
        assert_eq!(provider.item_count().await, 1);
    }

    #[tokio::test]
    async fn all_plans_mixed_hierarchy_deletes_leaf_first() {
        // Seed scenario 6: five items across two plans, with a provider
        // that refuses to delete parents before children.
        let provider = DryRunProvider::with_strict_delete();
        let e1 = seed(&provider, "aaaaaaaaaaaa", "E1", ItemType::Epic, None).await;
        let s1 = seed(&provider, "aaaaaaaaaaaa", "S1", ItemType::Story, Some("E1")).await;
        let t1 = seed(&provider, "aaaaaaaaaaaa", "T1", ItemType::Task, Some("S1")).await;
        let e2 = seed(&provider, "bbbbbbbbbbbb", "E1", ItemType::Epic, None).await;
        let s2 = seed(&provider, "bbbbbbbbbbbb", "S1", ItemType::Story, Some("E1")).await;

        // Wire the provider-side parent constraint.
        provider.reconcile_relations(&s1, Some(&e1), &[]).await.unwrap();
        provider.reconcile_relations(&t1, Some(&s1), &[]).await.unwrap();
        provider.reconcile_relations(&s2, Some(&e2), &[]).await.unwrap();
        provider.clear_ops().await;

        let planner = CleanPlanner::new("planpilot", CleanScope::AllPlans, false);
        let outcome = planner.run(provider.clone()).await.unwrap();

        assert_eq!(outcome.planned, 5);
        assert_eq!(outcome.deleted, 5);
        assert!(outcome.passes <= 3, "took {} passes", outcome.passes);
        assert_eq!(provider.item_count().await, 0);
    }

    #[tokio::test]
    async fn no_progress_fails_with_first_error() {
        // A parent whose child is not part of the candidate set can never
        // be deleted under the strict provider: no pass makes progress.
        let provider = DryRunProvider::with_strict_delete();
        let e1 = seed(&provider, "aaaaaaaaaaaa", "E1", ItemType::Epic, None).await;
        let orphan = provider
            .seed(SeedItem {
                title: "unlabeled child".to_string(),
                body: "no marker".to_string(),
                item_type: Some(ItemType::Story),
                labels: Default::default(),
            })
            .await;
        provider.reconcile_relations(&orphan, Some(&e1), &[]).await.unwrap();

        let planner = CleanPlanner::new("planpilot", CleanScope::AllPlans, false);
        let err = planner.run(provider).await.unwrap_err();
        assert!(matches!(err, SyncError::Provider(_)));
    }
}
