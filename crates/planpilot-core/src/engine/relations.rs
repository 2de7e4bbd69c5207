//! Relation planning
//!
//! Turns the plan's parent/dependency declarations into the edge set the
//! relate phase converges on: explicit blocked-by edges, roll-up edges
//! derived from cross-parent child dependencies (two passes, task→story
//! then story→epic), deduplication, and a deterministic cycle filter.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use planpilot_api::{ItemType, Plan};

/// Desired relations for the whole plan, cycle-free.
#[derive(Debug, Default)]
pub struct RelationPlan {
    /// item id → parent item id.
    pub parents: BTreeMap<String, String>,
    /// item id → ids blocking it.
    pub blockers: BTreeMap<String, BTreeSet<String>>,
    /// Skipped cyclic edges and omitted unresolved references.
    pub warnings: Vec<String>,
}

impl RelationPlan {
    pub fn has_parents(&self) -> bool {
        !self.parents.is_empty()
    }

    pub fn has_blockers(&self) -> bool {
        self.blockers.values().any(|set| !set.is_empty())
    }
}

/// Compute the converged relation set for `plan`.
///
/// References that do not resolve to a loaded item are omitted and
/// recorded as warnings (they can only occur in partial validation mode).
pub fn plan_relations(plan: &Plan) -> RelationPlan {
    let mut warnings = Vec::new();
    let by_id: HashMap<&str, &planpilot_api::PlanItem> =
        plan.items.iter().map(|item| (item.id.as_str(), item)).collect();

    let mut parents: BTreeMap<String, String> = BTreeMap::new();
    for item in &plan.items {
        if let Some(parent_id) = &item.parent_id {
            if by_id.contains_key(parent_id.as_str()) {
                parents.insert(item.id.clone(), parent_id.clone());
            } else {
                warnings.push(format!(
                    "{}: parent {} is not part of the plan; omitted",
                    item.id, parent_id
                ));
            }
        }
    }

    // Explicit blocked-by edges, in deterministic order.
    let mut edges: BTreeSet<(String, String)> = BTreeSet::new();
    let mut sorted_items: Vec<&planpilot_api::PlanItem> = plan.items.iter().collect();
    sorted_items.sort_by_key(|item| item.sort_key());
    for item in &sorted_items {
        for dep in &item.depends_on {
            if by_id.contains_key(dep.as_str()) {
                edges.insert((item.id.clone(), dep.clone()));
            } else {
                warnings.push(format!(
                    "{}: dependency {} is not part of the plan; omitted",
                    item.id, dep
                ));
            }
        }
    }

    // Roll-up: a cross-parent dependency between children blocks the
    // parents too. Two passes cover the three-level hierarchy.
    for level in [ItemType::Task, ItemType::Story] {
        let rolled: Vec<(String, String)> = edges
            .iter()
            .filter(|(source, target)| {
                by_id.get(source.as_str()).is_some_and(|i| i.item_type == level)
                    && by_id.get(target.as_str()).is_some_and(|i| i.item_type == level)
            })
            .filter_map(|(source, target)| {
                let source_parent = parents.get(source)?;
                let target_parent = parents.get(target)?;
                (source_parent != target_parent)
                    .then(|| (source_parent.clone(), target_parent.clone()))
            })
            .collect();
        edges.extend(rolled);
    }

    // Cycle filter: add edges in sorted order, skipping any edge that
    // would close a cycle. In a two-cycle the edge whose source sorts
    // greater is the one skipped.
    let mut accepted: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (source, target) in edges {
        if source == target || reaches(&accepted, &target, &source) {
            warnings.push(format!(
                "skipping cyclic dependency edge {source} -> {target}"
            ));
            continue;
        }
        accepted.entry(source).or_default().insert(target);
    }

    RelationPlan {
        parents,
        blockers: accepted,
        warnings,
    }
}

/// Whether `to` is reachable from `from` over the accepted edges.
fn reaches(edges: &BTreeMap<String, BTreeSet<String>>, from: &str, to: &str) -> bool {
    let mut queue = vec![from];
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    while let Some(node) = queue.pop() {
        if node == to {
            return true;
        }
        if !seen.insert(node) {
            continue;
        }
        if let Some(next) = edges.get(node) {
            queue.extend(next.iter().map(String::as_str));
        }
    }
    false
}
