//! Plan data model
//!
//! A plan is a flat list of epics, stories, and tasks related through
//! `parent_id` and `depends_on`. Items are read-only once loaded; the
//! loader and validator in `planpilot-core` are the only producers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Work item kind. Ordering matters: epics are processed before stories,
/// stories before tasks, both in hashing and in the upsert phase.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum ItemType {
    Epic,
    Story,
    Task,
}

impl ItemType {
    /// All types in level order (epic first).
    pub const LEVELS: [ItemType; 3] = [ItemType::Epic, ItemType::Story, ItemType::Task];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Epic => "EPIC",
            ItemType::Story => "STORY",
            ItemType::Task => "TASK",
        }
    }

    pub fn parse(s: &str) -> Option<ItemType> {
        match s.trim() {
            "EPIC" => Some(ItemType::Epic),
            "STORY" => Some(ItemType::Story),
            "TASK" => Some(ItemType::Task),
            _ => None,
        }
    }

    /// The type one level up the hierarchy, if any.
    pub fn parent_type(&self) -> Option<ItemType> {
        match self {
            ItemType::Epic => None,
            ItemType::Story => Some(ItemType::Epic),
            ItemType::Task => Some(ItemType::Story),
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effort estimate. Both fields optional; an estimate with neither set is
/// treated the same as no estimate at all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tshirt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<f64>,
}

/// How completion of the item is checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Verification {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ci_checks: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub manual_steps: Vec<String>,
}

/// Pointer into an external specification document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
}

/// In/out of scope lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub in_scope: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub out_scope: Vec<String>,
}

/// A single plan item. Field names match the plan file format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanItem {
    pub id: String,

    #[serde(rename = "type")]
    pub item_type: ItemType,

    pub title: String,

    #[serde(default)]
    pub goal: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requirements: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub acceptance_criteria: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub success_metrics: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assumptions: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub risks: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motivation: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_item_ids: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimate: Option<Estimate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<Verification>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_ref: Option<SpecRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
}

impl PlanItem {
    /// Minimal item used as a starting point in tests and builders.
    pub fn new(id: impl Into<String>, item_type: ItemType, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            item_type,
            title: title.into(),
            goal: String::new(),
            requirements: Vec::new(),
            acceptance_criteria: Vec::new(),
            success_metrics: Vec::new(),
            assumptions: Vec::new(),
            risks: Vec::new(),
            motivation: None,
            parent_id: None,
            sub_item_ids: None,
            depends_on: Vec::new(),
            estimate: None,
            verification: None,
            spec_ref: None,
            scope: None,
        }
    }

    /// T-shirt size of the estimate, when one is present.
    pub fn tshirt(&self) -> Option<&str> {
        self.estimate.as_ref().and_then(|e| e.tshirt.as_deref())
    }

    /// Sort key used throughout the engine: `(type, id)`.
    pub fn sort_key(&self) -> (ItemType, &str) {
        (self.item_type, &self.id)
    }
}

/// A validated plan together with its deterministic identity.
#[derive(Debug, Clone)]
pub struct Plan {
    pub items: Vec<PlanItem>,
    /// 12 hex characters, computed by the plan hasher.
    pub plan_id: String,
}

impl Plan {
    pub fn get(&self, id: &str) -> Option<&PlanItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Items of one level, sorted by id.
    pub fn level(&self, item_type: ItemType) -> Vec<&PlanItem> {
        let mut items: Vec<&PlanItem> = self
            .items
            .iter()
            .filter(|i| i.item_type == item_type)
            .collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        items
    }

    /// Direct children of `id`, sorted by `(type, id)`.
    pub fn children_of(&self, id: &str) -> Vec<&PlanItem> {
        let mut children: Vec<&PlanItem> = self
            .items
            .iter()
            .filter(|i| i.parent_id.as_deref() == Some(id))
            .collect();
        children.sort_by_key(|i| i.sort_key());
        children
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_type_ordering_is_epic_story_task() {
        assert!(ItemType::Epic < ItemType::Story);
        assert!(ItemType::Story < ItemType::Task);
    }

    #[test]
    fn item_type_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&ItemType::Epic).unwrap(), "\"EPIC\"");
        assert_eq!(
            serde_json::from_str::<ItemType>("\"STORY\"").unwrap(),
            ItemType::Story
        );
    }

    #[test]
    fn plan_item_round_trips_through_json() {
        let mut item = PlanItem::new("T1", ItemType::Task, "Wire up the parser");
        item.goal = "Parse the thing".to_string();
        item.depends_on = vec!["T0".to_string()];
        item.estimate = Some(Estimate {
            tshirt: Some("M".to_string()),
            hours: Some(6.0),
        });

        let json = serde_json::to_string(&item).unwrap();
        let back: PlanItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn children_are_sorted_by_type_then_id() {
        let mut s = PlanItem::new("S1", ItemType::Story, "story");
        s.parent_id = Some("E1".to_string());
        let mut t = PlanItem::new("T1", ItemType::Task, "task");
        t.parent_id = Some("E1".to_string());
        let plan = Plan {
            items: vec![t.clone(), s.clone(), PlanItem::new("E1", ItemType::Epic, "epic")],
            plan_id: "0".repeat(12),
        };
        let ids: Vec<&str> = plan.children_of("E1").iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["S1", "T1"]);
    }
}
