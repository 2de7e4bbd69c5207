//! Plan validation
//!
//! Collects every violation before failing, so a broken plan reports all
//! of its problems in one pass. `strict` requires every reference to
//! resolve; `partial` tolerates dangling `parent_id`/`depends_on`, which
//! the engine then silently omits from rendered context and relation
//! edges.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use planpilot_api::{ItemType, PlanItem, PlanValidationError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    #[default]
    Strict,
    Partial,
}

/// Validate the loaded items. On success the items are safe to hash and
/// sync; in partial mode, callers must still treat unresolved references
/// as absent.
pub fn validate(items: &[PlanItem], mode: ValidationMode) -> Result<(), PlanValidationError> {
    let mut errors = Vec::new();

    let mut by_id: HashMap<&str, &PlanItem> = HashMap::new();
    let mut seen_dup: HashSet<&str> = HashSet::new();
    for item in items {
        if by_id.insert(&item.id, item).is_some() && seen_dup.insert(&item.id) {
            errors.push(format!("duplicate item id: {}", item.id));
        }
    }

    for item in items {
        if item.title.trim().is_empty() {
            errors.push(format!("{}: title must not be empty", item.id));
        }
        if item.goal.trim().is_empty() {
            errors.push(format!("{}: goal is required", item.id));
        }
        if item.requirements.is_empty() {
            errors.push(format!("{}: requirements are required", item.id));
        }
        if item.acceptance_criteria.is_empty() {
            errors.push(format!("{}: acceptance_criteria are required", item.id));
        }

        match (&item.parent_id, item.item_type) {
            (Some(_), ItemType::Epic) => {
                errors.push(format!("{}: epics must not have a parent_id", item.id));
            }
            (Some(parent_id), item_type) => match by_id.get(parent_id.as_str()) {
                Some(parent) => {
                    let expected = item_type.parent_type();
                    if Some(parent.item_type) != expected {
                        errors.push(format!(
                            "{}: parent {} is a {}, expected a {}",
                            item.id,
                            parent_id,
                            parent.item_type,
                            expected.map(|t| t.as_str()).unwrap_or("none"),
                        ));
                    }
                    // When the parent lists its children, the child must
                    // appear there.
                    if let Some(sub_ids) = &parent.sub_item_ids {
                        if !sub_ids.iter().any(|id| id == &item.id) {
                            errors.push(format!(
                                "{}: missing from sub_item_ids of parent {}",
                                item.id, parent_id
                            ));
                        }
                    }
                }
                None => {
                    if mode == ValidationMode::Strict {
                        errors.push(format!(
                            "{}: parent_id {} does not resolve to a loaded item",
                            item.id, parent_id
                        ));
                    }
                }
            },
            (None, _) => {}
        }

        for dep in &item.depends_on {
            if !by_id.contains_key(dep.as_str()) && mode == ValidationMode::Strict {
                errors.push(format!(
                    "{}: depends_on {} does not resolve to a loaded item",
                    item.id, dep
                ));
            }
        }

        if let Some(sub_ids) = &item.sub_item_ids {
            for sub_id in sub_ids {
                if let Some(sub) = by_id.get(sub_id.as_str()) {
                    if sub.parent_id.as_deref() != Some(item.id.as_str()) {
                        errors.push(format!(
                            "{}: sub_item_ids lists {} but its parent_id is {}",
                            item.id,
                            sub_id,
                            sub.parent_id.as_deref().unwrap_or("unset"),
                        ));
                    }
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(PlanValidationError { errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_item(id: &str, item_type: ItemType) -> PlanItem {
        let mut item = PlanItem::new(id, item_type, format!("{id} title"));
        item.goal = "goal".to_string();
        item.requirements = vec!["req".to_string()];
        item.acceptance_criteria = vec!["done".to_string()];
        item
    }

    #[test]
    fn accepts_a_well_formed_hierarchy() {
        let epic = valid_item("E1", ItemType::Epic);
        let mut story = valid_item("S1", ItemType::Story);
        story.parent_id = Some("E1".to_string());
        let mut task = valid_item("T1", ItemType::Task);
        task.parent_id = Some("S1".to_string());

        validate(&[epic, story, task], ValidationMode::Strict).unwrap();
    }

    #[test]
    fn rejects_duplicate_ids_once() {
        let items = vec![
            valid_item("E1", ItemType::Epic),
            valid_item("E1", ItemType::Epic),
            valid_item("E1", ItemType::Epic),
        ];
        let err = validate(&items, ValidationMode::Strict).unwrap_err();
        let dups: Vec<_> = err
            .errors
            .iter()
            .filter(|e| e.contains("duplicate item id"))
            .collect();
        assert_eq!(dups.len(), 1);
    }

    #[test]
    fn collects_all_errors_in_one_pass() {
        let mut epic = valid_item("E1", ItemType::Epic);
        epic.parent_id = Some("X".to_string());
        epic.goal = String::new();
        let err = validate(&[epic], ValidationMode::Strict).unwrap_err();
        assert!(err.errors.iter().any(|e| e.contains("goal is required")));
        assert!(err.errors.iter().any(|e| e.contains("must not have a parent_id")));
    }

    #[test]
    fn hierarchy_level_is_enforced() {
        let epic = valid_item("E1", ItemType::Epic);
        let mut task = valid_item("T1", ItemType::Task);
        // Tasks hang off stories, not epics.
        task.parent_id = Some("E1".to_string());
        let err = validate(&[epic, task], ValidationMode::Strict).unwrap_err();
        assert!(err.errors.iter().any(|e| e.contains("expected a STORY")));
    }

    #[test]
    fn dangling_references_fail_strict_but_pass_partial() {
        let mut task = valid_item("T1", ItemType::Task);
        task.depends_on = vec!["T_missing".to_string()];
        task.parent_id = Some("S_missing".to_string());

        let err = validate(std::slice::from_ref(&task), ValidationMode::Strict).unwrap_err();
        assert_eq!(err.errors.len(), 2);

        validate(&[task], ValidationMode::Partial).unwrap();
    }

    #[test]
    fn sub_item_ids_must_agree_with_parent_id() {
        let mut epic = valid_item("E1", ItemType::Epic);
        epic.sub_item_ids = Some(vec!["S1".to_string()]);
        let story = valid_item("S1", ItemType::Story); // parent_id unset

        let err = validate(&[epic, story], ValidationMode::Strict).unwrap_err();
        assert!(err.errors.iter().any(|e| e.contains("sub_item_ids lists S1")));
    }

    #[test]
    fn child_missing_from_parent_listing_is_an_error() {
        let mut epic = valid_item("E1", ItemType::Epic);
        epic.sub_item_ids = Some(vec!["S2".to_string()]);
        let mut story = valid_item("S1", ItemType::Story);
        story.parent_id = Some("E1".to_string());

        let err = validate(&[epic, story], ValidationMode::Strict).unwrap_err();
        assert!(err
            .errors
            .iter()
            .any(|e| e.contains("missing from sub_item_ids")));
    }
}
