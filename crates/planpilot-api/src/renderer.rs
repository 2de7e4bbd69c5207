//! Renderer interface
//!
//! Renderers turn a plan item plus resolved cross-references into the body
//! text stored on the external item. Rendering is a pure function of its
//! inputs and must be byte-stable; the engine calls it twice per item
//! (preliminary during upsert, full during enrich).

use std::collections::BTreeMap;

use crate::plan::PlanItem;

/// Cross-reference context supplied by the engine.
///
/// `sub_items` arrives already ordered by `(type, id)`; `dependencies` is
/// keyed by dependency id, so iteration order is the sorted id order the
/// wire format requires.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderContext {
    pub plan_id: String,
    /// Short reference of the parent item, e.g. `#42`.
    pub parent_ref: Option<String>,
    /// `(key, title)` of each direct child.
    pub sub_items: Vec<(String, String)>,
    /// Dependency id → short reference of the dependency's item.
    pub dependencies: BTreeMap<String, String>,
}

impl RenderContext {
    /// Context with no resolved references, used for the preliminary
    /// render before all keys are known.
    pub fn preliminary(plan_id: impl Into<String>, parent_ref: Option<String>) -> Self {
        Self {
            plan_id: plan_id.into(),
            parent_ref,
            sub_items: Vec::new(),
            dependencies: BTreeMap::new(),
        }
    }
}

pub trait Renderer: Send + Sync {
    /// Emit the item body. Every renderer must start the output with the
    /// marker block (see [`crate::marker::MarkerBlock`]); empty fields
    /// produce no section at all.
    fn render(&self, item: &PlanItem, ctx: &RenderContext) -> String;
}
