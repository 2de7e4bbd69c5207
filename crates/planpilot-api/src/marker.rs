//! Metadata marker block
//!
//! Every rendered item body starts with a plain-text block carrying the
//! plan and item identity. The block is the sole discovery signal: a sync
//! run recognizes its own items by parsing bodies, never by consulting a
//! local map. Line-based, `KEY:VALUE`, versioned through the opening
//! sentinel.

use crate::plan::ItemType;

pub const MARKER_OPEN: &str = "PLANPILOT_META_V1";
pub const MARKER_CLOSE: &str = "END_PLANPILOT_META";

/// Parsed identity of an item body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerBlock {
    pub plan_id: String,
    pub item_id: String,
    pub item_type: ItemType,
    pub parent_id: Option<String>,
}

impl MarkerBlock {
    pub fn new(
        plan_id: impl Into<String>,
        item_id: impl Into<String>,
        item_type: ItemType,
        parent_id: Option<String>,
    ) -> Self {
        Self {
            plan_id: plan_id.into(),
            item_id: item_id.into(),
            item_type,
            parent_id,
        }
    }

    /// Render the block exactly as it appears at the top of a body,
    /// LF-terminated lines, no surrounding blank lines.
    pub fn render(&self) -> String {
        format!(
            "{MARKER_OPEN}\nPLAN_ID:{}\nITEM_ID:{}\nITEM_TYPE:{}\nPARENT_ID:{}\n{MARKER_CLOSE}\n",
            self.plan_id,
            self.item_id,
            self.item_type,
            self.parent_id.as_deref().unwrap_or(""),
        )
    }

    /// Parse the first marker block out of `body`.
    ///
    /// Values tolerate surrounding whitespace; unknown keys are ignored.
    /// Returns `None` when the sentinels are missing or any required key
    /// is absent or malformed; callers treat such bodies as foreign.
    pub fn parse(body: &str) -> Option<MarkerBlock> {
        let mut lines = body.lines();
        lines.find(|line| line.trim() == MARKER_OPEN)?;

        let mut plan_id = None;
        let mut item_id = None;
        let mut item_type = None;
        let mut parent_id = None;

        for line in lines {
            let line = line.trim();
            if line == MARKER_CLOSE {
                return Some(MarkerBlock {
                    plan_id: plan_id?,
                    item_id: item_id?,
                    item_type: item_type?,
                    parent_id,
                });
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "PLAN_ID" => plan_id = Some(value.to_string()),
                "ITEM_ID" => item_id = Some(value.to_string()),
                "ITEM_TYPE" => item_type = Some(ItemType::parse(value)?),
                "PARENT_ID" => {
                    parent_id = (!value.is_empty()).then(|| value.to_string());
                }
                _ => {}
            }
        }
        // Close sentinel never seen.
        None
    }
}
