//! Board field configuration
//!
//! Shared between the config file and provider adapters. These settings
//! only influence item creation: after the initial create, board workflow
//! state belongs to the provider and is never rewritten.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How the item's type is communicated to the provider at create time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CreateTypeStrategy {
    /// Use the tracker's native issue types.
    #[default]
    IssueType,
    /// Apply a type label instead.
    Label,
    /// Do not communicate the type.
    None,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Initial status option name, e.g. "Todo".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Initial priority option name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    /// Initial iteration name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iteration: Option<String>,
    /// Name of the board field that carries the size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_field: Option<String>,
    /// T-shirt size → size field option name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub size_from_tshirt: BTreeMap<String, String>,
    #[serde(default)]
    pub create_type_strategy: CreateTypeStrategy,
    /// EPIC/STORY/TASK → provider type (or label) name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub create_type_map: BTreeMap<String, String>,
}

impl FieldConfig {
    /// Board size option for a t-shirt estimate, if both sides are mapped.
    pub fn size_option(&self, tshirt: &str) -> Option<&str> {
        self.size_from_tshirt.get(tshirt).map(String::as_str)
    }
}
