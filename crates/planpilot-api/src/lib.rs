//! Contracts for the planpilot sync system
//!
//! This crate is the shared vocabulary: the plan data model, the remote
//! item model, the marker-block wire format, the error taxonomy, and the
//! `Provider`/`Renderer` traits. It holds no logic beyond the marker codec
//! and has no knowledge of any concrete tracker.

pub mod error;
pub mod fields;
pub mod item;
pub mod marker;
pub mod plan;
pub mod provider;
pub mod renderer;

pub use error::{
    ConfigError, CreateItemPartialFailure, CreateStep, PlanLoadError, PlanValidationError,
    ProviderError, SyncError,
};
pub use fields::{CreateTypeStrategy, FieldConfig};
pub use item::{
    Capabilities, CreateItemInput, ItemSearchFilters, RelationDelta, RemoteItem, SyncEntry,
    SyncMap, SyncResult, UpdateItemInput,
};
pub use marker::{MarkerBlock, MARKER_CLOSE, MARKER_OPEN};
pub use plan::{Estimate, ItemType, Plan, PlanItem, Scope, SpecRef, Verification};
pub use provider::Provider;
pub use renderer::{RenderContext, Renderer};
