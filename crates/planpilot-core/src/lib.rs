//! Core reconciliation logic for planpilot
//!
//! This crate holds everything between the contracts and a concrete
//! tracker adapter:
//!
//! - `plan` - loader, validator, and deterministic hasher
//! - `render` - the default Markdown body renderer
//! - `engine` - the phased sync orchestrator
//! - `mapsync` - read-only sync-map reconstruction from remote state
//! - `clean` - the leaf-first multi-pass deletion planner
//! - `dryrun` - the in-memory provider used for dry runs and tests

pub mod clean;
pub mod dryrun;
pub mod engine;
pub mod mapsync;
pub mod plan;
pub mod render;

pub use clean::{CleanOutcome, CleanPlanner, CleanScope};
pub use dryrun::{DryRunProvider, RecordedOp, SeedItem, DRY_RUN_KEY};
pub use engine::{EngineConfig, SyncEngine, DEFAULT_LABEL, DEFAULT_MAX_CONCURRENT};
pub use mapsync::{discover_plan_ids, map_sync, MapSyncOutcome, PlanSelection};
pub use plan::{build_plan, plan_id, PlanError, PlanSource, ValidationMode};
pub use render::DefaultRenderer;
