//! planpilot: plan-to-issue-tracker synchronization
//!
//! Glue crate wiring the pieces together: config loading, provider
//! construction, the run entrypoints front ends call, sync-map file
//! persistence, and tracing setup. The interesting machinery lives in
//! `planpilot-core` (engine, planners) and the provider crates.

pub mod config;
pub mod logging;
pub mod mapfile;
pub mod run;

pub use config::{AuthKind, Config, PlanPaths};
pub use logging::init_tracing;
pub use mapfile::{read_sync_map, write_sync_map};
pub use run::{
    build_provider, classify, load_plan, run_clean, run_map_sync, run_sync, ErrorCategory,
    RunOptions,
};
