//! Plan loading, validation, and identity
//!
//! `build_plan` is the one entry point callers use: load files, validate
//! relational integrity, compute the deterministic plan id. The plan is
//! read-only afterwards.

pub mod hasher;
pub mod loader;
pub mod validator;

pub use hasher::plan_id;
pub use loader::{load_items, PlanSource};
pub use validator::{validate, ValidationMode};

use planpilot_api::{Plan, PlanLoadError, PlanValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Load(#[from] PlanLoadError),
    #[error(transparent)]
    Validation(#[from] PlanValidationError),
}

/// Load, validate, and hash.
pub fn build_plan(source: &PlanSource, mode: ValidationMode) -> Result<Plan, PlanError> {
    let items = load_items(source)?;
    validate(&items, mode)?;
    let plan_id = hasher::plan_id(&items);
    tracing::info!(
        "[Plan] Built plan {} with {} item(s)",
        plan_id,
        items.len()
    );
    Ok(Plan { items, plan_id })
}
