//! Run entrypoints
//!
//! Composition root: load config, build the plan, pick a provider, drive
//! the engine or one of the planners, and persist the sync map. Front
//! ends call these functions and map the error category to an exit code.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use planpilot_api::{
    ConfigError, Plan, PlanLoadError, PlanValidationError, Provider, ProviderError, SyncError,
    SyncResult,
};
use planpilot_core::clean::{CleanOutcome, CleanPlanner, CleanScope};
use planpilot_core::engine::{EngineConfig, SyncEngine};
use planpilot_core::mapsync::{map_sync, MapSyncOutcome, PlanSelection};
use planpilot_core::plan::PlanError;
use planpilot_core::render::DefaultRenderer;
use planpilot_core::DryRunProvider;
use planpilot_github::{AuthStrategy, GithubProvider, GithubSettings};

use crate::config::{AuthKind, Config};
use crate::mapfile::{read_sync_map, write_sync_map};

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Substitute the in-memory provider and skip sync-map persistence.
    pub dry_run: bool,
    pub cancel: CancellationToken,
}

/// Instantiate the configured provider. `dry_run` overrides whatever the
/// config names.
pub fn build_provider(config: &Config, dry_run: bool) -> Result<Arc<dyn Provider>> {
    if dry_run {
        return Ok(DryRunProvider::new());
    }
    match config.provider.as_str() {
        "github" => {
            let auth = match config.auth {
                AuthKind::GhCli => AuthStrategy::GhCli,
                AuthKind::Env => AuthStrategy::Env,
                AuthKind::Token => AuthStrategy::Token(
                    config.token.clone().unwrap_or_default(),
                ),
            };
            Ok(Arc::new(GithubProvider::new(GithubSettings {
                target: config.target.clone(),
                board_url: config.board_url.clone(),
                label: config.label.clone(),
                auth,
                field_config: config.field_config.clone(),
            })))
        }
        "dry-run" => Ok(DryRunProvider::new()),
        other => Err(ConfigError::Invalid(format!("unknown provider {other:?}")).into()),
    }
}

/// Load, validate, and hash the plan. When a sync map already exists for
/// this config, its plan id stays the identity anchor, so content edits
/// update the existing items instead of minting a new plan.
pub fn load_plan(config: &Config) -> Result<Plan, anyhow::Error> {
    let mut plan = planpilot_core::build_plan(&config.plan_source(), config.validation_mode)?;
    if let Some(previous) = read_sync_map(&config.sync_path)? {
        if !previous.plan_id.is_empty() && previous.plan_id != plan.plan_id {
            tracing::info!(
                "[Run] Keeping recorded plan id {} (content hash {})",
                previous.plan_id,
                plan.plan_id
            );
            plan.plan_id = previous.plan_id;
        }
    }
    Ok(plan)
}

fn engine_config(config: &Config, dry_run: bool) -> EngineConfig {
    EngineConfig {
        label: config.label.clone(),
        target: config.target.clone(),
        board_url: config.board_url.clone(),
        max_concurrent: config.max_concurrent,
        dry_run,
    }
}

async fn teardown_quietly(provider: &dyn Provider) {
    if let Err(err) = provider.teardown().await {
        warn!("[Run] Provider teardown failed: {err}");
    }
}

/// One full sync run: plan → provider → engine → sync-map file.
pub async fn run_sync(config: &Config, opts: RunOptions) -> Result<SyncResult> {
    let plan = load_plan(config)?;
    let provider = build_provider(config, opts.dry_run)?;
    provider.setup().await.context("provider setup failed")?;

    let engine = SyncEngine::new(engine_config(config, opts.dry_run))
        .with_cancellation(opts.cancel.clone());
    let result = engine.run(&plan, provider.clone(), &DefaultRenderer).await;
    teardown_quietly(provider.as_ref()).await;
    let result = result?;

    if !opts.dry_run {
        write_sync_map(&config.sync_path, &result.sync_map)?;
    }
    Ok(result)
}

/// Rebuild the sync map from remote state; write it when `apply` is set.
pub async fn run_map_sync(
    config: &Config,
    selection: PlanSelection,
    apply: bool,
) -> Result<MapSyncOutcome> {
    let provider = build_provider(config, false)?;
    provider.setup().await.context("provider setup failed")?;

    let local = read_sync_map(&config.sync_path)?;
    let outcome = map_sync(
        provider.clone(),
        &config.label,
        selection,
        local.as_ref(),
        &config.target,
        &config.board_url,
    )
    .await;
    teardown_quietly(provider.as_ref()).await;
    let outcome = outcome?;

    if apply {
        write_sync_map(&config.sync_path, &outcome.sync_map)?;
    }
    Ok(outcome)
}

/// Delete labeled items, current plan only or across all plans. Without
/// `apply` this is a preview: the planner reports the would-be count.
pub async fn run_clean(config: &Config, all_plans: bool, apply: bool) -> Result<CleanOutcome> {
    let scope = if all_plans {
        CleanScope::AllPlans
    } else {
        CleanScope::Plan(effective_plan_id(config)?)
    };

    let provider = build_provider(config, false)?;
    provider.setup().await.context("provider setup failed")?;
    let outcome = CleanPlanner::new(&config.label, scope, !apply)
        .run(provider.clone())
        .await;
    teardown_quietly(provider.as_ref()).await;
    Ok(outcome?)
}

/// The plan id clean and map-sync operate on: the recorded one when a
/// sync map exists, otherwise the hash of the current plan files.
fn effective_plan_id(config: &Config) -> Result<String> {
    if let Some(map) = read_sync_map(&config.sync_path)? {
        if !map.plan_id.is_empty() {
            return Ok(map.plan_id);
        }
    }
    let plan = planpilot_core::build_plan(&config.plan_source(), config.validation_mode)?;
    Ok(plan.plan_id)
}

/// Exit-code categories for front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed config, unreadable plan files, failed validation.
    ConfigOrValidation,
    /// Credentials, capabilities, target or board resolution.
    ProviderSetup,
    /// Anything that failed during phases 2-4 or the planners.
    SyncExecution,
}

impl ErrorCategory {
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorCategory::ConfigOrValidation => 2,
            ErrorCategory::ProviderSetup => 3,
            ErrorCategory::SyncExecution => 4,
        }
    }
}

pub fn classify(err: &anyhow::Error) -> ErrorCategory {
    if err.downcast_ref::<ConfigError>().is_some()
        || err.downcast_ref::<PlanLoadError>().is_some()
        || err.downcast_ref::<PlanValidationError>().is_some()
        || err.downcast_ref::<PlanError>().is_some()
    {
        return ErrorCategory::ConfigOrValidation;
    }
    if let Some(provider_err) = err.downcast_ref::<ProviderError>() {
        return classify_provider(provider_err);
    }
    if let Some(sync_err) = err.downcast_ref::<SyncError>() {
        return match sync_err {
            SyncError::Provider(provider_err) => classify_provider(provider_err),
            _ => ErrorCategory::SyncExecution,
        };
    }
    ErrorCategory::SyncExecution
}

fn classify_provider(err: &ProviderError) -> ErrorCategory {
    match err {
        ProviderError::Authentication(_)
        | ProviderError::MissingCapability { .. }
        | ProviderError::ProjectUrl(_) => ErrorCategory::ProviderSetup,
        _ => ErrorCategory::SyncExecution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_matches_the_exit_table() {
        let config_err: anyhow::Error =
            ConfigError::Invalid("bad".to_string()).into();
        assert_eq!(classify(&config_err), ErrorCategory::ConfigOrValidation);

        let validation_err: anyhow::Error = PlanValidationError {
            errors: vec!["x".to_string()],
        }
        .into();
        assert_eq!(classify(&validation_err), ErrorCategory::ConfigOrValidation);

        let auth_err: anyhow::Error =
            ProviderError::Authentication("no token".to_string()).into();
        assert_eq!(classify(&auth_err), ErrorCategory::ProviderSetup);

        let capability_err: anyhow::Error = SyncError::Provider(
            ProviderError::missing_capability("supports_parent_relation"),
        )
        .into();
        assert_eq!(classify(&capability_err), ErrorCategory::ProviderSetup);

        let api_err: anyhow::Error = SyncError::Provider(ProviderError::api("boom")).into();
        assert_eq!(classify(&api_err), ErrorCategory::SyncExecution);

        let cancelled: anyhow::Error = SyncError::Cancelled.into();
        assert_eq!(classify(&cancelled), ErrorCategory::SyncExecution);
    }

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [
            ErrorCategory::ConfigOrValidation.exit_code(),
            ErrorCategory::ProviderSetup.exit_code(),
            ErrorCategory::SyncExecution.exit_code(),
        ];
        assert_eq!(codes, [2, 3, 4]);
    }
}
