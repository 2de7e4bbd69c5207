//! Config file loading
//!
//! One JSON object describes a sync target: which provider, which repo
//! and board, how to authenticate, where the plan files live, and the
//! board field mapping. All paths are resolved against the config file's
//! directory at load time, and cross-field rules are checked before
//! anything else runs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use planpilot_api::{ConfigError, FieldConfig};
use planpilot_core::plan::{PlanSource, ValidationMode};
use planpilot_core::{DEFAULT_LABEL, DEFAULT_MAX_CONCURRENT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthKind {
    GhCli,
    Env,
    Token,
}

/// Plan file locations, before path resolution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanPaths {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epics: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stories: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unified: Option<PathBuf>,
}

impl PlanPaths {
    fn has_typed(&self) -> bool {
        self.epics.is_some() || self.stories.is_some() || self.tasks.is_some()
    }
}

fn default_label() -> String {
    DEFAULT_LABEL.to_string()
}

fn default_max_concurrent() -> usize {
    DEFAULT_MAX_CONCURRENT
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub provider: String,
    pub target: String,
    pub auth: AuthKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub board_url: String,
    pub plan_paths: PlanPaths,
    #[serde(default)]
    pub validation_mode: ValidationMode,
    pub sync_path: PathBuf,
    #[serde(default = "default_label")]
    pub label: String,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    #[serde(default)]
    pub field_config: FieldConfig,
}

impl Config {
    /// Read, validate, and resolve a config file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        config.validate()?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_paths(base);
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self.auth {
            AuthKind::Token => {
                if self.token.as_deref().map_or(true, |t| t.trim().is_empty()) {
                    return Err(ConfigError::Invalid(
                        "auth is \"token\" but no token was provided".to_string(),
                    ));
                }
            }
            _ => {
                if self.token.is_some() {
                    return Err(ConfigError::Invalid(
                        "token is only allowed when auth is \"token\"".to_string(),
                    ));
                }
            }
        }

        match (self.plan_paths.unified.is_some(), self.plan_paths.has_typed()) {
            (true, true) => {
                return Err(ConfigError::Invalid(
                    "plan_paths.unified and typed plan paths are mutually exclusive".to_string(),
                ))
            }
            (false, false) => {
                return Err(ConfigError::Invalid(
                    "plan_paths must name a unified file or at least one typed file".to_string(),
                ))
            }
            _ => {}
        }

        if self.max_concurrent == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrent must be at least 1".to_string(),
            ));
        }
        if self.label.trim().is_empty() {
            return Err(ConfigError::Invalid("label must not be empty".to_string()));
        }
        Ok(())
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        if let Some(p) = self.plan_paths.epics.as_mut() {
            resolve(p);
        }
        if let Some(p) = self.plan_paths.stories.as_mut() {
            resolve(p);
        }
        if let Some(p) = self.plan_paths.tasks.as_mut() {
            resolve(p);
        }
        if let Some(p) = self.plan_paths.unified.as_mut() {
            resolve(p);
        }
        resolve(&mut self.sync_path);
    }

    /// Plan source for the loader.
    pub fn plan_source(&self) -> PlanSource {
        match &self.plan_paths.unified {
            Some(unified) => PlanSource::Unified(unified.clone()),
            None => PlanSource::Typed {
                epics: self.plan_paths.epics.clone(),
                stories: self.plan_paths.stories.clone(),
                tasks: self.plan_paths.tasks.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("planpilot.json");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    const MINIMAL: &str = r#"{
        "provider": "github",
        "target": "acme/widgets",
        "auth": "gh-cli",
        "board_url": "https://github.com/orgs/acme/projects/7",
        "plan_paths": {"unified": "plan.json"},
        "sync_path": "sync-map.json"
    }"#;

    #[test]
    fn loads_minimal_config_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, MINIMAL);
        let config = Config::load(&path).unwrap();

        assert_eq!(config.label, "planpilot");
        assert_eq!(config.max_concurrent, 5);
        assert_eq!(config.validation_mode, ValidationMode::Strict);
        // Relative paths are resolved against the config directory.
        assert_eq!(config.sync_path, dir.path().join("sync-map.json"));
        assert_eq!(
            config.plan_paths.unified.as_ref().unwrap(),
            &dir.path().join("plan.json")
        );
    }

    #[test]
    fn token_auth_requires_a_token_and_vice_versa() {
        let dir = TempDir::new().unwrap();

        let path = write_config(&dir, &MINIMAL.replace("\"gh-cli\"", "\"token\""));
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let with_stray_token = MINIMAL.replace(
            "\"auth\": \"gh-cli\",",
            "\"auth\": \"env\", \"token\": \"ghp_x\",",
        );
        let path = write_config(&dir, &with_stray_token);
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unified_and_typed_plan_paths_are_mutually_exclusive() {
        let dir = TempDir::new().unwrap();
        let both = MINIMAL.replace(
            r#"{"unified": "plan.json"}"#,
            r#"{"unified": "plan.json", "epics": "epics.json"}"#,
        );
        let path = write_config(&dir, &both);
        assert!(matches!(
            Config::load(&path).unwrap_err(),
            ConfigError::Invalid(_)
        ));

        let neither = MINIMAL.replace(r#"{"unified": "plan.json"}"#, "{}");
        let path = write_config(&dir, &neither);
        assert!(matches!(
            Config::load(&path).unwrap_err(),
            ConfigError::Invalid(_)
        ));
    }

    #[test]
    fn malformed_json_reports_the_path() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "{not json");
        match Config::load(&path).unwrap_err() {
            ConfigError::Parse { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let dir = TempDir::new().unwrap();
        let zero = MINIMAL.replace(
            "\"sync_path\": \"sync-map.json\"",
            "\"sync_path\": \"sync-map.json\", \"max_concurrent\": 0",
        );
        let path = write_config(&dir, &zero);
        assert!(matches!(
            Config::load(&path).unwrap_err(),
            ConfigError::Invalid(_)
        ));
    }
}
