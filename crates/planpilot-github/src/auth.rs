//! Token resolution
//!
//! Three strategies: ask the `gh` CLI, read `GITHUB_TOKEN`, or use an
//! inline token from the config. All failures are
//! `ProviderError::Authentication` with enough context to fix the setup.

use planpilot_api::ProviderError;
use tokio::process::Command;

pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

#[derive(Debug, Clone)]
pub enum AuthStrategy {
    /// `gh auth token`.
    GhCli,
    /// `GITHUB_TOKEN` environment variable.
    Env,
    /// Token supplied inline.
    Token(String),
}

pub async fn resolve_token(strategy: &AuthStrategy) -> Result<String, ProviderError> {
    match strategy {
        AuthStrategy::GhCli => {
            let output = Command::new("gh")
                .args(["auth", "token"])
                .output()
                .await
                .map_err(|e| {
                    ProviderError::Authentication(format!("failed to run `gh auth token`: {e}"))
                })?;
            if !output.status.success() {
                return Err(ProviderError::Authentication(format!(
                    "`gh auth token` exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim(),
                )));
            }
            let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if token.is_empty() {
                return Err(ProviderError::Authentication(
                    "`gh auth token` produced no token; run `gh auth login` first".to_string(),
                ));
            }
            Ok(token)
        }
        AuthStrategy::Env => match std::env::var(TOKEN_ENV_VAR) {
            Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err(ProviderError::Authentication(format!(
                "{TOKEN_ENV_VAR} is not set or empty"
            ))),
        },
        AuthStrategy::Token(token) => {
            if token.trim().is_empty() {
                return Err(ProviderError::Authentication(
                    "inline token is empty".to_string(),
                ));
            }
            Ok(token.trim().to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn inline_token_is_trimmed_and_validated() {
        let token = resolve_token(&AuthStrategy::Token("  ghp_abc  ".to_string()))
            .await
            .unwrap();
        assert_eq!(token, "ghp_abc");

        let err = resolve_token(&AuthStrategy::Token("   ".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Authentication(_)));
    }
}
