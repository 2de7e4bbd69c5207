//! GitHub GraphQL transport
//!
//! One client, one endpoint. Every call posts a document plus variables,
//! unwraps the `{data, errors}` envelope, classifies GraphQL errors, and
//! retries retryable failures with a short backoff. Rate limiting and
//! retries live here so the engine never sees them.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, warn};

use planpilot_api::ProviderError;

const GRAPHQL_URL: &str = "https://api.github.com/graphql";
const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE_MS: u64 = 500;

#[derive(Debug)]
pub struct GithubClient {
    client: reqwest::Client,
    default_headers: HeaderMap,
}

impl GithubClient {
    pub fn new(token: &str) -> Result<Self, ProviderError> {
        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {token}");
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&bearer)
                .map_err(|_| ProviderError::Authentication("token contains invalid characters".to_string()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("planpilot"));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ProviderError::api(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            default_headers: headers,
        })
    }

    /// Execute one GraphQL document and return its `data` payload.
    pub async fn graphql(&self, document: &str, variables: Value) -> Result<Value, ProviderError> {
        let body = serde_json::json!({
            "query": document,
            "variables": variables,
        });

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.execute_once(&body).await {
                Ok(data) => return Ok(data),
                Err(err) => {
                    let retryable = matches!(&err, ProviderError::Api { retryable: true, .. });
                    if !retryable || attempt >= MAX_ATTEMPTS {
                        return Err(err);
                    }
                    let backoff = Duration::from_millis(BACKOFF_BASE_MS * u64::from(attempt));
                    warn!(
                        "[GithubClient] Attempt {attempt} failed ({err}); retrying in {:?}",
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    async fn execute_once(&self, body: &Value) -> Result<Value, ProviderError> {
        let response = self
            .client
            .post(GRAPHQL_URL)
            .headers(self.default_headers.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                let message = format_request_error(&e);
                error!("[GithubClient] Request failed: {message}");
                // Network-level failures are worth one more try.
                ProviderError::retryable(message)
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::api(format!("failed to read response body: {e}")))?;

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProviderError::Authentication(
                "GitHub rejected the token (HTTP 401)".to_string(),
            ));
        }
        if !status.is_success() {
            let truncated: String = text.chars().take(500).collect();
            let message = format!("HTTP {} from GraphQL endpoint: {truncated}", status.as_u16());
            return if status.is_server_error() || status.as_u16() == 429 {
                Err(ProviderError::retryable(message))
            } else {
                Err(ProviderError::api(message))
            };
        }

        let envelope: Value = serde_json::from_str(&text)
            .map_err(|e| ProviderError::api(format!("malformed GraphQL response: {e}")))?;

        if let Some(errors) = envelope.get("errors").and_then(Value::as_array) {
            if !errors.is_empty() {
                return Err(classify_graphql_errors(errors));
            }
        }

        debug!("[GithubClient] GraphQL call succeeded ({} bytes)", text.len());
        envelope
            .get("data")
            .cloned()
            .filter(|data| !data.is_null())
            .ok_or_else(|| ProviderError::api("GraphQL response carried no data"))
    }
}

fn format_request_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "request timed out; check network connectivity".to_string()
    } else if e.is_connect() {
        format!("connection error; check network, DNS, and proxy settings: {e}")
    } else {
        format!("request error: {e}")
    }
}

/// Map GraphQL error entries to a single `ProviderError`. Rate limits are
/// retryable; NOT_FOUND becomes `NotFound`; everything else is terminal.
fn classify_graphql_errors(errors: &[Value]) -> ProviderError {
    let messages: Vec<String> = errors
        .iter()
        .map(|e| {
            e.get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown GraphQL error")
                .to_string()
        })
        .collect();
    let joined = messages.join("; ");

    let error_type = |t: &str| {
        errors
            .iter()
            .any(|e| e.get("type").and_then(Value::as_str) == Some(t))
    };

    if error_type("RATE_LIMITED") {
        ProviderError::retryable(format!("rate limited: {joined}"))
    } else if error_type("NOT_FOUND") {
        ProviderError::NotFound(joined)
    } else if error_type("FORBIDDEN") {
        ProviderError::Authentication(format!("forbidden: {joined}"))
    } else {
        ProviderError::api(joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_carries_bearer_and_user_agent() {
        let client = GithubClient::new("ghp_testtoken").unwrap();
        assert_eq!(
            client.default_headers.get(AUTHORIZATION).unwrap(),
            "Bearer ghp_testtoken"
        );
        assert_eq!(client.default_headers.get(USER_AGENT).unwrap(), "planpilot");
    }

    #[test]
    fn rejects_tokens_with_invalid_header_characters() {
        let err = GithubClient::new("bad\ntoken").unwrap_err();
        assert!(matches!(err, ProviderError::Authentication(_)));
    }

    #[test]
    fn rate_limited_errors_are_retryable() {
        let errors = vec![json!({"type": "RATE_LIMITED", "message": "API rate limit exceeded"})];
        let err = classify_graphql_errors(&errors);
        assert!(matches!(err, ProviderError::Api { retryable: true, .. }));
    }

    #[test]
    fn not_found_maps_to_not_found() {
        let errors = vec![json!({"type": "NOT_FOUND", "message": "Could not resolve node"})];
        assert!(matches!(
            classify_graphql_errors(&errors),
            ProviderError::NotFound(_)
        ));
    }

    #[test]
    fn plain_errors_join_messages_and_are_terminal() {
        let errors = vec![
            json!({"message": "first"}),
            json!({"message": "second"}),
        ];
        match classify_graphql_errors(&errors) {
            ProviderError::Api { message, retryable } => {
                assert_eq!(message, "first; second");
                assert!(!retryable);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
