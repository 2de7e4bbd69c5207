//! GitHub adapter for planpilot
//!
//! Reference implementation of the provider contract:
//!
//! - `auth` - token resolution (gh CLI, environment, inline)
//! - `board` - project board URL and target parsing
//! - `client` - GraphQL transport with retry and error classification
//! - `queries` - GraphQL documents
//! - `models` - typed response payloads
//! - `provider` - the `Provider` implementation

pub mod auth;
pub mod board;
pub mod client;
pub mod models;
pub mod provider;
pub mod queries;

pub use auth::{resolve_token, AuthStrategy, TOKEN_ENV_VAR};
pub use board::{parse_board_url, parse_target, BoardOwnerKind, BoardRef};
pub use client::GithubClient;
pub use provider::{GithubProvider, GithubSettings};
