//! Project board URL parsing
//!
//! Boards live at `https://github.com/orgs/{owner}/projects/{number}` or
//! `https://github.com/users/{owner}/projects/{number}`. Anything else is
//! a `ProviderError::ProjectUrl`.

use planpilot_api::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardOwnerKind {
    Organization,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardRef {
    pub kind: BoardOwnerKind,
    pub owner: String,
    pub number: i64,
}

pub fn parse_board_url(url: &str) -> Result<BoardRef, ProviderError> {
    let invalid = || ProviderError::ProjectUrl(url.to_string());

    let rest = url
        .strip_prefix("https://github.com/")
        .or_else(|| url.strip_prefix("http://github.com/"))
        .ok_or_else(invalid)?;

    let mut parts = rest.trim_end_matches('/').split('/');
    let kind = match parts.next() {
        Some("orgs") => BoardOwnerKind::Organization,
        Some("users") => BoardOwnerKind::User,
        _ => return Err(invalid()),
    };
    let owner = parts.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
    if parts.next() != Some("projects") {
        return Err(invalid());
    }
    let number = parts
        .next()
        .and_then(|n| n.parse::<i64>().ok())
        .filter(|n| *n > 0)
        .ok_or_else(invalid)?;
    if parts.next().is_some() {
        return Err(invalid());
    }

    Ok(BoardRef {
        kind,
        owner: owner.to_string(),
        number,
    })
}

/// Split an `owner/repo` target string.
pub fn parse_target(target: &str) -> Result<(String, String), ProviderError> {
    match target.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(ProviderError::api(format!(
            "invalid target {target:?}: expected owner/repo"
        ))),
    }
}
