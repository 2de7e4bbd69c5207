//! Typed views of GraphQL responses
//!
//! Each struct mirrors the shape of one query's `data` payload and is
//! decoded with `serde_json::from_value` at the point of use. Only the
//! fields the provider reads are modeled.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct IdNode {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedNode {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueTypeName {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryData {
    pub id: String,
    #[serde(rename = "nameWithOwner")]
    pub name_with_owner: String,
    #[serde(rename = "issueTypes", default)]
    pub issue_types: Option<Nodes<NamedNode>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Nodes<T> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectData {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectFieldNode {
    // Non-field union members decode as empty objects.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<NamedNode>>,
    #[serde(default)]
    pub configuration: Option<IterationConfiguration>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IterationConfiguration {
    #[serde(default)]
    pub iterations: Vec<IterationNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IterationNode {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueNode {
    pub id: String,
    pub number: i64,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(rename = "issueType", default)]
    pub issue_type: Option<IssueTypeName>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageInfo {
    #[serde(rename = "hasNextPage")]
    pub has_next_page: bool,
    #[serde(rename = "endCursor", default)]
    pub end_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchPage {
    #[serde(rename = "pageInfo")]
    pub page_info: PageInfo,
    // Non-issue search hits decode as empty objects and are filtered out.
    #[serde(default)]
    pub nodes: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueRelations {
    pub id: String,
    #[serde(default)]
    pub parent: Option<IdNode>,
    #[serde(rename = "blockedBy", default)]
    pub blocked_by: Option<Nodes<IdNode>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectItemNode {
    pub id: String,
    pub project: IdNode,
}
