//! GitHub provider
//!
//! Issues are the items, a ProjectV2 board carries the workflow fields,
//! sub-issues model the parent relation, and issue dependencies model
//! blocked-by. `setup` resolves and caches every identifier the run needs
//! (repository, label, issue types, project, field and option ids); the
//! caches are written once and read-only afterwards.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{BTreeSet, HashMap};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use planpilot_api::{
    Capabilities, CreateItemInput, CreateItemPartialFailure, CreateStep, CreateTypeStrategy,
    FieldConfig, ItemSearchFilters, ItemType, Provider, ProviderError, RelationDelta, RemoteItem,
    UpdateItemInput,
};

use crate::auth::{resolve_token, AuthStrategy};
use crate::board::{parse_board_url, parse_target, BoardOwnerKind};
use crate::client::GithubClient;
use crate::models::{
    IssueNode, IssueRelations, NamedNode, Nodes, ProjectData, ProjectFieldNode, ProjectItemNode,
    RepositoryData, SearchPage,
};
use crate::queries;

const SEARCH_PAGE_SIZE: i64 = 50;
const LABEL_COLOR: &str = "1d76db";

#[derive(Debug, Clone)]
pub struct GithubSettings {
    /// `owner/repo`.
    pub target: String,
    pub board_url: String,
    pub label: String,
    pub auth: AuthStrategy,
    pub field_config: FieldConfig,
}

/// A single-select board field with its resolved initial option.
#[derive(Debug, Clone)]
struct InitialField {
    field_id: String,
    option_id: String,
}

/// The size field keeps its whole option table so per-item sizes resolve.
#[derive(Debug, Clone)]
struct SizeField {
    field_id: String,
    options: HashMap<String, String>,
}

#[derive(Debug, Clone)]
struct ProjectContext {
    project_id: String,
    status: Option<InitialField>,
    priority: Option<InitialField>,
    iteration: Option<InitialField>,
    size: Option<SizeField>,
}

#[derive(Debug, Clone)]
struct GithubContext {
    repository_id: String,
    label_id: String,
    /// Lowercased issue type name → node id.
    issue_types: HashMap<String, String>,
    /// Plan type → label id, populated for the label strategy.
    type_label_ids: HashMap<ItemType, String>,
    project: ProjectContext,
    capabilities: Capabilities,
}

pub struct GithubProvider {
    settings: GithubSettings,
    client: OnceCell<GithubClient>,
    context: OnceCell<GithubContext>,
}

impl GithubProvider {
    pub fn new(settings: GithubSettings) -> Self {
        Self {
            settings,
            client: OnceCell::new(),
            context: OnceCell::new(),
        }
    }

    fn client(&self) -> Result<&GithubClient, ProviderError> {
        self.client
            .get()
            .ok_or_else(|| ProviderError::api("provider used before setup"))
    }

    fn context(&self) -> Result<&GithubContext, ProviderError> {
        self.context
            .get()
            .ok_or_else(|| ProviderError::api("provider used before setup"))
    }

    async fn ensure_label(&self, repository_id: &str, name: &str) -> Result<String, ProviderError> {
        let (owner, repo) = parse_target(&self.settings.target)?;
        let data = self
            .client()?
            .graphql(
                queries::REPOSITORY_LABEL,
                json!({"owner": owner, "name": repo, "label": name}),
            )
            .await?;
        if let Some(label) = data.pointer("/repository/label").filter(|v| !v.is_null()) {
            let label: NamedNode = decode(label.clone())?;
            return Ok(label.id);
        }

        info!("[GithubProvider] Creating label {name}");
        let data = self
            .client()?
            .graphql(
                queries::CREATE_LABEL,
                json!({"repositoryId": repository_id, "name": name, "color": LABEL_COLOR}),
            )
            .await?;
        let label: NamedNode = decode_at(&data, "/createLabel/label")?;
        Ok(label.id)
    }

    async fn resolve_project(&self) -> Result<ProjectContext, ProviderError> {
        let board = parse_board_url(&self.settings.board_url)?;
        let (document, root) = match board.kind {
            BoardOwnerKind::Organization => (queries::ORG_PROJECT, "/organization/projectV2"),
            BoardOwnerKind::User => (queries::USER_PROJECT, "/user/projectV2"),
        };
        let data = self
            .client()?
            .graphql(document, json!({"owner": board.owner, "number": board.number}))
            .await?;
        let project: ProjectData = data
            .pointer(root)
            .filter(|v| !v.is_null())
            .cloned()
            .map(decode)
            .transpose()?
            .ok_or_else(|| {
                ProviderError::ProjectUrl(format!(
                    "{}: project {} not found",
                    self.settings.board_url, board.number
                ))
            })?;
        debug!("[GithubProvider] Resolved board {:?}", project.title);

        let data = self
            .client()?
            .graphql(queries::PROJECT_FIELDS, json!({"projectId": project.id}))
            .await?;
        let fields: Nodes<ProjectFieldNode> = decode_at(&data, "/node/fields")?;

        let config = &self.settings.field_config;
        let single_select = |field_name: &str, option_name: &Option<String>| {
            option_name
                .as_ref()
                .map(|option| resolve_single_select(&fields.nodes, field_name, option))
        };

        Ok(ProjectContext {
            project_id: project.id,
            status: single_select("Status", &config.status).transpose()?,
            priority: single_select("Priority", &config.priority).transpose()?,
            iteration: config
                .iteration
                .as_ref()
                .map(|name| resolve_iteration(&fields.nodes, name))
                .transpose()?,
            size: config
                .size_field
                .as_ref()
                .map(|field_name| resolve_size_field(&fields.nodes, field_name))
                .transpose()?,
        })
    }

    /// Board item id for an issue, adding the issue to the board when a
    /// previous partial create never got there.
    async fn project_item_id(&self, issue_id: &str) -> Result<String, ProviderError> {
        let ctx = self.context()?;
        let data = self
            .client()?
            .graphql(queries::ISSUE_PROJECT_ITEMS, json!({"id": issue_id}))
            .await?;
        let items: Nodes<ProjectItemNode> = decode_at(&data, "/node/projectItems")?;
        if let Some(item) = items
            .nodes
            .into_iter()
            .find(|item| item.project.id == ctx.project.project_id)
        {
            return Ok(item.id);
        }

        let data = self
            .client()?
            .graphql(
                queries::ADD_TO_PROJECT,
                json!({"projectId": ctx.project.project_id, "contentId": issue_id}),
            )
            .await?;
        let item: ProjectItemNode = decode_at(&data, "/addProjectV2ItemById/item")?;
        Ok(item.id)
    }

    async fn set_single_select(
        &self,
        item_id: &str,
        field: &InitialField,
    ) -> Result<(), ProviderError> {
        let ctx = self.context()?;
        self.client()?
            .graphql(
                queries::SET_SINGLE_SELECT_FIELD,
                json!({
                    "projectId": ctx.project.project_id,
                    "itemId": item_id,
                    "fieldId": field.field_id,
                    "optionId": field.option_id,
                }),
            )
            .await?;
        Ok(())
    }

    async fn set_iteration(&self, item_id: &str, field: &InitialField) -> Result<(), ProviderError> {
        let ctx = self.context()?;
        self.client()?
            .graphql(
                queries::SET_ITERATION_FIELD,
                json!({
                    "projectId": ctx.project.project_id,
                    "itemId": item_id,
                    "fieldId": field.field_id,
                    "iterationId": field.option_id,
                }),
            )
            .await?;
        Ok(())
    }

    async fn set_size(&self, item_id: &str, tshirt: &str) -> Result<(), ProviderError> {
        let ctx = self.context()?;
        let Some(size) = &ctx.project.size else {
            return Ok(());
        };
        let Some(option_name) = self.settings.field_config.size_option(tshirt) else {
            debug!("[GithubProvider] No size mapping for t-shirt {tshirt}; skipping");
            return Ok(());
        };
        let Some(option_id) = size.options.get(option_name) else {
            return Err(ProviderError::api(format!(
                "size field has no option named {option_name:?}"
            )));
        };
        self.set_single_select(
            item_id,
            &InitialField {
                field_id: size.field_id.clone(),
                option_id: option_id.clone(),
            },
        )
        .await
    }

    /// Issue type node id for a plan type, per the create-type strategy.
    fn issue_type_id(&self, item_type: ItemType) -> Result<Option<String>, ProviderError> {
        let ctx = self.context()?;
        if self.settings.field_config.create_type_strategy != CreateTypeStrategy::IssueType {
            return Ok(None);
        }
        let Some(name) = type_name(&self.settings.field_config, item_type) else {
            return Ok(None);
        };
        Ok(ctx.issue_types.get(&name.to_lowercase()).cloned())
    }

    /// Labels attached at create time: the sync label plus, under the
    /// label strategy, the type label.
    fn create_label_ids(&self, item_type: Option<ItemType>) -> Result<Vec<String>, ProviderError> {
        let ctx = self.context()?;
        let mut ids = vec![ctx.label_id.clone()];
        if self.settings.field_config.create_type_strategy == CreateTypeStrategy::Label {
            if let Some(type_label) = item_type.and_then(|t| ctx.type_label_ids.get(&t)) {
                ids.push(type_label.clone());
            }
        }
        Ok(ids)
    }

    fn remote_from_issue(&self, issue: IssueNode) -> RemoteItem {
        RemoteItem {
            id: issue.id,
            key: format!("#{}", issue.number),
            url: issue.url,
            title: issue.title,
            body: issue.body,
            item_type: issue
                .issue_type
                .and_then(|t| reverse_type_name(&self.settings.field_config, &t.name)),
        }
    }
}

#[async_trait]
impl Provider for GithubProvider {
    fn name(&self) -> &str {
        "github"
    }

    #[tracing::instrument(name = "provider.github.setup", skip(self))]
    async fn setup(&self) -> Result<Capabilities, ProviderError> {
        let token = resolve_token(&self.settings.auth).await?;
        let client = GithubClient::new(&token)?;
        self.client
            .set(client)
            .map_err(|_| ProviderError::api("setup called twice"))?;

        // Auth check first: a bad token should fail with a clear error.
        let data = self.client()?.graphql(queries::VIEWER, json!({})).await?;
        let login = data
            .pointer("/viewer/login")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        debug!("[GithubProvider] Authenticated as {login}");

        let (owner, repo) = parse_target(&self.settings.target)?;
        let data = self
            .client()?
            .graphql(queries::REPOSITORY, json!({"owner": owner, "name": repo}))
            .await?;
        let repository: RepositoryData = data
            .pointer("/repository")
            .filter(|v| !v.is_null())
            .cloned()
            .map(decode)
            .transpose()?
            .ok_or_else(|| {
                ProviderError::api(format!("repository {} not found", self.settings.target))
            })?;

        let issue_types: HashMap<String, String> = repository
            .issue_types
            .as_ref()
            .map(|types| {
                types
                    .nodes
                    .iter()
                    .map(|t| (t.name.to_lowercase(), t.id.clone()))
                    .collect()
            })
            .unwrap_or_default();

        let label_id = self
            .ensure_label(&repository.id, &self.settings.label)
            .await?;

        let mut type_label_ids = HashMap::new();
        if self.settings.field_config.create_type_strategy == CreateTypeStrategy::Label {
            for item_type in ItemType::LEVELS {
                if let Some(name) = type_name(&self.settings.field_config, item_type) {
                    let id = self.ensure_label(&repository.id, &name).await?;
                    type_label_ids.insert(item_type, id);
                }
            }
        }

        let project = self.resolve_project().await?;

        let capabilities = Capabilities {
            discovery_by_body_contains: true,
            supports_parent_relation: true,
            supports_dependency_relation: true,
            supports_issue_types: !issue_types.is_empty(),
        };

        info!(
            "[GithubProvider] Set up for {} ({} issue type(s))",
            repository.name_with_owner,
            issue_types.len()
        );

        self.context
            .set(GithubContext {
                repository_id: repository.id,
                label_id,
                issue_types,
                type_label_ids,
                project,
                capabilities,
            })
            .map_err(|_| ProviderError::api("setup called twice"))?;

        Ok(capabilities)
    }

    async fn teardown(&self) -> Result<(), ProviderError> {
        // Nothing held beyond the HTTP client; connections close on drop.
        Ok(())
    }

    fn capabilities(&self) -> Capabilities {
        self.context
            .get()
            .map(|ctx| ctx.capabilities)
            .unwrap_or_default()
    }

    async fn search_items(
        &self,
        filters: &ItemSearchFilters,
    ) -> Result<Vec<RemoteItem>, ProviderError> {
        let query = build_search_query(&self.settings.target, filters);
        let mut items = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let data = self
                .client()?
                .graphql(
                    queries::SEARCH_ISSUES,
                    json!({"query": query.as_str(), "first": SEARCH_PAGE_SIZE, "after": after}),
                )
                .await?;
            let page: SearchPage = decode_at(&data, "/search")?;
            for node in page.nodes {
                // Skip search hits that are not issues.
                if let Ok(issue) = serde_json::from_value::<IssueNode>(node) {
                    items.push(self.remote_from_issue(issue));
                }
            }
            if !page.page_info.has_next_page {
                break;
            }
            after = page.page_info.end_cursor;
            if after.is_none() {
                return Err(ProviderError::api(
                    "search reported another page but no cursor",
                ));
            }
        }

        debug!("[GithubProvider] Search returned {} issue(s)", items.len());
        Ok(items)
    }

    async fn create_item(&self, input: CreateItemInput) -> Result<RemoteItem, ProviderError> {
        let ctx = self.context()?;
        let label_ids = self.create_label_ids(input.item_type)?;

        let data = self
            .client()?
            .graphql(
                queries::CREATE_ISSUE,
                json!({
                    "repositoryId": ctx.repository_id,
                    "title": input.title,
                    "body": input.body,
                    "labelIds": label_ids,
                }),
            )
            .await?;
        let issue: IssueNode = decode_at(&data, "/createIssue/issue")?;
        let mut completed = vec![CreateStep::CreateIssue];
        info!("[GithubProvider] Created issue #{}", issue.number);

        let partial = |completed: &[CreateStep], err: ProviderError| {
            ProviderError::PartialCreate(CreateItemPartialFailure {
                created_item_id: Some(issue.id.clone()),
                created_item_key: Some(format!("#{}", issue.number)),
                created_item_url: Some(issue.url.clone()),
                completed_steps: completed.to_vec(),
                retryable: matches!(err, ProviderError::Api { retryable: true, .. }),
                message: err.to_string(),
            })
        };

        if let Some(type_id) = input
            .item_type
            .map(|t| self.issue_type_id(t))
            .transpose()?
            .flatten()
        {
            self.client()?
                .graphql(
                    queries::UPDATE_ISSUE_TYPE,
                    json!({"issueId": issue.id, "issueTypeId": type_id}),
                )
                .await
                .map_err(|e| partial(&completed, e))?;
        }
        completed.push(CreateStep::SetIssueType);

        let item_id = self
            .project_item_id(&issue.id)
            .await
            .map_err(|e| partial(&completed, e))?;
        completed.push(CreateStep::AddToBoard);

        // Initial workflow state only: these fields are never written
        // again after creation.
        let set_fields = async {
            if let Some(status) = &ctx.project.status {
                self.set_single_select(&item_id, status).await?;
            }
            if let Some(priority) = &ctx.project.priority {
                self.set_single_select(&item_id, priority).await?;
            }
            if let Some(iteration) = &ctx.project.iteration {
                self.set_iteration(&item_id, iteration).await?;
            }
            if let Some(tshirt) = &input.size {
                self.set_size(&item_id, tshirt).await?;
            }
            Ok::<(), ProviderError>(())
        };
        set_fields.await.map_err(|e| partial(&completed, e))?;
        completed.push(CreateStep::SetFields);

        // The mutation response carries the stored body; only the type is
        // worth overriding, since it was set after the create.
        let mut remote = self.remote_from_issue(issue);
        remote.item_type = input.item_type;
        Ok(remote)
    }

    async fn update_item(
        &self,
        id: &str,
        input: UpdateItemInput,
    ) -> Result<RemoteItem, ProviderError> {
        let ctx = self.context()?;

        if input.title.is_some() || input.body.is_some() {
            self.client()?
                .graphql(
                    queries::UPDATE_ISSUE,
                    json!({"id": id, "title": input.title, "body": input.body}),
                )
                .await?;
        }

        if let Some(type_id) = input
            .item_type
            .map(|t| self.issue_type_id(t))
            .transpose()?
            .flatten()
        {
            self.client()?
                .graphql(
                    queries::UPDATE_ISSUE_TYPE,
                    json!({"issueId": id, "issueTypeId": type_id}),
                )
                .await?;
        }

        // addLabelsToLabelable is additive by construction, which is the
        // contract: labels added out-of-band must survive.
        if !input.labels.is_empty() {
            let mut label_ids = BTreeSet::new();
            for label in &input.labels {
                if label == &self.settings.label {
                    label_ids.insert(ctx.label_id.clone());
                } else {
                    label_ids.insert(self.ensure_label(&ctx.repository_id, label).await?);
                }
            }
            self.client()?
                .graphql(
                    queries::ADD_LABELS,
                    json!({"labelableId": id, "labelIds": label_ids.into_iter().collect::<Vec<_>>()}),
                )
                .await?;
        }

        if let Some(tshirt) = &input.size {
            let item_id = self.project_item_id(id).await?;
            self.set_size(&item_id, tshirt).await?;
        }

        self.get_item(id).await
    }

    async fn get_item(&self, id: &str) -> Result<RemoteItem, ProviderError> {
        let data = self
            .client()?
            .graphql(queries::GET_ISSUE, json!({"id": id}))
            .await?;
        let issue: IssueNode = data
            .pointer("/node")
            .filter(|v| !v.is_null())
            .cloned()
            .map(decode)
            .transpose()?
            .ok_or_else(|| ProviderError::NotFound(id.to_string()))?;
        Ok(self.remote_from_issue(issue))
    }

    async fn delete_item(&self, id: &str) -> Result<(), ProviderError> {
        self.client()?
            .graphql(queries::DELETE_ISSUE, json!({"issueId": id}))
            .await?;
        info!("[GithubProvider] Deleted issue {id}");
        Ok(())
    }

    async fn reconcile_relations(
        &self,
        item: &RemoteItem,
        parent: Option<&RemoteItem>,
        blockers: &[RemoteItem],
    ) -> Result<RelationDelta, ProviderError> {
        let data = self
            .client()?
            .graphql(queries::ISSUE_RELATIONS, json!({"id": item.id}))
            .await?;
        let current: IssueRelations = data
            .pointer("/node")
            .filter(|v| !v.is_null())
            .cloned()
            .map(decode)
            .transpose()?
            .ok_or_else(|| ProviderError::NotFound(item.id.clone()))?;

        let mut delta = RelationDelta::default();

        let current_parent = current.parent.map(|p| p.id);
        let desired_parent = parent.map(|p| p.id.clone());
        if current_parent != desired_parent {
            if let Some(old) = &current_parent {
                self.client()?
                    .graphql(
                        queries::REMOVE_SUB_ISSUE,
                        json!({"issueId": old, "subIssueId": item.id}),
                    )
                    .await?;
                delta.removed += 1;
            }
            if let Some(new) = &desired_parent {
                self.client()?
                    .graphql(
                        queries::ADD_SUB_ISSUE,
                        json!({"issueId": new, "subIssueId": item.id}),
                    )
                    .await?;
                delta.added += 1;
            }
        }

        let current_blockers: BTreeSet<String> = current
            .blocked_by
            .map(|nodes| nodes.nodes.into_iter().map(|n| n.id).collect())
            .unwrap_or_default();
        let desired_blockers: BTreeSet<String> =
            blockers.iter().map(|b| b.id.clone()).collect();

        for blocker in desired_blockers.difference(&current_blockers) {
            self.client()?
                .graphql(
                    queries::ADD_ISSUE_DEPENDENCY,
                    json!({"issueId": item.id, "blockedById": blocker}),
                )
                .await?;
            delta.added += 1;
        }
        for stale in current_blockers.difference(&desired_blockers) {
            self.client()?
                .graphql(
                    queries::REMOVE_ISSUE_DEPENDENCY,
                    json!({"issueId": item.id, "blockedById": stale}),
                )
                .await?;
            delta.removed += 1;
        }

        if !delta.is_noop() {
            debug!(
                "[GithubProvider] {}: relations converged (+{} -{})",
                item.key, delta.added, delta.removed
            );
        }
        Ok(delta)
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, ProviderError> {
    serde_json::from_value(value)
        .map_err(|e| ProviderError::api(format!("unexpected GraphQL payload shape: {e}")))
}

fn decode_at<T: serde::de::DeserializeOwned>(data: &Value, path: &str) -> Result<T, ProviderError> {
    data.pointer(path)
        .cloned()
        .ok_or_else(|| ProviderError::api(format!("GraphQL payload missing {path}")))
        .and_then(decode)
}

/// Search query covering label and body-substring filters, scoped to the
/// target repository.
fn build_search_query(target: &str, filters: &ItemSearchFilters) -> String {
    let mut parts = vec![format!("repo:{target}"), "is:issue".to_string()];
    for label in &filters.labels {
        parts.push(format!("label:\"{label}\""));
    }
    if let Some(needle) = &filters.body_contains {
        parts.push(format!("\"{needle}\" in:body"));
    }
    parts.join(" ")
}

/// Provider-side name for a plan type, from the map or the type itself.
fn type_name(config: &FieldConfig, item_type: ItemType) -> Option<String> {
    if config.create_type_strategy == CreateTypeStrategy::None {
        return None;
    }
    Some(
        config
            .create_type_map
            .get(item_type.as_str())
            .cloned()
            .unwrap_or_else(|| item_type.as_str().to_string()),
    )
}

/// Inverse of `type_name`, for issues read back from the API.
fn reverse_type_name(config: &FieldConfig, provider_name: &str) -> Option<ItemType> {
    for item_type in ItemType::LEVELS {
        if let Some(mapped) = config.create_type_map.get(item_type.as_str()) {
            if mapped.eq_ignore_ascii_case(provider_name) {
                return Some(item_type);
            }
        }
    }
    ItemType::parse(&provider_name.to_uppercase())
}

fn field_id(field: &ProjectFieldNode, field_name: &str) -> Result<String, ProviderError> {
    field
        .id
        .clone()
        .ok_or_else(|| ProviderError::api(format!("field {field_name:?} carries no id")))
}

fn resolve_single_select(
    fields: &[ProjectFieldNode],
    field_name: &str,
    option_name: &str,
) -> Result<InitialField, ProviderError> {
    let field = fields
        .iter()
        .find(|f| f.name.as_deref() == Some(field_name))
        .ok_or_else(|| ProviderError::api(format!("board has no field named {field_name:?}")))?;
    let option = field
        .options
        .as_ref()
        .and_then(|options| options.iter().find(|o| o.name == option_name))
        .ok_or_else(|| {
            ProviderError::api(format!(
                "field {field_name:?} has no option named {option_name:?}"
            ))
        })?;
    Ok(InitialField {
        field_id: field_id(field, field_name)?,
        option_id: option.id.clone(),
    })
}

fn resolve_iteration(
    fields: &[ProjectFieldNode],
    iteration_title: &str,
) -> Result<InitialField, ProviderError> {
    let field = fields
        .iter()
        .find(|f| f.configuration.is_some())
        .ok_or_else(|| ProviderError::api("board has no iteration field"))?;
    let iteration = field
        .configuration
        .as_ref()
        .and_then(|c| c.iterations.iter().find(|i| i.title == iteration_title))
        .ok_or_else(|| {
            ProviderError::api(format!("no iteration named {iteration_title:?}"))
        })?;
    Ok(InitialField {
        field_id: field_id(field, "Iteration")?,
        option_id: iteration.id.clone(),
    })
}

fn resolve_size_field(
    fields: &[ProjectFieldNode],
    field_name: &str,
) -> Result<SizeField, ProviderError> {
    let field = fields
        .iter()
        .find(|f| f.name.as_deref() == Some(field_name))
        .ok_or_else(|| ProviderError::api(format!("board has no field named {field_name:?}")))?;
    let options = field
        .options
        .as_ref()
        .ok_or_else(|| {
            ProviderError::api(format!("field {field_name:?} is not single-select"))
        })?
        .iter()
        .map(|o| (o.name.clone(), o.id.clone()))
        .collect();
    Ok(SizeField {
        field_id: field_id(field, field_name)?,
        options,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn search_query_includes_repo_label_and_body_filter() {
        let filters = ItemSearchFilters {
            labels: ["planpilot".to_string()].into(),
            body_contains: Some("PLAN_ID:abcdef012345".to_string()),
        };
        assert_eq!(
            build_search_query("acme/widgets", &filters),
            "repo:acme/widgets is:issue label:\"planpilot\" \"PLAN_ID:abcdef012345\" in:body"
        );
    }

    #[test]
    fn type_names_fall_back_to_the_plan_type() {
        let mut config = FieldConfig::default();
        assert_eq!(type_name(&config, ItemType::Epic).as_deref(), Some("EPIC"));

        config
            .create_type_map
            .insert("EPIC".to_string(), "Epic".to_string());
        assert_eq!(type_name(&config, ItemType::Epic).as_deref(), Some("Epic"));

        config.create_type_strategy = CreateTypeStrategy::None;
        assert_eq!(type_name(&config, ItemType::Epic), None);
    }

    #[test]
    fn reverse_type_name_uses_map_then_plain_parse() {
        let mut config = FieldConfig::default();
        config
            .create_type_map
            .insert("STORY".to_string(), "User Story".to_string());
        assert_eq!(
            reverse_type_name(&config, "User Story"),
            Some(ItemType::Story)
        );
        assert_eq!(reverse_type_name(&config, "task"), Some(ItemType::Task));
        assert_eq!(reverse_type_name(&config, "Bug"), None);
    }

    #[test]
    fn field_resolution_finds_ids_and_reports_misses() {
        let fields: Nodes<ProjectFieldNode> = serde_json::from_value(json!({
            "nodes": [
                {},
                {"id": "F_status", "name": "Status", "dataType": "SINGLE_SELECT",
                 "options": [{"id": "O_todo", "name": "Todo"}, {"id": "O_done", "name": "Done"}]},
                {"id": "F_iter", "name": "Iteration", "dataType": "ITERATION",
                 "configuration": {"iterations": [{"id": "IT_1", "title": "Sprint 1"}]}}
            ]
        }))
        .unwrap();

        let status = resolve_single_select(&fields.nodes, "Status", "Todo").unwrap();
        assert_eq!(status.field_id, "F_status");
        assert_eq!(status.option_id, "O_todo");

        let iteration = resolve_iteration(&fields.nodes, "Sprint 1").unwrap();
        assert_eq!(iteration.option_id, "IT_1");

        assert!(resolve_single_select(&fields.nodes, "Status", "Missing").is_err());
        assert!(resolve_single_select(&fields.nodes, "Nope", "Todo").is_err());
        assert!(resolve_iteration(&fields.nodes, "Sprint 99").is_err());
    }

    #[test]
    fn size_field_keeps_its_option_table() {
        let fields: Nodes<ProjectFieldNode> = serde_json::from_value(json!({
            "nodes": [
                {"id": "F_size", "name": "Size", "dataType": "SINGLE_SELECT",
                 "options": [{"id": "O_s", "name": "Small"}, {"id": "O_l", "name": "Large"}]}
            ]
        }))
        .unwrap();
        let size = resolve_size_field(&fields.nodes, "Size").unwrap();
        assert_eq!(size.options["Small"], "O_s");
        assert_eq!(size.options["Large"], "O_l");
    }
}
