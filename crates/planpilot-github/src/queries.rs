//! GraphQL documents for the GitHub API
//!
//! All transport goes through `GithubClient::graphql` with one of these
//! documents plus a variables object. Kept as raw strings so the
//! request bodies are greppable against the API reference.

pub const VIEWER: &str = r#"
query {
  viewer { login }
}
"#;

pub const REPOSITORY: &str = r#"
query($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) {
    id
    nameWithOwner
    issueTypes(first: 25) {
      nodes { id name }
    }
  }
}
"#;

pub const REPOSITORY_LABEL: &str = r#"
query($owner: String!, $name: String!, $label: String!) {
  repository(owner: $owner, name: $name) {
    label(name: $label) { id name }
  }
}
"#;

pub const CREATE_LABEL: &str = r#"
mutation($repositoryId: ID!, $name: String!, $color: String!) {
  createLabel(input: {repositoryId: $repositoryId, name: $name, color: $color}) {
    label { id name }
  }
}
"#;

pub const ORG_PROJECT: &str = r#"
query($owner: String!, $number: Int!) {
  organization(login: $owner) {
    projectV2(number: $number) { id title }
  }
}
"#;

pub const USER_PROJECT: &str = r#"
query($owner: String!, $number: Int!) {
  user(login: $owner) {
    projectV2(number: $number) { id title }
  }
}
"#;

pub const PROJECT_FIELDS: &str = r#"
query($projectId: ID!) {
  node(id: $projectId) {
    ... on ProjectV2 {
      fields(first: 50) {
        nodes {
          ... on ProjectV2FieldCommon { id name dataType }
          ... on ProjectV2SingleSelectField {
            id
            name
            dataType
            options { id name }
          }
          ... on ProjectV2IterationField {
            id
            name
            dataType
            configuration {
              iterations { id title }
            }
          }
        }
      }
    }
  }
}
"#;

pub const SEARCH_ISSUES: &str = r#"
query($query: String!, $first: Int!, $after: String) {
  search(type: ISSUE, query: $query, first: $first, after: $after) {
    pageInfo { hasNextPage endCursor }
    nodes {
      ... on Issue {
        id
        number
        url
        title
        body
        issueType { name }
      }
    }
  }
}
"#;

pub const GET_ISSUE: &str = r#"
query($id: ID!) {
  node(id: $id) {
    ... on Issue {
      id
      number
      url
      title
      body
      issueType { name }
      labels(first: 50) { nodes { id name } }
    }
  }
}
"#;

pub const ISSUE_RELATIONS: &str = r#"
query($id: ID!) {
  node(id: $id) {
    ... on Issue {
      id
      parent { id }
      blockedBy(first: 50) { nodes { id } }
    }
  }
}
"#;

pub const ISSUE_PROJECT_ITEMS: &str = r#"
query($id: ID!) {
  node(id: $id) {
    ... on Issue {
      projectItems(first: 20) {
        nodes {
          id
          project { id }
        }
      }
    }
  }
}
"#;

pub const CREATE_ISSUE: &str = r#"
mutation($repositoryId: ID!, $title: String!, $body: String!, $labelIds: [ID!]) {
  createIssue(input: {repositoryId: $repositoryId, title: $title, body: $body, labelIds: $labelIds}) {
    issue { id number url title body }
  }
}
"#;

pub const UPDATE_ISSUE: &str = r#"
mutation($id: ID!, $title: String, $body: String) {
  updateIssue(input: {id: $id, title: $title, body: $body}) {
    issue { id number url title body }
  }
}
"#;

pub const UPDATE_ISSUE_TYPE: &str = r#"
mutation($issueId: ID!, $issueTypeId: ID!) {
  updateIssueIssueType(input: {issueId: $issueId, issueTypeId: $issueTypeId}) {
    issue { id }
  }
}
"#;

pub const ADD_LABELS: &str = r#"
mutation($labelableId: ID!, $labelIds: [ID!]!) {
  addLabelsToLabelable(input: {labelableId: $labelableId, labelIds: $labelIds}) {
    clientMutationId
  }
}
"#;

pub const DELETE_ISSUE: &str = r#"
mutation($issueId: ID!) {
  deleteIssue(input: {issueId: $issueId}) {
    clientMutationId
  }
}
"#;

pub const ADD_TO_PROJECT: &str = r#"
mutation($projectId: ID!, $contentId: ID!) {
  addProjectV2ItemById(input: {projectId: $projectId, contentId: $contentId}) {
    item { id }
  }
}
"#;

pub const SET_SINGLE_SELECT_FIELD: &str = r#"
mutation($projectId: ID!, $itemId: ID!, $fieldId: ID!, $optionId: String!) {
  updateProjectV2ItemFieldValue(input: {
    projectId: $projectId,
    itemId: $itemId,
    fieldId: $fieldId,
    value: {singleSelectOptionId: $optionId}
  }) {
    projectV2Item { id }
  }
}
"#;

pub const SET_ITERATION_FIELD: &str = r#"
mutation($projectId: ID!, $itemId: ID!, $fieldId: ID!, $iterationId: String!) {
  updateProjectV2ItemFieldValue(input: {
    projectId: $projectId,
    itemId: $itemId,
    fieldId: $fieldId,
    value: {iterationId: $iterationId}
  }) {
    projectV2Item { id }
  }
}
"#;

pub const ADD_SUB_ISSUE: &str = r#"
mutation($issueId: ID!, $subIssueId: ID!) {
  addSubIssue(input: {issueId: $issueId, subIssueId: $subIssueId}) {
    issue { id }
  }
}
"#;

pub const REMOVE_SUB_ISSUE: &str = r#"
mutation($issueId: ID!, $subIssueId: ID!) {
  removeSubIssue(input: {issueId: $issueId, subIssueId: $subIssueId}) {
    issue { id }
  }
}
"#;

pub const ADD_ISSUE_DEPENDENCY: &str = r#"
mutation($issueId: ID!, $blockedById: ID!) {
  addIssueDependency(input: {issueId: $issueId, blockedById: $blockedById}) {
    clientMutationId
  }
}
"#;

pub const REMOVE_ISSUE_DEPENDENCY: &str = r#"
mutation($issueId: ID!, $blockedById: ID!) {
  removeIssueDependency(input: {issueId: $issueId, blockedById: $blockedById}) {
    clientMutationId
  }
}
"#;
