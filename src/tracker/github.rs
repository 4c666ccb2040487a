//! GitHub implementation of the tracker traits.
//!
//! Issues and labels go through the REST API; project boards only exist in
//! the GraphQL API (Projects v2).

use chrono::NaiveDate;
use reqwest::header::ACCEPT;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, trace};

use crate::config::RepoSlug;
use crate::error::{Error, Result};
use crate::model::{
    BoardItem, IssueDraft, IssueSnapshot, IssueState, ProjectField, ProjectRef,
    project::DATE_FIELD_TYPE,
};

use super::{IssueTracker, PAGE_SIZE, ProjectBoard};

const MEDIA_TYPE: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// GitHub REST + GraphQL client bound to one repository.
pub struct GitHubClient {
    client: reqwest::Client,
    api_url: String,
    graphql_url: String,
    token: String,
    owner: String,
    repo: String,
}

impl GitHubClient {
    /// Create a client for `repo`.
    ///
    /// `api_url` is the REST root (`https://api.github.com`, or
    /// `https://host/api/v3` for GitHub Enterprise Server).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_url: &str, token: &str, repo: &RepoSlug) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("todosync/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let api_url = api_url.trim_end_matches('/').to_string();
        Ok(Self {
            client,
            graphql_url: graphql_url_for(&api_url),
            api_url,
            token: token.to_string(),
            owner: repo.owner.clone(),
            repo: repo.name.clone(),
        })
    }

    fn repo_path(&self) -> String {
        format!("/repos/{}/{}", self.owner, self.repo)
    }

    fn rest(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.api_url, path))
            .bearer_auth(&self.token)
            .header(ACCEPT, MEDIA_TYPE)
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    async fn graphql<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T> {
        trace!(query = query.trim().lines().next().unwrap_or_default(), "GraphQL request");

        let response = self
            .client
            .post(&self.graphql_url)
            .bearer_auth(&self.token)
            .header(ACCEPT, MEDIA_TYPE)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = api_message(&response.text().await.unwrap_or_default());
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Auth {
                    status: status.as_u16(),
                    message,
                },
                _ => Error::GraphQl(format!("HTTP {status}: {message}")),
            });
        }

        let payload: GraphQlResponse<T> = response.json().await?;
        if let Some(errors) = payload.errors.filter(|e| !e.is_empty()) {
            let messages: Vec<_> = errors.into_iter().map(|e| e.message).collect();
            return Err(Error::GraphQl(messages.join("; ")));
        }
        payload
            .data
            .ok_or_else(|| Error::GraphQl("response carried no data".to_string()))
    }
}

/// GraphQL endpoint matching a REST root.
fn graphql_url_for(api_url: &str) -> String {
    match api_url.strip_suffix("/api/v3") {
        Some(host) => format!("{host}/api/graphql"),
        None => format!("{api_url}/graphql"),
    }
}

/// Send a REST request and decode the JSON response.
async fn execute<T: DeserializeOwned>(request: RequestBuilder, resource: &str) -> Result<T> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let message = api_message(&response.text().await.unwrap_or_default());
    debug!(resource, status = status.as_u16(), %message, "GitHub request failed");
    Err(status_error(status, message, resource))
}

/// Map a failed REST status to an error.
fn status_error(status: StatusCode, message: String, resource: &str) -> Error {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Auth {
            status: status.as_u16(),
            message,
        },
        StatusCode::NOT_FOUND | StatusCode::GONE => Error::NotFound {
            resource: resource.to_string(),
        },
        _ => Error::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// Treat a 422 from label creation as success.
fn label_create_result(result: Result<IgnoredAny>, name: &str) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        // 422 "already_exists": another run got there first.
        Err(Error::Api { status: 422, .. }) => {
            debug!(label = name, "Label already exists");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// The `message` field of a GitHub error document, or the raw text.
fn api_message(text: &str) -> String {
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| text.trim().to_string())
}

// ── REST payloads ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RestIssue {
    number: u64,
    state: IssueState,
    #[serde(default)]
    title: String,
    body: Option<String>,
    #[serde(default)]
    labels: Vec<RestLabel>,
    pull_request: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RestLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CreatedIssue {
    number: u64,
}

impl From<RestIssue> for IssueSnapshot {
    fn from(issue: RestIssue) -> Self {
        let mut labels: Vec<String> = issue.labels.into_iter().map(|l| l.name).collect();
        labels.sort();
        Self {
            number: issue.number,
            state: issue.state,
            title: issue.title,
            body: issue.body.unwrap_or_default(),
            labels,
            is_pull_request: issue.pull_request.is_some(),
        }
    }
}

impl IssueTracker for GitHubClient {
    async fn list_issues(&self, label: &str, page: u32) -> Result<Vec<IssueSnapshot>> {
        let page_str = page.to_string();
        let per_page = PAGE_SIZE.to_string();
        let request = self
            .rest(Method::GET, &format!("{}/issues", self.repo_path()))
            .query(&[
                ("state", "all"),
                ("labels", label),
                ("per_page", per_page.as_str()),
                ("page", page_str.as_str()),
            ]);

        let issues: Vec<RestIssue> = execute(request, "issue list").await?;
        debug!(page, count = issues.len(), "Fetched issue page");
        Ok(issues.into_iter().map(IssueSnapshot::from).collect())
    }

    async fn create_issue(&self, draft: &IssueDraft) -> Result<u64> {
        let request = self
            .rest(Method::POST, &format!("{}/issues", self.repo_path()))
            .json(draft);
        let created: CreatedIssue = execute(request, "issue").await?;
        Ok(created.number)
    }

    async fn update_issue(&self, number: u64, draft: &IssueDraft, state: IssueState) -> Result<()> {
        let request = self
            .rest(Method::PATCH, &format!("{}/issues/{number}", self.repo_path()))
            .json(&json!({
                "title": draft.title,
                "body": draft.body,
                "labels": draft.labels,
                "state": state.as_str(),
            }));
        let _: IgnoredAny = execute(request, &format!("issue #{number}")).await?;
        Ok(())
    }

    async fn close_issue(&self, number: u64) -> Result<()> {
        let request = self
            .rest(Method::PATCH, &format!("{}/issues/{number}", self.repo_path()))
            .json(&json!({ "state": IssueState::Closed.as_str() }));
        let _: IgnoredAny = execute(request, &format!("issue #{number}")).await?;
        Ok(())
    }

    async fn list_labels(&self, page: u32) -> Result<Vec<String>> {
        let page_str = page.to_string();
        let per_page = PAGE_SIZE.to_string();
        let request = self
            .rest(Method::GET, &format!("{}/labels", self.repo_path()))
            .query(&[("per_page", per_page.as_str()), ("page", page_str.as_str())]);
        let labels: Vec<RestLabel> = execute(request, "label list").await?;
        Ok(labels.into_iter().map(|l| l.name).collect())
    }

    async fn create_label(&self, name: &str) -> Result<()> {
        let request = self
            .rest(Method::POST, &format!("{}/labels", self.repo_path()))
            .json(&json!({ "name": name }));
        let result = execute::<IgnoredAny>(request, &format!("label {name}")).await;
        label_create_result(result, name)
    }
}

// ── GraphQL payloads ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct Connection<T> {
    #[serde(default = "Vec::new")]
    nodes: Vec<Option<T>>,
}

impl<T> Connection<T> {
    fn into_nodes(self) -> impl Iterator<Item = T> {
        self.nodes.into_iter().flatten()
    }
}

#[derive(Debug, Deserialize)]
struct IdNode {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OwnerData {
    repository_owner: Option<OwnerNode>,
}

#[derive(Debug, Deserialize)]
struct OwnerNode {
    id: String,
    #[serde(rename = "projectsV2")]
    projects: Option<Connection<ProjectNode>>,
}

#[derive(Debug, Deserialize)]
struct ProjectNode {
    id: String,
    title: String,
}

#[derive(Debug, Deserialize)]
struct CreateProjectData {
    #[serde(rename = "createProjectV2")]
    payload: CreateProjectPayload,
}

#[derive(Debug, Deserialize)]
struct CreateProjectPayload {
    #[serde(rename = "projectV2")]
    project: IdNode,
}

#[derive(Debug, Deserialize)]
struct FieldsData {
    node: Option<FieldsNode>,
}

#[derive(Debug, Deserialize)]
struct FieldsNode {
    fields: Option<Connection<FieldNode>>,
}

/// Non-`ProjectV2Field` fields come back as `{}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FieldNode {
    id: Option<String>,
    name: Option<String>,
    data_type: Option<String>,
}

impl FieldNode {
    fn into_field(self) -> Option<ProjectField> {
        Some(ProjectField {
            id: self.id?,
            name: self.name?,
            data_type: self.data_type.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct CreateFieldData {
    #[serde(rename = "createProjectV2Field")]
    payload: CreateFieldPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateFieldPayload {
    project_v2_field: Option<FieldNode>,
}

#[derive(Debug, Deserialize)]
struct IssueItemsData {
    repository: Option<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
struct RepositoryNode {
    issue: Option<IssueItemsNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueItemsNode {
    id: String,
    project_items: Option<Connection<ProjectItemNode>>,
}

#[derive(Debug, Deserialize)]
struct ProjectItemNode {
    id: String,
    project: Option<IdNode>,
}

#[derive(Debug, Deserialize)]
struct AddItemData {
    #[serde(rename = "addProjectV2ItemById")]
    payload: AddItemPayload,
}

#[derive(Debug, Deserialize)]
struct AddItemPayload {
    item: IdNode,
}

const OWNER_PROJECTS_QUERY: &str = r"
query($login: String!) {
  repositoryOwner(login: $login) {
    __typename
    id
    ... on Organization { projectsV2(first: 100) { nodes { id title } } }
    ... on User { projectsV2(first: 100) { nodes { id title } } }
  }
}";

const CREATE_PROJECT_MUTATION: &str = r"
mutation($ownerId: ID!, $title: String!) {
  createProjectV2(input: { ownerId: $ownerId, title: $title }) {
    projectV2 { id }
  }
}";

const PROJECT_FIELDS_QUERY: &str = r"
query($projectId: ID!) {
  node(id: $projectId) {
    ... on ProjectV2 {
      fields(first: 50) {
        nodes { ... on ProjectV2Field { id name dataType } }
      }
    }
  }
}";

const CREATE_DATE_FIELD_MUTATION: &str = r"
mutation($projectId: ID!, $name: String!) {
  createProjectV2Field(input: { projectId: $projectId, name: $name, dataType: DATE }) {
    projectV2Field { ... on ProjectV2Field { id name dataType } }
  }
}";

const ISSUE_ITEMS_QUERY: &str = r"
query($owner: String!, $repo: String!, $number: Int!) {
  repository(owner: $owner, name: $repo) {
    issue(number: $number) {
      id
      projectItems(first: 50) { nodes { id project { id } } }
    }
  }
}";

const ADD_ITEM_MUTATION: &str = r"
mutation($projectId: ID!, $contentId: ID!) {
  addProjectV2ItemById(input: { projectId: $projectId, contentId: $contentId }) {
    item { id }
  }
}";

const SET_DATE_MUTATION: &str = r"
mutation($projectId: ID!, $itemId: ID!, $fieldId: ID!, $date: Date!) {
  updateProjectV2ItemFieldValue(input: {
    projectId: $projectId, itemId: $itemId, fieldId: $fieldId, value: { date: $date }
  }) {
    projectV2Item { id }
  }
}";

const CLEAR_FIELD_MUTATION: &str = r"
mutation($projectId: ID!, $itemId: ID!, $fieldId: ID!) {
  clearProjectV2ItemFieldValue(input: { projectId: $projectId, itemId: $itemId, fieldId: $fieldId }) {
    projectV2Item { id }
  }
}";

impl ProjectBoard for GitHubClient {
    async fn find_or_create_project(&self, title: &str) -> Result<ProjectRef> {
        let data: OwnerData = self
            .graphql(OWNER_PROJECTS_QUERY, json!({ "login": self.owner }))
            .await?;
        let owner = data.repository_owner.ok_or_else(|| Error::NotFound {
            resource: format!("repository owner {}", self.owner),
        })?;

        let wanted = title.trim().to_lowercase();
        let existing = owner
            .projects
            .into_iter()
            .flat_map(Connection::into_nodes)
            .find(|p| p.title.trim().to_lowercase() == wanted);

        let project_id = if let Some(project) = existing {
            project.id
        } else {
            debug!(title, "Creating project");
            let created: CreateProjectData = self
                .graphql(
                    CREATE_PROJECT_MUTATION,
                    json!({ "ownerId": owner.id, "title": title }),
                )
                .await?;
            created.payload.project.id
        };

        Ok(ProjectRef {
            project_id,
            owner_id: owner.id,
        })
    }

    async fn project_fields(&self, project_id: &str) -> Result<Vec<ProjectField>> {
        let data: FieldsData = self
            .graphql(PROJECT_FIELDS_QUERY, json!({ "projectId": project_id }))
            .await?;
        let node = data.node.ok_or_else(|| Error::NotFound {
            resource: format!("project {project_id}"),
        })?;
        Ok(node
            .fields
            .into_iter()
            .flat_map(Connection::into_nodes)
            .filter_map(FieldNode::into_field)
            .collect())
    }

    async fn create_date_field(&self, project_id: &str, name: &str) -> Result<ProjectField> {
        let data: CreateFieldData = self
            .graphql(
                CREATE_DATE_FIELD_MUTATION,
                json!({ "projectId": project_id, "name": name }),
            )
            .await?;
        data.payload
            .project_v2_field
            .and_then(FieldNode::into_field)
            .filter(|f| f.data_type == DATE_FIELD_TYPE)
            .ok_or_else(|| Error::GraphQl(format!("could not create date field '{name}'")))
    }

    async fn find_or_create_item(
        &self,
        project_id: &str,
        issue_number: u64,
    ) -> Result<Option<BoardItem>> {
        let data: IssueItemsData = self
            .graphql(
                ISSUE_ITEMS_QUERY,
                json!({ "owner": self.owner, "repo": self.repo, "number": issue_number }),
            )
            .await?;
        let Some(issue) = data.repository.and_then(|r| r.issue) else {
            return Ok(None);
        };

        let linked = issue
            .project_items
            .into_iter()
            .flat_map(Connection::into_nodes)
            .find(|item| item.project.as_ref().is_some_and(|p| p.id == project_id));
        if let Some(item) = linked {
            return Ok(Some(BoardItem {
                id: item.id,
                created: false,
            }));
        }

        let added: AddItemData = self
            .graphql(
                ADD_ITEM_MUTATION,
                json!({ "projectId": project_id, "contentId": issue.id }),
            )
            .await?;
        Ok(Some(BoardItem {
            id: added.payload.item.id,
            created: true,
        }))
    }

    async fn set_date_field(
        &self,
        project_id: &str,
        item_id: &str,
        field_id: &str,
        date: Option<NaiveDate>,
    ) -> Result<()> {
        let _: IgnoredAny = match date {
            Some(date) => {
                self.graphql(
                    SET_DATE_MUTATION,
                    json!({
                        "projectId": project_id,
                        "itemId": item_id,
                        "fieldId": field_id,
                        "date": date.format("%Y-%m-%d").to_string(),
                    }),
                )
                .await?
            }
            None => {
                self.graphql(
                    CLEAR_FIELD_MUTATION,
                    json!({ "projectId": project_id, "itemId": item_id, "fieldId": field_id }),
                )
                .await?
            }
        };
        Ok(())
    }
}
