use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{IssueDraft, RemoteIssue, RemoteProject, RemoteState, Tracker};
use crate::model::workflow::WorkflowState;

pub struct LinearTracker {
    api_key: String,
    team_id: String,
    endpoint: String,
    client: reqwest::Client,
}

impl LinearTracker {
    pub fn new(api_key: String, team_id: String, endpoint: String) -> Self {
        Self {
            api_key,
            team_id,
            endpoint,
            client: reqwest::Client::new(),
        }
    }

    async fn graphql<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T> {
        let body = json!({ "query": query, "variables": variables });
        let resp = self
            .client
            .post(&self.endpoint)
            .header("Authorization", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .context("Linear API request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            bail!("Linear API returned {status}: {text}");
        }

        let gql: GqlResponse<T> = resp.json().await.context("Failed to parse Linear response")?;
        if !gql.errors.is_empty() {
            let messages: Vec<String> = gql.errors.into_iter().map(|e| e.message).collect();
            bail!("Linear API error: {}", messages.join("; "));
        }
        gql.data.context("No data in Linear response")
    }
}

const PROJECT_CREATE: &str = r#"mutation ProjectCreate($input: ProjectCreateInput!) {
  projectCreate(input: $input) {
    success
    project { id name }
  }
}"#;

const STATE_CREATE: &str = r#"mutation StateCreate($input: WorkflowStateCreateInput!) {
  workflowStateCreate(input: $input) {
    success
    workflowState { id name type }
  }
}"#;

const ACTIVE_CYCLE: &str = r#"query ActiveCycle($id: String!) {
  team(id: $id) {
    activeCycle { id }
  }
}"#;

const ISSUE_CREATE: &str = r#"mutation IssueCreate($input: IssueCreateInput!) {
  issueCreate(input: $input) {
    success
    issue {
      identifier title url
      state { id }
      assignee { name }
      project { id }
    }
  }
}"#;

const ISSUE_UPDATE: &str = r#"mutation IssueUpdate($id: String!, $input: IssueUpdateInput!) {
  issueUpdate(id: $id, input: $input) {
    success
  }
}"#;

#[derive(Deserialize)]
struct GqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GqlError>,
}

#[derive(Deserialize)]
struct GqlError {
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectCreateData {
    project_create: ProjectPayload,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StateCreateData {
    workflow_state_create: StatePayload,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatePayload {
    success: bool,
    workflow_state: Option<RemoteState>,
}

#[derive(Deserialize)]
struct TeamData {
    team: Option<Team>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Team {
    active_cycle: Option<Node>,
}

#[derive(Deserialize)]
struct Node {
    id: String,
}

#[derive(Deserialize)]
struct Named {
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueCreateData {
    issue_create: IssuePayload,
}

#[derive(Deserialize)]
struct IssuePayload {
    success: bool,
    issue: Option<Issue>,
}

#[derive(Deserialize)]
struct Issue {
    identifier: String,
    title: String,
    url: Option<String>,
    state: Option<Node>,
    assignee: Option<Named>,
    project: Option<Node>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueUpdateData {
    issue_update: Ack,
}

#[derive(Deserialize)]
struct Ack {
    success: bool,
}

#[derive(Deserialize)]
struct ProjectPayload {
    success: bool,
    project: Option<RemoteProject>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IssueCreateInput<'a> {
    team_id: &'a str,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cycle_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<u8>,
}

/// Linear assigns users by id, so the agent travels in the description.
fn issue_description(draft: &IssueDraft) -> Option<String> {
    match (&draft.description, &draft.assignee) {
        (Some(d), Some(a)) => Some(format!("{d}\n\nAgent: {a}")),
        (Some(d), None) => Some(d.clone()),
        (None, Some(a)) => Some(format!("Agent: {a}")),
        (None, None) => None,
    }
}

#[async_trait]
impl Tracker for LinearTracker {
    fn name(&self) -> &str {
        "Linear"
    }

    async fn create_project(&self, name: &str) -> Result<RemoteProject> {
        let vars = json!({ "input": { "name": name, "teamIds": [self.team_id] } });
        let data: ProjectCreateData = self.graphql(PROJECT_CREATE, vars).await?;
        let payload = data.project_create;
        match payload.project {
            Some(project) if payload.success => Ok(project),
            _ => bail!("Linear refused to create project {name}"),
        }
    }

    async fn create_state(&self, state: WorkflowState) -> Result<RemoteState> {
        let vars = json!({
            "input": {
                "name": state.display_name(),
                "type": state.kind(),
                "color": state.color(),
                "teamId": self.team_id,
            }
        });
        let data: StateCreateData = self.graphql(STATE_CREATE, vars).await?;
        let payload = data.workflow_state_create;
        match payload.workflow_state {
            Some(created) if payload.success => Ok(created),
            _ => bail!("Linear refused to create state {state}"),
        }
    }

    async fn current_cycle(&self) -> Result<String> {
        let data: TeamData = self
            .graphql(ACTIVE_CYCLE, json!({ "id": self.team_id }))
            .await?;
        data.team
            .with_context(|| format!("Team {} not found", self.team_id))?
            .active_cycle
            .map(|c| c.id)
            .context("Team has no active cycle")
    }

    async fn create_issue(&self, draft: &IssueDraft) -> Result<RemoteIssue> {
        let description = issue_description(draft);
        let input = IssueCreateInput {
            team_id: &draft.team_id,
            title: &draft.title,
            description: description.as_deref(),
            state_id: draft.state_id.as_deref(),
            project_id: draft.project_id.as_deref(),
            cycle_id: draft.cycle_id.as_deref(),
            priority: draft.priority,
        };
        let data: IssueCreateData = self
            .graphql(ISSUE_CREATE, json!({ "input": input }))
            .await?;
        let payload = data.issue_create;
        let issue = match payload.issue {
            Some(issue) if payload.success => issue,
            _ => bail!("Linear refused to create issue {}", draft.title),
        };
        Ok(RemoteIssue {
            id: issue.identifier,
            title: issue.title,
            url: issue.url,
            state: issue.state.map(|s| s.id),
            assignee: issue.assignee.map(|a| a.name).or_else(|| draft.assignee.clone()),
            project: issue.project.map(|p| p.id),
        })
    }

    async fn update_issue_state(&self, issue_id: &str, state_id: Option<&str>) -> Result<()> {
        let Some(state_id) = state_id else {
            bail!("No Linear state to move {issue_id} to; run setup first");
        };
        let vars = json!({ "id": issue_id, "input": { "stateId": state_id } });
        let data: IssueUpdateData = self.graphql(ISSUE_UPDATE, vars).await?;
        if !data.issue_update.success {
            bail!("Linear refused to update issue {issue_id}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn tracker_for(server: &mockito::ServerGuard) -> LinearTracker {
        LinearTracker::new(
            "lin_api_test".into(),
            "team-1".into(),
            format!("{}/graphql", server.url()),
        )
    }

    #[tokio::test]
    async fn create_issue_sends_mapped_fields() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/graphql")
            .match_header("authorization", "lin_api_test")
            .match_body(Matcher::PartialJson(json!({
                "variables": { "input": {
                    "teamId": "team-1",
                    "title": "My Story",
                    "stateId": "state-1",
                    "priority": 2,
                    "description": "Agent: Development Agent"
                } }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"data":{"issueCreate":{"success":true,"issue":{
                    "identifier":"ENG-7","title":"My Story",
                    "url":"https://linear.app/acme/issue/ENG-7",
                    "state":{"id":"state-1"},"assignee":null,"project":{"id":"proj-1"}}}}}"#,
            )
            .create_async()
            .await;

        let tracker = tracker_for(&server);
        let draft = IssueDraft {
            team_id: "team-1".into(),
            title: "My Story".into(),
            state_id: Some("state-1".into()),
            assignee: Some("Development Agent".into()),
            priority: Some(2),
            ..IssueDraft::default()
        };
        let issue = tracker.create_issue(&draft).await.unwrap();

        mock.assert_async().await;
        assert_eq!(issue.id, "ENG-7");
        assert_eq!(issue.url.as_deref(), Some("https://linear.app/acme/issue/ENG-7"));
        assert_eq!(issue.state.as_deref(), Some("state-1"));
        assert_eq!(issue.project.as_deref(), Some("proj-1"));
        assert_eq!(issue.assignee.as_deref(), Some("Development Agent"));
    }

    #[tokio::test]
    async fn graphql_errors_become_errors() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(r#"{"data":null,"errors":[{"message":"Authentication required"}]}"#)
            .create_async()
            .await;

        let tracker = tracker_for(&server);
        let err = tracker.create_project("BMAD Epic Management").await.unwrap_err();
        assert!(err.to_string().contains("Authentication required"));
    }

    #[tokio::test]
    async fn http_failure_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let tracker = tracker_for(&server);
        let err = tracker.current_cycle().await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn active_cycle_is_read_from_team() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .match_body(Matcher::PartialJson(json!({ "variables": { "id": "team-1" } })))
            .with_status(200)
            .with_body(r#"{"data":{"team":{"activeCycle":{"id":"cycle-9"}}}}"#)
            .create_async()
            .await;

        let tracker = tracker_for(&server);
        assert_eq!(tracker.current_cycle().await.unwrap(), "cycle-9");
    }

    #[tokio::test]
    async fn create_state_sends_kind_and_color() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .match_body(Matcher::PartialJson(json!({
                "variables": { "input": { "name": "Blocked", "type": "started", "teamId": "team-1" } }
            })))
            .with_status(200)
            .with_body(
                r#"{"data":{"workflowStateCreate":{"success":true,
                    "workflowState":{"id":"ws-5","name":"Blocked","type":"started"}}}}"#,
            )
            .create_async()
            .await;

        let tracker = tracker_for(&server);
        let state = tracker.create_state(WorkflowState::Blocked).await.unwrap();
        assert_eq!(state.id, "ws-5");
        assert_eq!(state.kind, "started");
    }

    #[tokio::test]
    async fn update_without_state_is_an_error() {
        let server = mockito::Server::new_async().await;
        let tracker = tracker_for(&server);
        assert!(tracker.update_issue_state("ENG-1", None).await.is_err());
    }

    #[tokio::test]
    async fn unsuccessful_update_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(r#"{"data":{"issueUpdate":{"success":false}}}"#)
            .create_async()
            .await;

        let tracker = tracker_for(&server);
        let err = tracker
            .update_issue_state("ENG-1", Some("state-done"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ENG-1"));
    }
}
