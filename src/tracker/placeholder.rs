use anyhow::Result;
use async_trait::async_trait;
use chrono::Datelike;
use std::sync::atomic::{AtomicI64, Ordering};

use super::{IssueDraft, RemoteIssue, RemoteProject, RemoteState, Tracker};
use crate::model::workflow::WorkflowState;
use crate::util::slug::compact_slug;

/// Offline tracker that synthesizes identifiers instead of calling an API.
pub struct PlaceholderTracker {
    last_issue: AtomicI64,
}

impl PlaceholderTracker {
    pub fn new() -> Self {
        Self {
            last_issue: AtomicI64::new(0),
        }
    }

    /// `issue-<unix millis>`, bumped when two issues land in the same millisecond.
    fn next_issue_id(&self) -> String {
        let now = chrono::Utc::now().timestamp_millis();
        let prev = self
            .last_issue
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or(now);
        format!("issue-{}", now.max(prev + 1))
    }
}

impl Default for PlaceholderTracker {
    fn default() -> Self {
        Self::new()
    }
}

pub fn project_id(name: &str) -> String {
    format!("project-{}-id", compact_slug(name))
}

pub fn state_id(state: WorkflowState) -> String {
    format!("state-{}-id", compact_slug(state.display_name()))
}

#[async_trait]
impl Tracker for PlaceholderTracker {
    fn name(&self) -> &str {
        "Placeholder"
    }

    async fn create_project(&self, name: &str) -> Result<RemoteProject> {
        Ok(RemoteProject {
            id: project_id(name),
            name: name.to_string(),
        })
    }

    async fn create_state(&self, state: WorkflowState) -> Result<RemoteState> {
        Ok(RemoteState {
            id: state_id(state),
            name: state.display_name().to_string(),
            kind: state.kind().to_string(),
        })
    }

    async fn current_cycle(&self) -> Result<String> {
        let now = chrono::Utc::now();
        Ok(format!("cycle-{}-{}", now.year(), now.month()))
    }

    async fn create_issue(&self, draft: &IssueDraft) -> Result<RemoteIssue> {
        Ok(RemoteIssue {
            id: self.next_issue_id(),
            title: draft.title.clone(),
            url: None,
            state: draft.state_id.clone(),
            assignee: draft.assignee.clone(),
            project: draft.project_id.clone(),
        })
    }

    async fn update_issue_state(&self, issue_id: &str, state_id: Option<&str>) -> Result<()> {
        tracing::info!(
            "Updated Linear issue {issue_id} to state: {}",
            state_id.unwrap_or("unmapped")
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::TrackerProject;

    #[tokio::test]
    async fn project_ids_use_compact_slug() {
        let tracker = PlaceholderTracker::new();
        let project = tracker
            .create_project(TrackerProject::Stories.name())
            .await
            .unwrap();
        assert_eq!(project.id, "project-bmaddevelopmentstories-id");
        assert_eq!(project.name, "BMAD Development Stories");
    }

    #[tokio::test]
    async fn state_ids_use_compact_slug() {
        let tracker = PlaceholderTracker::new();
        let state = tracker.create_state(WorkflowState::InProgress).await.unwrap();
        assert_eq!(state.id, "state-inprogress-id");
        assert_eq!(state.name, "In Progress");
        assert_eq!(state.kind, "started");
    }

    #[tokio::test]
    async fn cycle_is_year_and_month() {
        let tracker = PlaceholderTracker::new();
        let cycle = tracker.current_cycle().await.unwrap();
        let now = chrono::Utc::now();
        assert_eq!(cycle, format!("cycle-{}-{}", now.year(), now.month()));
    }

    #[tokio::test]
    async fn issue_ids_are_unique_within_a_run() {
        let tracker = PlaceholderTracker::new();
        let draft = IssueDraft {
            title: "Story".into(),
            state_id: Some("state-todo-id".into()),
            assignee: Some("Development Agent".into()),
            ..IssueDraft::default()
        };
        let mut ids = Vec::new();
        for _ in 0..20 {
            let issue = tracker.create_issue(&draft).await.unwrap();
            assert!(issue.id.starts_with("issue-"));
            assert_eq!(issue.state.as_deref(), Some("state-todo-id"));
            assert_eq!(issue.assignee.as_deref(), Some("Development Agent"));
            ids.push(issue.id);
        }
        let mut deduped = ids.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), ids.len());
    }
}
