pub mod linear;
pub mod placeholder;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::agents::log::ActivityEntry;
use crate::config::LinearSettings;
use crate::model::workflow::WorkflowState;

/// The tracker projects a workspace is organized into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TrackerProject {
    Stories,
    Epics,
    Agents,
    Milestones,
}

impl TrackerProject {
    pub const ALL: [TrackerProject; 4] = [
        TrackerProject::Stories,
        TrackerProject::Epics,
        TrackerProject::Agents,
        TrackerProject::Milestones,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TrackerProject::Stories => "BMAD Development Stories",
            TrackerProject::Epics => "BMAD Epic Management",
            TrackerProject::Agents => "BMAD Agent Activity",
            TrackerProject::Milestones => "BMAD Milestone Tracking",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteProject {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteState {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteIssue {
    /// Identifier written back into the story and used for later updates.
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

/// What a story is sent to the tracker as.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueDraft {
    pub team_id: String,
    pub title: String,
    pub description: Option<String>,
    pub state_id: Option<String>,
    pub assignee: Option<String>,
    pub project_id: Option<String>,
    pub cycle_id: Option<String>,
    pub priority: Option<u8>,
}

#[async_trait]
pub trait Tracker: Send + Sync {
    fn name(&self) -> &str;
    async fn create_project(&self, name: &str) -> Result<RemoteProject>;
    async fn create_state(&self, state: WorkflowState) -> Result<RemoteState>;
    async fn current_cycle(&self) -> Result<String>;
    async fn create_issue(&self, draft: &IssueDraft) -> Result<RemoteIssue>;
    async fn update_issue_state(&self, issue_id: &str, state_id: Option<&str>) -> Result<()>;
    async fn record_activity(&self, _entry: &ActivityEntry) -> Result<()> {
        Ok(())
    }
}


/// The live Linear client when it is enabled and a key is present, the
/// placeholder otherwise.
pub fn create_tracker(settings: &LinearSettings, api_key: Option<&str>) -> Box<dyn Tracker> {
    match api_key {
        Some(key) if settings.live => Box::new(linear::LinearTracker::new(
            key.to_string(),
            settings.team_id.clone(),
            settings.endpoint.clone(),
        )),
        _ => Box::new(placeholder::PlaceholderTracker::new()),
    }
}
