use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::agents::log::{append_activity, utc_timestamp, ActivityEntry};
use crate::config::{self, WorkspaceConfig, WorkspacePaths};
use crate::model::agent::map_agent_to_user;
use crate::model::story::{parse_story_metadata, Story};
use crate::model::workflow::{linear_priority, WorkflowState};
use crate::stories::completion::evaluate_completion;
use crate::stories::rewrite::{complete_story_file, issue_url, link_story_file};
use crate::stories::scan::{scan_story_files, STORY_EXTENSION};
use crate::tracker::{self, IssueDraft, RemoteIssue, Tracker, TrackerProject};

/// Tracker-side identifiers resolved during setup. Rebuilt on every run.
#[derive(Debug, Clone, Default)]
pub struct LinearState {
    pub team_id: String,
    pub cycle_id: Option<String>,
    pub api_key: Option<String>,
    pub projects: BTreeMap<TrackerProject, String>,
    pub states: BTreeMap<WorkflowState, String>,
}

impl LinearState {
    pub fn new(team_id: String, api_key: Option<String>) -> Self {
        Self {
            team_id,
            api_key,
            ..Self::default()
        }
    }

    pub fn is_connected(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn state_id(&self, state: WorkflowState) -> Option<&str> {
        self.states.get(&state).map(String::as_str)
    }

    /// Remote state for a story status; unmapped statuses use the Todo state.
    pub fn state_for_status(&self, status: Option<&str>) -> Option<&str> {
        self.state_id(WorkflowState::from_status(status))
            .or_else(|| self.state_id(WorkflowState::Todo))
    }

    pub fn project_id(&self, project: TrackerProject) -> Option<&str> {
        self.projects.get(&project).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoryOutcome {
    Created(RemoteIssue),
    Updated(String),
    Skipped,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub scanned: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl SyncSummary {
    pub fn synced(&self) -> usize {
        self.created + self.updated
    }
}

pub struct Synchronizer {
    paths: WorkspacePaths,
    config: WorkspaceConfig,
    linear: LinearState,
    tracker: Box<dyn Tracker>,
}

impl Synchronizer {
    pub fn new(
        paths: WorkspacePaths,
        config: WorkspaceConfig,
        api_key: Option<String>,
        tracker: Box<dyn Tracker>,
    ) -> Self {
        let linear = LinearState::new(config.linear.team_id.clone(), api_key);
        Self {
            paths,
            config,
            linear,
            tracker,
        }
    }

    /// Wire everything up from the workspace at `root` and the environment.
    pub fn from_workspace(root: &Path) -> Self {
        let config = config::load_config(root);
        let paths = WorkspacePaths::new(root, &config);
        let api_key = config::api_key_from_env();
        let tracker = tracker::create_tracker(&config.linear, api_key.as_deref());
        tracing::debug!(
            "BMAD {} ({}) using {} tracker",
            config.version,
            config.slash_prefix,
            tracker.name()
        );
        Self::new(paths, config, api_key, tracker)
    }

    pub fn paths(&self) -> &WorkspacePaths {
        &self.paths
    }

    pub fn is_connected(&self) -> bool {
        self.linear.is_connected()
    }

    pub fn warn_disconnected(&self) {
        tracing::warn!(
            "{} not set. Linear integration will be disabled.",
            config::API_KEY_VAR
        );
    }

    /// Create the tracker projects and workflow states and pick up the
    /// current cycle. Individual failures are logged and skipped.
    pub async fn setup_workspace(&mut self) {
        if !self.is_connected() {
            self.warn_disconnected();
            return;
        }
        tracing::info!("Setting up Linear workspace...");

        let mut projects = BTreeMap::new();
        for project in TrackerProject::ALL {
            match self.tracker.create_project(project.name()).await {
                Ok(created) => {
                    tracing::info!("Created Linear project: {}", project.name());
                    projects.insert(project, created.id);
                }
                Err(e) => {
                    tracing::error!("Failed to create project {}: {e:#}", project.name())
                }
            }
        }
        self.linear.projects = projects;

        let mut states = BTreeMap::new();
        for state in WorkflowState::ALL {
            match self.tracker.create_state(state).await {
                Ok(created) => {
                    tracing::info!("Created Linear state: {state}");
                    states.insert(state, created.id);
                }
                Err(e) => tracing::error!("Failed to create state {state}: {e:#}"),
            }
        }
        self.linear.states = states;

        self.linear.cycle_id = match self.tracker.current_cycle().await {
            Ok(cycle) => Some(cycle),
            Err(e) => {
                tracing::error!("Failed to resolve current cycle: {e:#}");
                None
            }
        };

        tracing::info!("Linear workspace setup complete");
    }

    /// Sync every story file, one at a time. A failing story is logged and
    /// the batch moves on.
    pub async fn sync_existing_stories(&self) -> SyncSummary {
        let mut summary = SyncSummary::default();
        if !self.is_connected() {
            self.warn_disconnected();
            return summary;
        }
        tracing::info!("Syncing existing BMAD stories with Linear...");

        let story_dir = &self.paths.story_dir;
        if !story_dir.is_dir() {
            tracing::info!(
                "No story directory found at {}, skipping sync",
                story_dir.display()
            );
            return summary;
        }

        let files = match scan_story_files(story_dir, STORY_EXTENSION) {
            Ok(files) => files,
            Err(e) => {
                tracing::error!("{e:#}");
                return summary;
            }
        };

        for file in files {
            summary.scanned += 1;
            match self.sync_story(&file).await {
                Ok(StoryOutcome::Created(_)) => summary.created += 1,
                Ok(StoryOutcome::Updated(_)) => summary.updated += 1,
                Ok(StoryOutcome::Skipped) => summary.skipped += 1,
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!("Failed to sync story {}: {e:#}", display_name(&file));
                }
            }
        }

        tracing::info!(
            "Synced {} of {} stories to Linear ({} skipped, {} failed)",
            summary.synced(),
            summary.scanned,
            summary.skipped,
            summary.failed
        );
        summary
    }

    /// Push one story to the tracker. New stories get an issue and a link
    /// line; stories that already carry a link only have their state updated.
    pub async fn sync_story(&self, path: &Path) -> Result<StoryOutcome> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let Some(story) = parse_story_metadata(&content) else {
            tracing::warn!("Could not parse story: {}", display_name(path));
            return Ok(StoryOutcome::Skipped);
        };

        if let Some(issue_id) = &story.linear_id {
            let state_id = self.linear.state_for_status(story.status.as_deref());
            self.tracker
                .update_issue_state(issue_id, state_id)
                .await
                .with_context(|| format!("Failed to update Linear issue {issue_id}"))?;
            tracing::info!("Updated Linear issue {issue_id} from story {}", story.title);
            return Ok(StoryOutcome::Updated(issue_id.clone()));
        }

        let draft = self.build_draft(&story, path);
        let issue = self
            .tracker
            .create_issue(&draft)
            .await
            .with_context(|| format!("Failed to create Linear issue for {}", story.title))?;

        let url = issue
            .url
            .clone()
            .unwrap_or_else(|| issue_url(&self.config.linear.workspace, &issue.id));
        let linked = {
            let (path, issue_id) = (path.to_path_buf(), issue.id.clone());
            tokio::task::spawn_blocking(move || link_story_file(&path, &issue_id, &url)).await??
        };
        if !linked {
            tracing::warn!(
                "{} has no Story Metadata section; issue link not written",
                display_name(path)
            );
        }

        tracing::info!("Synced story {} to Linear issue {}", story.title, issue.id);
        Ok(StoryOutcome::Created(issue))
    }

    pub fn build_draft(&self, story: &Story, path: &Path) -> IssueDraft {
        IssueDraft {
            team_id: self.linear.team_id.clone(),
            title: story.title.clone(),
            description: Some(format!("BMAD story `{}`", display_name(path))),
            state_id: self
                .linear
                .state_for_status(story.status.as_deref())
                .map(String::from),
            assignee: map_agent_to_user(story.agent.as_deref()).map(String::from),
            project_id: self
                .linear
                .project_id(TrackerProject::Stories)
                .map(String::from),
            cycle_id: self.linear.cycle_id.clone(),
            priority: story.priority.as_deref().and_then(linear_priority),
        }
    }

    /// Mark the story done when its Dev Agent Record checklist is complete.
    /// Returns whether the story was marked complete by this call.
    pub async fn check_story_completion(&self, path: &Path) -> Result<bool> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let Some(story) = parse_story_metadata(&content) else {
            return Ok(false);
        };

        if evaluate_completion(&content) && !story.is_done() {
            self.mark_story_complete(path, &story).await?;
            return Ok(true);
        }
        Ok(false)
    }

    pub async fn mark_story_complete(&self, path: &Path, story: &Story) -> Result<()> {
        let stamped = path.to_path_buf();
        tokio::task::spawn_blocking(move || complete_story_file(&stamped, &utc_timestamp()))
            .await??;

        if self.is_connected() {
            match &story.linear_id {
                Some(issue_id) => {
                    let done = self.linear.state_id(WorkflowState::Done);
                    self.tracker
                        .update_issue_state(issue_id, done)
                        .await
                        .with_context(|| format!("Failed to close Linear issue {issue_id}"))?;
                }
                None => tracing::warn!(
                    "Story {} has no linked Linear issue to close",
                    story.title
                ),
            }
        }

        tracing::info!("Story completed: {}", story.title);
        Ok(())
    }

    /// Append to the agent's activity log and forward it to the tracker.
    pub async fn track_agent_activity(&self, agent: &str, activity: &str) -> Result<ActivityEntry> {
        let entry = ActivityEntry::now(agent, activity);
        append_activity(&self.paths.debug_dir, &entry).context("Failed to write agent activity")?;

        if self.is_connected() {
            tracing::info!("Agent activity: {} - {}", entry.agent, entry.activity);
            self.tracker.record_activity(&entry).await?;
        }
        Ok(entry)
    }

    /// Parseable stories in the stories directory.
    pub fn load_stories(&self) -> Vec<(PathBuf, Story)> {
        let files = scan_story_files(&self.paths.story_dir, STORY_EXTENSION).unwrap_or_default();
        files
            .into_iter()
            .filter_map(|path| {
                let content = std::fs::read_to_string(&path).ok()?;
                parse_story_metadata(&content).map(|story| (path, story))
            })
            .collect()
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
