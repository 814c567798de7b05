use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::agents::log::{active_agent_count, utc_timestamp};
use crate::model::agent::AgentName;
use crate::sync::Synchronizer;
use crate::util::fs::atomic_write;

pub const REPORT_FILE: &str = "performance-report.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub timestamp: String,
    pub agent_activity: AgentActivitySummary,
    pub story_metrics: StoryMetrics,
    pub system_health: SystemHealth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentActivitySummary {
    pub total_agents: usize,
    pub active_agents: usize,
    pub average_response_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryMetrics {
    pub total_stories: usize,
    pub completed_stories: usize,
    pub average_completion_time: f64,
    pub velocity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemHealth {
    pub linear_connected: bool,
    pub stories_directory: bool,
    pub agents_directory: bool,
    pub debug_directory: bool,
}

/// Build the report from the current workspace state.
///
/// Response and completion times are not tracked anywhere yet and are
/// reported as zero.
pub fn build_report(sync: &Synchronizer) -> PerformanceReport {
    let paths = sync.paths();
    let stories = sync.load_stories();
    let completed = stories.iter().filter(|(_, s)| s.is_done()).count();

    PerformanceReport {
        timestamp: utc_timestamp(),
        agent_activity: AgentActivitySummary {
            total_agents: AgentName::ALL.len(),
            active_agents: active_agent_count(&paths.debug_dir),
            average_response_time: 0.0,
        },
        story_metrics: StoryMetrics {
            total_stories: stories.len(),
            completed_stories: completed,
            average_completion_time: 0.0,
            velocity: 0.0,
        },
        system_health: SystemHealth {
            linear_connected: sync.is_connected(),
            stories_directory: paths.story_dir.is_dir(),
            agents_directory: paths.agent_dir.is_dir(),
            debug_directory: paths.debug_dir.is_dir(),
        },
    }
}

/// Build the report and write it to the debug directory.
pub fn generate_performance_report(sync: &Synchronizer) -> Result<(PerformanceReport, PathBuf)> {
    let report = build_report(sync);
    let path = sync.paths().debug_dir.join(REPORT_FILE);
    let json = serde_json::to_string_pretty(&report)?;
    atomic_write(&path, json.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok((report, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::log::{append_activity, ActivityEntry};
    use crate::config::{WorkspaceConfig, WorkspacePaths};
    use crate::tracker::placeholder::PlaceholderTracker;

    fn synchronizer(root: &std::path::Path, api_key: Option<&str>) -> Synchronizer {
        let config = WorkspaceConfig::default();
        let paths = WorkspacePaths::new(root, &config);
        Synchronizer::new(
            paths,
            config,
            api_key.map(String::from),
            Box::new(PlaceholderTracker::new()),
        )
    }

    #[test]
    fn empty_workspace_report() {
        let dir = tempfile::tempdir().unwrap();
        let report = build_report(&synchronizer(dir.path(), None));
        assert_eq!(report.agent_activity.total_agents, 12);
        assert_eq!(report.agent_activity.active_agents, 0);
        assert_eq!(report.story_metrics.total_stories, 0);
        assert_eq!(
            report.system_health,
            SystemHealth {
                linear_connected: false,
                stories_directory: false,
                agents_directory: false,
                debug_directory: false,
            }
        );
    }

    #[test]
    fn counts_stories_and_active_agents() {
        let dir = tempfile::tempdir().unwrap();
        let stories = dir.path().join("docs/stories");
        std::fs::create_dir_all(&stories).unwrap();
        std::fs::write(stories.join("1.md"), "# A\n## Story Metadata\n**Status:** done\n").unwrap();
        std::fs::write(stories.join("2.md"), "# B\n## Story Metadata\n**Status:** ready\n").unwrap();
        std::fs::write(stories.join("3.md"), "untitled\n").unwrap();
        let debug = dir.path().join(".bmad-core/debug");
        append_activity(&debug, &ActivityEntry::now("dev", "x")).unwrap();

        let report = build_report(&synchronizer(dir.path(), Some("key")));
        assert_eq!(report.story_metrics.total_stories, 2);
        assert_eq!(report.story_metrics.completed_stories, 1);
        assert_eq!(report.agent_activity.active_agents, 1);
        assert!(report.system_health.linear_connected);
        assert!(report.system_health.stories_directory);
        assert!(report.system_health.debug_directory);
    }

    #[test]
    fn writes_camel_case_json() {
        let dir = tempfile::tempdir().unwrap();
        let (report, path) = generate_performance_report(&synchronizer(dir.path(), None)).unwrap();
        assert_eq!(path, dir.path().join(".bmad-core/debug/performance-report.json"));

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"agentActivity\""));
        assert!(written.contains("\"linearConnected\": false"));
        let parsed: PerformanceReport = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, report);
    }
}
