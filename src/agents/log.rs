use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::util::fs::append_line;
use crate::util::slug::file_safe;

const LOG_PREFIX: &str = "agent-activity-";
const LOG_SUFFIX: &str = ".log";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub agent: String,
    pub activity: String,
    pub timestamp: String,
}

impl ActivityEntry {
    pub fn now(agent: &str, activity: &str) -> Self {
        Self {
            agent: agent.to_string(),
            activity: activity.to_string(),
            timestamp: utc_timestamp(),
        }
    }
}

/// RFC 3339 UTC with millisecond precision, e.g. `2026-10-16T09:30:00.123Z`.
pub fn utc_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn log_path(debug_dir: &Path, agent: &str) -> PathBuf {
    debug_dir.join(format!("{LOG_PREFIX}{}{LOG_SUFFIX}", file_safe(agent)))
}

/// Append one JSON line to the agent's activity log.
pub fn append_activity(debug_dir: &Path, entry: &ActivityEntry) -> Result<PathBuf> {
    let path = log_path(debug_dir, &entry.agent);
    let line = serde_json::to_string(entry)?;
    append_line(&path, &line)?;
    Ok(path)
}

/// Number of agents with a non-empty activity log.
pub fn active_agent_count(debug_dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(debug_dir) else {
        return 0;
    };
    entries
        .filter_map(|e| e.ok())
        .filter(|e| {
            let name = e.file_name();
            let name = name.to_string_lossy();
            name.starts_with(LOG_PREFIX) && name.ends_with(LOG_SUFFIX)
        })
        .filter(|e| e.metadata().map(|m| m.is_file() && m.len() > 0).unwrap_or(false))
        .count()
}
