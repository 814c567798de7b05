use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CORE_DIR: &str = ".bmad-core";
pub const CONFIG_FILE: &str = "core-config.yaml";
pub const API_KEY_VAR: &str = "LINEAR_API_KEY";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkspaceConfig {
    pub version: String,
    pub slash_prefix: String,
    pub dev_story_location: String,
    pub linear: LinearSettings,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            version: "4.29.0".into(),
            slash_prefix: "YourProjectName".into(),
            dev_story_location: "docs/stories".into(),
            linear: LinearSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinearSettings {
    pub team_id: String,
    /// Workspace slug used when building issue links.
    pub workspace: String,
    /// Talk to the real GraphQL API instead of synthesizing identifiers.
    pub live: bool,
    pub endpoint: String,
}

impl Default for LinearSettings {
    fn default() -> Self {
        Self {
            team_id: "your-linear-team-id".into(),
            workspace: "your-workspace".into(),
            live: false,
            endpoint: "https://api.linear.app/graphql".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkspacePaths {
    pub story_dir: PathBuf,
    pub agent_dir: PathBuf,
    pub debug_dir: PathBuf,
}

impl WorkspacePaths {
    pub fn new(root: &Path, config: &WorkspaceConfig) -> Self {
        let core = root.join(CORE_DIR);
        Self {
            story_dir: root.join(&config.dev_story_location),
            agent_dir: core.join("agents"),
            debug_dir: core.join("debug"),
        }
    }
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CORE_DIR).join(CONFIG_FILE)
}

/// Load the workspace config, falling back to the built-in defaults when the
/// file is missing or malformed.
pub fn load_config(root: &Path) -> WorkspaceConfig {
    let path = config_path(root);
    match read_config(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load BMAD config from {}: {e:#}", path.display());
            WorkspaceConfig::default()
        }
    }
}

fn read_config(path: &Path) -> anyhow::Result<WorkspaceConfig> {
    use anyhow::Context;

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    // An empty document deserializes to unit, not a mapping.
    if contents.trim().is_empty() {
        return Ok(WorkspaceConfig::default());
    }
    let config: WorkspaceConfig =
        serde_yaml::from_str(&contents).context("Failed to parse core-config.yaml")?;
    Ok(config)
}

pub fn api_key_from_env() -> Option<String> {
    std::env::var(API_KEY_VAR)
        .ok()
        .filter(|key| !key.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &Path, yaml: &str) {
        let core = dir.join(CORE_DIR);
        std::fs::create_dir_all(&core).unwrap();
        std::fs::write(core.join(CONFIG_FILE), yaml).unwrap();
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path());
        assert_eq!(config.version, "4.29.0");
        assert_eq!(config.slash_prefix, "YourProjectName");
        assert_eq!(config.dev_story_location, "docs/stories");
        assert!(!config.linear.live);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        write_config(dir.path(), "version: [unterminated\n");
        let config = load_config(dir.path());
        assert_eq!(config.dev_story_location, "docs/stories");
    }

    #[test]
    fn partial_file_keeps_defaults_and_ignores_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        write_config(
            dir.path(),
            "version: 5.0.0\ndevStoryLocation: stories\nlinear:\n  workspace: acme\nmarkdownExploder: true\n",
        );
        let config = load_config(dir.path());
        assert_eq!(config.version, "5.0.0");
        assert_eq!(config.slash_prefix, "YourProjectName");
        assert_eq!(config.dev_story_location, "stories");
        assert_eq!(config.linear.workspace, "acme");
        assert_eq!(config.linear.team_id, "your-linear-team-id");
    }

    #[test]
    fn paths_follow_story_location() {
        let config = WorkspaceConfig {
            dev_story_location: "docs/custom".into(),
            ..WorkspaceConfig::default()
        };
        let paths = WorkspacePaths::new(Path::new("/repo"), &config);
        assert_eq!(paths.story_dir, Path::new("/repo/docs/custom"));
        assert_eq!(paths.agent_dir, Path::new("/repo/.bmad-core/agents"));
        assert_eq!(paths.debug_dir, Path::new("/repo/.bmad-core/debug"));
    }
}
