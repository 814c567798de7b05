use clap::Parser;
use std::path::PathBuf;

use crate::report;
use crate::sync::Synchronizer;

#[derive(Parser, Debug)]
#[command(
    name = "bmad-sync",
    about = "Sync BMAD stories with Linear issues",
    version
)]
pub struct Cli {
    /// Project root (default: current directory)
    #[arg(long, env = "BMAD_ROOT")]
    pub root: Option<PathBuf>,

    /// Set up Linear projects, workflow states and the current cycle
    #[arg(long)]
    pub setup: bool,

    /// Sync existing stories to Linear
    #[arg(long)]
    pub sync: bool,

    /// Generate a performance report
    #[arg(long)]
    pub report: bool,

    /// Record an activity for AGENT (use with --activity)
    #[arg(long, value_name = "AGENT", requires = "activity")]
    pub track: Option<String>,

    /// Activity description for --track
    #[arg(long, value_name = "TEXT", requires = "track")]
    pub activity: Option<String>,

    /// Mark STORY done if its Dev Agent Record checklist is complete
    #[arg(long, value_name = "STORY")]
    pub check: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Usage,
    Setup,
    Sync,
    Report,
    Track { agent: String, activity: String },
    Check(PathBuf),
}

impl Cli {
    /// The mode to run. When several flags are given the first of setup,
    /// sync, report, track, check wins.
    pub fn mode(&self) -> Mode {
        if self.setup {
            Mode::Setup
        } else if self.sync {
            Mode::Sync
        } else if self.report {
            Mode::Report
        } else if let (Some(agent), Some(activity)) = (&self.track, &self.activity) {
            Mode::Track {
                agent: agent.clone(),
                activity: activity.clone(),
            }
        } else if let Some(story) = &self.check {
            Mode::Check(story.clone())
        } else {
            Mode::Usage
        }
    }

    fn resolve_root(&self) -> PathBuf {
        self.root
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Run the selected mode. Failures are logged, never returned.
pub async fn run(cli: Cli) {
    let mode = cli.mode();
    if mode == Mode::Usage {
        print_usage();
        return;
    }

    let mut sync = Synchronizer::from_workspace(&cli.resolve_root());

    match mode {
        Mode::Usage => {}
        Mode::Setup => sync.setup_workspace().await,
        Mode::Sync => {
            tracing::info!("Syncing stories to Linear...");
            if sync.is_connected() {
                sync.setup_workspace().await;
            }
            sync.sync_existing_stories().await;
        }
        Mode::Report => {
            tracing::info!("Generating performance report...");
            match report::generate_performance_report(&sync) {
                Ok((report, path)) => {
                    tracing::info!("Report written to {}", path.display());
                    match serde_json::to_string_pretty(&report) {
                        Ok(json) => println!("{json}"),
                        Err(e) => tracing::error!("Failed to render report: {e}"),
                    }
                }
                Err(e) => tracing::error!("Failed to generate performance report: {e:#}"),
            }
        }
        Mode::Track { agent, activity } => {
            if let Err(e) = sync.track_agent_activity(&agent, &activity).await {
                tracing::error!("Failed to track activity for {agent}: {e:#}");
            }
        }
        Mode::Check(story) => {
            if sync.is_connected() {
                sync.setup_workspace().await;
            }
            match sync.check_story_completion(&story).await {
                Ok(true) => {}
                Ok(false) => tracing::info!("{} is not ready to complete", story.display()),
                Err(e) => tracing::error!("Failed to check {}: {e:#}", story.display()),
            }
        }
    }
}

pub fn print_usage() {
    println!("bmad-sync: BMAD story / Linear synchronizer\n");
    println!("USAGE:");
    println!("  bmad-sync --setup                           Set up Linear workspace");
    println!("  bmad-sync --sync                            Sync existing stories");
    println!("  bmad-sync --report                          Generate performance report");
    println!("  bmad-sync --track <agent> --activity <text> Record agent activity");
    println!("  bmad-sync --check <story>                   Complete a finished story");
    println!();
    println!("OPTIONS:");
    println!("  --root <dir>  Project root (default: current directory, env BMAD_ROOT)");
    println!();
    println!("Set LINEAR_API_KEY to enable Linear integration.");
}
