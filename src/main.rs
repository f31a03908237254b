use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use clipper_studio::config::{AppPaths, FileStore, create_workspace_directories, next_workspace_id};
use clipper_studio::pipeline::{Collaborators, LayoutStore, settings_or_default};
use clipper_studio::queue::{
    ChannelObserver, ControllerOptions, JobStage, ProgressEvent, WorkspaceRegistry,
};
use clipper_studio::schedule::{PlanPolicy, estimate_completion, plan_clips};
use clipper_studio::utils::{DependencyStatus, format_duration, init_logging};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::mpsc;

#[derive(Parser)]
#[command(name = "clipper", version, about = "Cut videos into scheduled vertical clips")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download, clip and publish the given URLs in one workspace
    Run {
        #[arg(short, long, default_value_t = 1)]
        workspace: u32,
        /// Seed for publication delays
        #[arg(long)]
        seed: Option<u64>,
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Print the clip plan for a video length
    Plan {
        /// Source length in seconds
        #[arg(short, long)]
        duration: f64,
        #[arg(short, long, default_value_t = 1)]
        workspace: u32,
    },
    /// Inspect or edit workspace layouts
    Layout {
        #[command(subcommand)]
        action: LayoutAction,
    },
    /// List workspaces
    Workspaces {
        /// Create the next free workspace
        #[arg(long)]
        new: bool,
    },
    /// Check that the external tools can be found
    Check,
}

#[derive(Subcommand)]
enum LayoutAction {
    Show {
        #[arg(default_value_t = 1)]
        workspace: u32,
    },
    Reset {
        workspace: u32,
    },
    Copy {
        from: u32,
        to: u32,
    },
}

/// Display label of a job stage
fn stage_label(stage: JobStage) -> &'static str {
    match stage {
        JobStage::Queued => "Queued",
        JobStage::Downloading => "Downloading",
        JobStage::Processing => "Processing",
        JobStage::Publishing => "Publishing",
        JobStage::Completed => "Completed",
        JobStage::Failed => "Failed",
    }
}

fn print_event(event: &ProgressEvent) {
    let short_id: String = event.job.identifier.chars().take(8).collect();
    println!(
        "{} [ws {}] {} {:<11} {}",
        event.at.format("%H:%M:%S"),
        event.job.workspace_id,
        short_id,
        stage_label(event.stage),
        event.message
    );
}

fn run(paths: &AppPaths, workspace: u32, seed: Option<u64>, urls: &[String]) -> anyhow::Result<()> {
    let store = Arc::new(FileStore::new(paths.clone()));
    let registry = WorkspaceRegistry::with_options(
        Collaborators::system(paths),
        paths.workspaces_dir(),
        ControllerOptions {
            rng_seed: seed,
            ..ControllerOptions::default()
        },
    );

    let (tx, rx) = mpsc::channel();
    let controller = registry
        .get_or_create(workspace, store, Arc::new(ChannelObserver::new(tx)))
        .with_context(|| format!("Failed to start workspace {}", workspace))?;

    let mut pending = HashSet::new();
    for url in urls {
        let job = controller.submit(url)?;
        pending.insert(job.identifier);
    }

    let mut failed = 0;
    while !pending.is_empty() {
        let Ok(event) = rx.recv() else {
            break;
        };
        print_event(&event);
        match event.stage {
            JobStage::Publishing if event.message == "Publishing clips" => {
                if let Some(eta) = controller.estimate_completion(&event.job) {
                    println!("  estimated time to publish all clips: {}", eta);
                }
            }
            JobStage::Completed | JobStage::Failed => {
                if event.stage == JobStage::Failed {
                    failed += 1;
                }
                pending.remove(&event.job.identifier);
            }
            _ => {}
        }
    }

    registry.stop_all();
    if failed > 0 {
        bail!("{} of {} jobs failed", failed, urls.len());
    }
    Ok(())
}

fn plan(paths: &AppPaths, workspace: u32, duration: f64) -> anyhow::Result<()> {
    let settings = settings_or_default(&FileStore::new(paths.clone()), workspace);
    let clips = plan_clips(duration, PlanPolicy::from(&settings.rendering));
    if clips.is_empty() {
        bail!("A duration of {} seconds yields no clips", duration);
    }

    for clip in &clips {
        println!(
            "clip_{:03}  {:>9.2}s - {:>9.2}s  ({})",
            clip.index,
            clip.start,
            clip.end,
            format_duration(clip.duration.round() as u64)
        );
    }
    let base = settings.publication.publish_interval.seconds;
    if let Some(eta) = estimate_completion(&clips, base) {
        println!(
            "{} clips, published every {} in about {}",
            clips.len(),
            settings.publication.publish_interval,
            eta
        );
    }
    Ok(())
}

fn layout(paths: &AppPaths, action: LayoutAction) -> anyhow::Result<()> {
    let store = FileStore::new(paths.clone());
    let layout = match action {
        LayoutAction::Show { workspace } => store.load_layout(workspace)?,
        LayoutAction::Reset { workspace } => store.reset_layout(workspace)?,
        LayoutAction::Copy { from, to } => store.duplicate_layout(from, to)?,
    };
    println!("{}", layout.to_json()?);
    Ok(())
}

fn workspaces(paths: &AppPaths, new: bool) -> anyhow::Result<()> {
    let mut ids = paths.workspace_ids()?;
    if new {
        let id = next_workspace_id(&ids);
        create_workspace_directories(&paths.workspaces_dir(), id)?;
        println!("Created workspace {}", id);
        ids.push(id);
    }
    for id in ids {
        println!("workspace {}  {}", id, paths.workspace_dirs(id).root.display());
    }
    Ok(())
}

fn check(paths: &AppPaths) -> anyhow::Result<()> {
    let status = DependencyStatus::check(&paths.tools_dir());
    for (name, path) in &status.found {
        match path {
            Some(path) => println!("{:<8} {}", name, path.display()),
            None => println!("{:<8} missing", name),
        }
    }
    if !status.ready() {
        bail!(
            "Required tools are missing. Install them or copy them into '{}'.",
            paths.tools_dir().display()
        );
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let paths = AppPaths::from_env();
    let _guard = init_logging(&paths.logs_dir());

    match cli.command {
        Command::Run {
            workspace,
            seed,
            urls,
        } => run(&paths, workspace, seed, &urls),
        Command::Plan {
            duration,
            workspace,
        } => plan(&paths, workspace, duration),
        Command::Layout { action } => layout(&paths, action),
        Command::Workspaces { new } => workspaces(&paths, new),
        Command::Check => check(&paths),
    }
}
