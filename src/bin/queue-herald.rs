//! queue-herald CLI: post the automation user's merge-request queue to Slack.

use chrono::Utc;
use clap::{Parser, Subcommand};
use queue_herald::config::Config;
use queue_herald::engine::{FailurePolicy, Runner, WatchSettings, queue_title, render_queue};
use queue_herald::model::QueueId;
use queue_herald::notify::SlackWebhook;
use queue_herald::source::{GitLabClient, QueueSource};
use queue_herald::storage::{FileStateStore, StateStore};
use queue_herald::telemetry::{TelemetryConfig, init_telemetry};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "queue-herald",
    about = "Post the merge requests assigned to an automation user to Slack"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check every configured project once and post changed queues
    Run {
        /// Stop at the first project that fails instead of continuing
        #[arg(long)]
        fail_fast: bool,
    },
    /// Print the stored snapshot of a project's queue
    State {
        /// GitLab project ID
        queue: QueueId,
    },
    /// Fetch and render a project's queue without storing or posting it
    Preview {
        /// GitLab project ID
        queue: QueueId,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Validate before any network activity
    let config = Config::from_env()?;

    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "queue-herald".to_string(),
        default_level: config.log_level.clone(),
    })?;

    match cli.command {
        Command::Run { fail_fast } => cmd_run(&config, fail_fast).await,
        Command::State { queue } => cmd_state(&config, queue),
        Command::Preview { queue } => cmd_preview(&config, queue).await,
    }
}

async fn cmd_run(config: &Config, fail_fast: bool) -> anyhow::Result<()> {
    let source = GitLabClient::new(&config.gitlab_url, &config.gitlab_token, config.http_timeout)?;
    let mut notifier = SlackWebhook::new(config.slack_webhook_url.clone(), config.http_timeout)?;
    if let Some(ref emoji) = config.slack_icon_emoji {
        notifier = notifier.icon_emoji(emoji);
    }
    let store = FileStateStore::new(config.state_file_prefix());

    let settings = WatchSettings {
        destination: config.slack_channel.clone(),
        min_queue_depth: config.min_queue_depth,
    };
    let policy = if fail_fast {
        FailurePolicy::HaltOnFirst
    } else {
        FailurePolicy::Isolate
    };

    let report = Runner::new(&source, &store, &notifier, settings)
        .policy(policy)
        .run(&config.queue_ids)
        .await?;

    info!(
        watched = report.outcomes.len(),
        failed = report.failures.len(),
        not_attempted = report.not_attempted.len(),
        "run finished"
    );

    if !report.is_success() {
        let failed: Vec<String> = report
            .failures
            .iter()
            .map(|(queue, e)| format!("project {queue}: {e}"))
            .collect();
        anyhow::bail!("{} project(s) failed: {}", failed.len(), failed.join("; "));
    }
    Ok(())
}

fn cmd_state(config: &Config, queue: QueueId) -> anyhow::Result<()> {
    let store = FileStateStore::new(config.state_file_prefix());
    match store.load(queue)? {
        None => println!("No state stored for project {queue} ({}).", store.path_for(queue).display()),
        Some(snapshot) if snapshot.is_empty() => println!("Project {queue}: queue empty."),
        Some(snapshot) => {
            println!("{:<8}  ASSIGNED AT", "MR");
            println!("{}", "-".repeat(40));
            for entry in snapshot.entries() {
                let assigned = chrono::DateTime::from_timestamp(entry.assigned_at, 0)
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                    .unwrap_or_else(|| entry.assigned_at.to_string());
                println!("{:<8}  {assigned}", format!("!{}", entry.id));
            }
            println!("\n{} item(s)", snapshot.len());
        }
    }
    Ok(())
}

async fn cmd_preview(config: &Config, queue: QueueId) -> anyhow::Result<()> {
    let source = GitLabClient::new(&config.gitlab_url, &config.gitlab_token, config.http_timeout)?;
    let actor = source.current_actor().await?;
    let name = source.queue_name(queue).await?;
    let items = source.fetch_assigned_open_items(queue, &actor).await?;

    println!("{}", queue_title(&name));
    if items.is_empty() {
        println!("No merge requests assigned to @{}.", actor.username);
    } else {
        print!("{}", render_queue(&items, Utc::now()));
    }
    if items.len() < config.min_queue_depth {
        println!(
            "(below the posting threshold of {}; a run would not post this)",
            config.min_queue_depth
        );
    }
    Ok(())
}
