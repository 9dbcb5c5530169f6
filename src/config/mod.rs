//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast if required vars are missing.
//! Every missing or malformed variable is reported, not just the first.
//! Sensitive values wrapped in secrecy::SecretString to prevent log leaks.

pub mod secrets;

use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;

use crate::error::{Error, Result};
use crate::model::QueueId;

pub const PROJECT_IDS: &str = "QUEUE_HERALD_PROJECT_IDS";
pub const GITLAB_URL: &str = "QUEUE_HERALD_GITLAB_URL";
pub const GITLAB_TOKEN: &str = "QUEUE_HERALD_GITLAB_TOKEN";
pub const SLACK_CHANNEL: &str = "QUEUE_HERALD_SLACK_CHANNEL";
pub const SLACK_WEBHOOK_URL: &str = "QUEUE_HERALD_SLACK_WEBHOOK_URL";
pub const STATE_FILE_PREFIX: &str = "QUEUE_HERALD_STATE_FILE_PREFIX";
pub const SLACK_ICON_EMOJI: &str = "QUEUE_HERALD_SLACK_ICON_EMOJI";
pub const MIN_QUEUE_DEPTH: &str = "QUEUE_HERALD_MIN_QUEUE_DEPTH";
pub const HTTP_TIMEOUT_SECS: &str = "QUEUE_HERALD_HTTP_TIMEOUT_SECS";

/// Smallest queue worth posting about.
pub const DEFAULT_MIN_QUEUE_DEPTH: usize = 2;
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug)]
pub struct Config {
    pub queue_ids: Vec<QueueId>,
    pub gitlab_url: String,
    pub gitlab_token: SecretString,
    pub slack_channel: String,
    pub slack_webhook_url: SecretString,
    /// State for queue `N` lives at `<prefix>-N.json`.
    pub state_file_prefix: PathBuf,
    pub slack_icon_emoji: Option<String>,
    pub min_queue_depth: usize,
    pub http_timeout: Duration,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    /// In production, systemd EnvironmentFile provides the vars.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut problems = Vec::new();
        let mut required = |name: &str, what: &str| -> String {
            match lookup(name).filter(|v| !v.trim().is_empty()) {
                Some(value) => value,
                None => {
                    problems.push(format!("{name} must be set to {what}"));
                    String::new()
                }
            }
        };

        let project_ids = required(PROJECT_IDS, "a comma-separated list of GitLab project IDs");
        let gitlab_url = required(GITLAB_URL, "the full GitLab installation URL");
        let gitlab_token = required(GITLAB_TOKEN, "a GitLab access token for the automation user");
        let slack_channel = required(SLACK_CHANNEL, "the Slack channel to post the queue to");
        let slack_webhook_url = required(SLACK_WEBHOOK_URL, "the Slack incoming webhook URL");
        let state_file_prefix = required(
            STATE_FILE_PREFIX,
            "the directory + file name prefix for state files (<prefix>-<project-id>.json)",
        );

        let queue_ids = if project_ids.is_empty() {
            Vec::new()
        } else {
            match parse_queue_ids(&project_ids) {
                Ok(ids) => ids,
                Err(e) => {
                    problems.push(e);
                    Vec::new()
                }
            }
        };

        let min_queue_depth = match lookup(MIN_QUEUE_DEPTH) {
            None => DEFAULT_MIN_QUEUE_DEPTH,
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n >= 1 => n,
                _ => {
                    problems.push(format!(
                        "{MIN_QUEUE_DEPTH} must be a positive integer, got {raw:?}"
                    ));
                    DEFAULT_MIN_QUEUE_DEPTH
                }
            },
        };

        let http_timeout = match lookup(HTTP_TIMEOUT_SECS) {
            None => DEFAULT_HTTP_TIMEOUT,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    problems.push(format!(
                        "{HTTP_TIMEOUT_SECS} must be a positive number of seconds, got {raw:?}"
                    ));
                    DEFAULT_HTTP_TIMEOUT
                }
            },
        };

        if !problems.is_empty() {
            return Err(Error::Config(problems.join("; ")));
        }

        // DEBUG (any value) wins over LOG_LEVEL
        let log_level = if lookup("DEBUG").is_some() {
            "debug".to_string()
        } else {
            lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string())
        };

        Ok(Self {
            queue_ids,
            gitlab_url: gitlab_url.trim_end_matches('/').to_string(),
            gitlab_token: SecretString::from(gitlab_token),
            slack_channel,
            slack_webhook_url: SecretString::from(slack_webhook_url),
            state_file_prefix: PathBuf::from(state_file_prefix),
            slack_icon_emoji: lookup(SLACK_ICON_EMOJI).filter(|v| !v.trim().is_empty()),
            min_queue_depth,
            http_timeout,
            otel_endpoint: lookup("OTEL_ENDPOINT"),
            log_level,
        })
    }

    pub fn state_file_prefix(&self) -> &Path {
        &self.state_file_prefix
    }
}

fn parse_queue_ids(raw: &str) -> std::result::Result<Vec<QueueId>, String> {
    let mut ids = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let id = part
            .parse::<QueueId>()
            .map_err(|_| format!("{PROJECT_IDS} contains an invalid project ID: {part:?}"))?;
        ids.push(id);
    }
    if ids.is_empty() {
        return Err(format!("{PROJECT_IDS} does not contain any project ID"));
    }
    Ok(ids)
}
