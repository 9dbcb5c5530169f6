use std::collections::HashMap;
use std::time::Duration;

use queue_herald::config::{self, Config};
use queue_herald::error::Error;
use queue_herald::model::QueueId;
use secrecy::ExposeSecret;

fn complete_env() -> HashMap<&'static str, String> {
    HashMap::from([
        (config::PROJECT_IDS, "12, 34".to_string()),
        (config::GITLAB_URL, "https://gitlab.example.com/".to_string()),
        (config::GITLAB_TOKEN, "glpat-test".to_string()),
        (config::SLACK_CHANNEL, "#merge-queue".to_string()),
        (config::SLACK_WEBHOOK_URL, "https://hooks.slack.test/T/B/X".to_string()),
        (config::STATE_FILE_PREFIX, "/var/lib/queue-herald/state".to_string()),
    ])
}

fn load(env: &HashMap<&'static str, String>) -> Result<Config, Error> {
    Config::from_lookup(|name| env.get(name).cloned())
}

#[test]
fn config_from_env_loads_required_fields() {
    // Only this test touches the process environment
    unsafe {
        for (name, value) in complete_env() {
            std::env::set_var(name, value);
        }
    }

    let config = Config::from_env().unwrap();
    assert_eq!(config.queue_ids, vec![QueueId(12), QueueId(34)]);
    assert!(!config.log_level.is_empty());

    unsafe {
        for (name, _) in complete_env() {
            std::env::remove_var(name);
        }
    }
}

#[test]
fn parses_complete_configuration() {
    let config = load(&complete_env()).unwrap();

    assert_eq!(config.queue_ids, vec![QueueId(12), QueueId(34)]);
    assert_eq!(config.gitlab_url, "https://gitlab.example.com");
    assert_eq!(config.gitlab_token.expose_secret(), "glpat-test");
    assert_eq!(config.slack_channel, "#merge-queue");
    assert_eq!(
        config.slack_webhook_url.expose_secret(),
        "https://hooks.slack.test/T/B/X"
    );
    assert_eq!(
        config.state_file_prefix(),
        std::path::Path::new("/var/lib/queue-herald/state")
    );
    assert_eq!(config.min_queue_depth, config::DEFAULT_MIN_QUEUE_DEPTH);
    assert_eq!(config.http_timeout, config::DEFAULT_HTTP_TIMEOUT);
    assert_eq!(config.slack_icon_emoji, None);
    assert_eq!(config.log_level, "info");
}

#[test]
fn reports_every_missing_variable() {
    let err = load(&HashMap::new()).unwrap_err();

    let Error::Config(message) = err else {
        panic!("expected a configuration error, got {err:?}");
    };
    for name in [
        config::PROJECT_IDS,
        config::GITLAB_URL,
        config::GITLAB_TOKEN,
        config::SLACK_CHANNEL,
        config::SLACK_WEBHOOK_URL,
        config::STATE_FILE_PREFIX,
    ] {
        assert!(message.contains(name), "{name} missing from: {message}");
    }
}

#[test]
fn blank_value_counts_as_missing() {
    let mut env = complete_env();
    env.insert(config::SLACK_CHANNEL, "  ".to_string());

    let err = load(&env).unwrap_err();
    assert!(err.to_string().contains(config::SLACK_CHANNEL));
}

#[test]
fn rejects_non_numeric_project_ids() {
    let mut env = complete_env();
    env.insert(config::PROJECT_IDS, "12,group/project".to_string());

    let err = load(&env).unwrap_err();
    assert!(err.to_string().contains("group/project"));
}

#[test]
fn optional_settings_override_defaults() {
    let mut env = complete_env();
    env.insert(config::MIN_QUEUE_DEPTH, "5".to_string());
    env.insert(config::HTTP_TIMEOUT_SECS, "10".to_string());
    env.insert(config::SLACK_ICON_EMOJI, ":robot_face:".to_string());
    env.insert("LOG_LEVEL", "warn".to_string());

    let config = load(&env).unwrap();
    assert_eq!(config.min_queue_depth, 5);
    assert_eq!(config.http_timeout, Duration::from_secs(10));
    assert_eq!(config.slack_icon_emoji.as_deref(), Some(":robot_face:"));
    assert_eq!(config.log_level, "warn");
}

#[test]
fn zero_queue_depth_is_rejected() {
    let mut env = complete_env();
    env.insert(config::MIN_QUEUE_DEPTH, "0".to_string());

    let err = load(&env).unwrap_err();
    assert!(err.to_string().contains(config::MIN_QUEUE_DEPTH));
}

#[test]
fn debug_flag_forces_debug_logging() {
    let mut env = complete_env();
    env.insert("LOG_LEVEL", "warn".to_string());
    env.insert("DEBUG", "1".to_string());

    assert_eq!(load(&env).unwrap().log_level, "debug");
}
