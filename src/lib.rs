//! # queue-herald
//!
//! Watches the merge requests assigned to an automation user in one or more
//! GitLab projects and posts the queue to Slack when it changes.
//!
//! Each invocation checks every configured project once and exits; schedule
//! it externally (systemd timer, cron).

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod notify;
pub mod source;
pub mod storage;
pub mod telemetry;
