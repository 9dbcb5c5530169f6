//! Error types for queue-herald.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::QueueId;

#[derive(Debug, Error)]
pub enum Error {
    /// The project behind a queue does not exist (or is invisible to the token).
    #[error("queue not found: {0}")]
    NotFound(QueueId),

    #[error("queue source error: {0}")]
    Source(String),

    #[error("state storage error at {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt state file {}: {source}", .path.display())]
    CorruptState {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "notification failed{}: {details}",
        .status.map(|s| format!(" with status {s}")).unwrap_or_default()
    )]
    Notify { status: Option<u16>, details: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
