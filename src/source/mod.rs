//! Where queues come from.
//!
//! [`QueueSource`] is the seam between the watcher and the review platform.
//! The GitLab implementation lives in [`gitlab`].

pub mod gitlab;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Actor, QueueId, QueueItem};

pub use gitlab::GitLabClient;

#[async_trait]
pub trait QueueSource: Send + Sync {
    /// The identity owning the credential; items assigned to it form the queue.
    async fn current_actor(&self) -> Result<Actor>;

    /// Display name of the queue. `Error::NotFound` if it does not exist.
    async fn queue_name(&self, queue: QueueId) -> Result<String>;

    /// Open items assigned to `actor`, oldest assignment first.
    /// `Error::NotFound` if the queue does not exist.
    async fn fetch_assigned_open_items(&self, queue: QueueId, actor: &Actor)
    -> Result<Vec<QueueItem>>;
}
