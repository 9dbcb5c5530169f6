//! Chat notifications.

pub mod slack;

use async_trait::async_trait;

use crate::error::Result;

pub use slack::SlackWebhook;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Post one message to `destination`. No retries; any non-success
    /// response is an `Error::Notify`.
    async fn publish(&self, destination: &str, title: &str, body: &str) -> Result<()>;
}
