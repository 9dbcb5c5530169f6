//! Runner: watch every configured queue once, in order.

use tracing::{error, info};

use super::watcher::{QueueWatcher, WatchOutcome, WatchSettings};
use crate::error::{Error, Result};
use crate::model::QueueId;
use crate::notify::Notifier;
use crate::source::QueueSource;
use crate::storage::StateStore;

/// What to do with the remaining queues after one fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Keep going; report every failure at the end.
    #[default]
    Isolate,
    /// Stop at the first failed queue.
    HaltOnFirst,
}

/// Result of one pass over all queues.
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<(QueueId, WatchOutcome)>,
    pub failures: Vec<(QueueId, Error)>,
    /// Queues not attempted because an earlier one failed under
    /// [`FailurePolicy::HaltOnFirst`].
    pub not_attempted: Vec<QueueId>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn outcome(&self, queue: QueueId) -> Option<&WatchOutcome> {
        self.outcomes
            .iter()
            .find(|(q, _)| *q == queue)
            .map(|(_, outcome)| outcome)
    }
}

pub struct Runner<'a> {
    source: &'a dyn QueueSource,
    store: &'a dyn StateStore,
    notifier: &'a dyn Notifier,
    settings: WatchSettings,
    policy: FailurePolicy,
}

impl<'a> Runner<'a> {
    pub fn new(
        source: &'a dyn QueueSource,
        store: &'a dyn StateStore,
        notifier: &'a dyn Notifier,
        settings: WatchSettings,
    ) -> Self {
        Self {
            source,
            store,
            notifier,
            settings,
            policy: FailurePolicy::default(),
        }
    }

    pub fn policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Watch each queue in order.
    ///
    /// Returns `Err` only if the automation user cannot be resolved, since
    /// no queue can be watched without it. Per-queue failures land in the
    /// report.
    pub async fn run(&self, queues: &[QueueId]) -> Result<RunReport> {
        let actor = self.source.current_actor().await?;
        let mut report = RunReport::default();

        for (i, &queue) in queues.iter().enumerate() {
            let watcher =
                QueueWatcher::new(queue, self.source, self.store, self.notifier, &self.settings);
            match watcher.run(&actor).await {
                Ok(outcome) => {
                    info!(queue_id = %queue, outcome = outcome.label(), "queue watched");
                    report.outcomes.push((queue, outcome));
                }
                Err(e) => {
                    error!(queue_id = %queue, "queue watch failed: {e}");
                    report.failures.push((queue, e));
                    if self.policy == FailurePolicy::HaltOnFirst {
                        report.not_attempted.extend_from_slice(&queues[i + 1..]);
                        break;
                    }
                }
            }
        }

        Ok(report)
    }
}
