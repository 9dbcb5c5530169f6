//! Queue watcher: change detection and notification gating for one queue.
//!
//! Pipeline per run: fetch → compare → persist → decide → notify.
//! The snapshot is saved before anything is published.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use opentelemetry::KeyValue;
use tracing::{Instrument, debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{Actor, QueueId, QueueItem, Snapshot};
use crate::notify::Notifier;
use crate::source::QueueSource;
use crate::storage::StateStore;
use crate::telemetry::metrics;
use crate::telemetry::watch::{record_outcome, start_watch_span};

/// Per-run settings shared by every watcher.
#[derive(Debug, Clone)]
pub struct WatchSettings {
    /// Chat destination (Slack channel).
    pub destination: String,
    /// Queues shorter than this are not posted.
    pub min_queue_depth: usize,
}

/// Why a changed queue was not posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suppressed {
    Empty,
    BelowThreshold,
}

/// Terminal state of a watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    /// The queue does not exist; nothing fetched or stored.
    NotFoundSkipped,
    /// Same snapshot as last time; nothing stored or posted.
    Unchanged,
    /// New snapshot stored, but not worth posting.
    Suppressed { items: usize, reason: Suppressed },
    /// New snapshot stored and posted.
    Notified { items: usize },
}

impl WatchOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            WatchOutcome::NotFoundSkipped => "not_found",
            WatchOutcome::Unchanged => "unchanged",
            WatchOutcome::Suppressed { .. } => "suppressed",
            WatchOutcome::Notified { .. } => "notified",
        }
    }

    /// Item count, for outcomes that got as far as a changed snapshot.
    pub fn items(&self) -> Option<usize> {
        match self {
            WatchOutcome::Suppressed { items, .. } | WatchOutcome::Notified { items } => {
                Some(*items)
            }
            _ => None,
        }
    }
}

/// Watches a single queue. Cheap to build; one per queue per run.
pub struct QueueWatcher<'a> {
    queue: QueueId,
    source: &'a dyn QueueSource,
    store: &'a dyn StateStore,
    notifier: &'a dyn Notifier,
    settings: &'a WatchSettings,
}

impl<'a> QueueWatcher<'a> {
    pub fn new(
        queue: QueueId,
        source: &'a dyn QueueSource,
        store: &'a dyn StateStore,
        notifier: &'a dyn Notifier,
        settings: &'a WatchSettings,
    ) -> Self {
        Self {
            queue,
            source,
            store,
            notifier,
            settings,
        }
    }

    /// Run the pipeline once for the queue's items assigned to `actor`.
    pub async fn run(&self, actor: &Actor) -> Result<WatchOutcome> {
        let span = start_watch_span(self.queue);
        let result = self.run_inner(actor).instrument(span.clone()).await;

        let label = match &result {
            Ok(outcome) => {
                record_outcome(&span, outcome);
                outcome.label()
            }
            Err(_) => "failed",
        };
        metrics::watch_outcomes().add(1, &[KeyValue::new("outcome", label)]);
        result
    }

    async fn run_inner(&self, actor: &Actor) -> Result<WatchOutcome> {
        // Fetch
        let fetched = async {
            let name = self.source.queue_name(self.queue).await?;
            let items = self
                .source
                .fetch_assigned_open_items(self.queue, actor)
                .await?;
            Ok::<_, Error>((name, items))
        }
        .await;
        let (name, items) = match fetched {
            Ok(fetched) => fetched,
            Err(e) if e.is_not_found() => {
                warn!(queue_id = %self.queue, "queue not found, ignoring");
                return Ok(WatchOutcome::NotFoundSkipped);
            }
            Err(e) => return Err(e),
        };
        metrics::queue_depth().record(items.len() as u64, &[]);

        // Compare
        let current = Snapshot::from_items(&items);
        let previous = self.store.load(self.queue)?.unwrap_or_default();
        if current == previous {
            debug!(
                queue_id = %self.queue,
                "assigned merge requests unchanged since last run, not posting"
            );
            return Ok(WatchOutcome::Unchanged);
        }

        // Persist; must complete before any publish
        self.store.save(self.queue, &current)?;

        // Decide
        let count = items.len();
        if count == 0 {
            debug!(queue_id = %self.queue, "no merge requests assigned, not posting");
            return Ok(WatchOutcome::Suppressed {
                items: 0,
                reason: Suppressed::Empty,
            });
        }
        if count < self.settings.min_queue_depth {
            debug!(
                queue_id = %self.queue,
                items = count,
                threshold = self.settings.min_queue_depth,
                "queue below posting threshold, not posting"
            );
            return Ok(WatchOutcome::Suppressed {
                items: count,
                reason: Suppressed::BelowThreshold,
            });
        }

        // Notify
        let body = render_queue(&items, Utc::now());
        let published = self
            .notifier
            .publish(&self.settings.destination, &queue_title(&name), &body)
            .await;
        let result_label = if published.is_ok() { "ok" } else { "error" };
        metrics::notifications().add(1, &[KeyValue::new("result", result_label)]);
        published?;

        info!(queue_id = %self.queue, items = count, "posted queue");
        Ok(WatchOutcome::Notified { items: count })
    }
}

/// Title of the chat message for a queue.
pub fn queue_title(queue_name: &str) -> String {
    format!("{queue_name} pending merge requests")
}

/// Render items as a numbered Slack mrkdwn list, one line per item.
///
/// `now` only feeds the displayed wait time; it never touches snapshots.
pub fn render_queue(items: &[QueueItem], now: DateTime<Utc>) -> String {
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        let waited = (now - item.assigned_at).num_seconds().div_euclid(60);
        let _ = writeln!(
            out,
            "{}. <{}|{}> (!{}. Time in queue: {}m)",
            i + 1,
            item.url,
            item.title,
            item.id,
            waited
        );
    }
    out
}
