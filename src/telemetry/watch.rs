//! Queue watch span helpers.
//!
//! One span per queue per run; the outcome is recorded on it once the
//! watcher reaches a terminal state.

use tracing::Span;

use crate::engine::WatchOutcome;
use crate::model::QueueId;

/// Start a span for watching one queue.
///
/// The `queue.outcome` and `queue.items` fields are declared empty and
/// filled by [`record_outcome`].
pub fn start_watch_span(queue: QueueId) -> Span {
    tracing::info_span!(
        "queue.watch",
        "queue.id" = queue.0,
        "queue.outcome" = tracing::field::Empty,
        "queue.items" = tracing::field::Empty,
    )
}

/// Record the terminal outcome of a watch on its span.
pub fn record_outcome(span: &Span, outcome: &WatchOutcome) {
    span.record("queue.outcome", outcome.label());
    if let Some(items) = outcome.items() {
        span.record("queue.items", items as u64);
    }
}
