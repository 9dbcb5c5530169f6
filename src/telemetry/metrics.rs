//! Metric instrument factories for queue-herald.
//!
//! Uses the OTel Meter API with the globally-registered `MeterProvider`.
//! Without an OTLP endpoint the global provider is a no-op.

use opentelemetry::metrics::{Counter, Histogram, Meter};

fn meter() -> Meter {
    opentelemetry::global::meter("queue-herald")
}

/// Counter: terminal outcome of each queue watch.
/// Labels: `outcome` ("not_found" | "unchanged" | "suppressed" | "notified" | "failed").
pub fn watch_outcomes() -> Counter<u64> {
    meter()
        .u64_counter("queue_herald.watch.outcomes")
        .with_description("Queue watches by terminal outcome")
        .build()
}

/// Counter: chat notifications attempted.
/// Labels: `result` ("ok" | "error").
pub fn notifications() -> Counter<u64> {
    meter()
        .u64_counter("queue_herald.notifications")
        .with_description("Queue notifications published")
        .build()
}

/// Histogram: number of items assigned to the automation user per fetch.
pub fn queue_depth() -> Histogram<u64> {
    meter()
        .u64_histogram("queue_herald.queue.depth")
        .with_description("Merge requests assigned to the automation user")
        .build()
}
