//! Queue engine: per-queue change detection and the run over all queues.

pub mod runner;
pub mod watcher;

pub use runner::{FailurePolicy, RunReport, Runner};
pub use watcher::{QueueWatcher, Suppressed, WatchOutcome, WatchSettings, queue_title, render_queue};
