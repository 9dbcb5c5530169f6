//! In-memory queue source and recording notifier shared by the engine tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use queue_herald::error::{Error, Result};
use queue_herald::model::{Actor, QueueId, QueueItem};
use queue_herald::notify::Notifier;
use queue_herald::source::QueueSource;

pub fn actor() -> Actor {
    Actor {
        id: 99,
        username: "herald-bot".to_string(),
    }
}

/// Item assigned `minutes_ago` minutes before a fixed reference instant.
pub fn item(id: u64, minutes_ago: i64) -> QueueItem {
    let reference: DateTime<Utc> = "2024-06-01T12:00:00Z".parse().unwrap();
    QueueItem {
        id,
        title: format!("MR {id}"),
        url: format!("https://gitlab.example.com/group/project/-/merge_requests/{id}"),
        assigned_at: reference - Duration::minutes(minutes_ago),
    }
}

/// Queue source backed by a map. Unknown queues are `NotFound`.
#[derive(Default)]
pub struct FakeSource {
    queues: Mutex<HashMap<QueueId, (String, Vec<QueueItem>)>>,
    broken: Mutex<HashSet<QueueId>>,
    actor_broken: Mutex<bool>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_queue(&self, queue: QueueId, name: &str, items: Vec<QueueItem>) {
        self.queues
            .lock()
            .unwrap()
            .insert(queue, (name.to_string(), items));
    }

    /// Make every fetch for `queue` fail with a source error.
    pub fn break_queue(&self, queue: QueueId) {
        self.broken.lock().unwrap().insert(queue);
    }

    pub fn break_actor(&self) {
        *self.actor_broken.lock().unwrap() = true;
    }

    fn lookup(&self, queue: QueueId) -> Result<(String, Vec<QueueItem>)> {
        if self.broken.lock().unwrap().contains(&queue) {
            return Err(Error::Source(format!("GET /projects/{queue} returned 500")));
        }
        self.queues
            .lock()
            .unwrap()
            .get(&queue)
            .cloned()
            .ok_or(Error::NotFound(queue))
    }
}

#[async_trait]
impl QueueSource for FakeSource {
    async fn current_actor(&self) -> Result<Actor> {
        if *self.actor_broken.lock().unwrap() {
            return Err(Error::Source("GET /user returned 401".to_string()));
        }
        Ok(actor())
    }

    async fn queue_name(&self, queue: QueueId) -> Result<String> {
        self.lookup(queue).map(|(name, _)| name)
    }

    async fn fetch_assigned_open_items(
        &self,
        queue: QueueId,
        _actor: &Actor,
    ) -> Result<Vec<QueueItem>> {
        self.lookup(queue).map(|(_, items)| items)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub destination: String,
    pub title: String,
    pub body: String,
}

/// Notifier that records every publish attempt and can be made to fail.
#[derive(Default)]
pub struct RecordingNotifier {
    attempts: Mutex<Vec<Published>>,
    fail_with: Mutex<Option<u16>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_with(&self, status: u16) {
        *self.fail_with.lock().unwrap() = Some(status);
    }

    pub fn recover(&self) {
        *self.fail_with.lock().unwrap() = None;
    }

    /// Every publish call, successful or not.
    pub fn attempts(&self) -> Vec<Published> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn publish(&self, destination: &str, title: &str, body: &str) -> Result<()> {
        self.attempts.lock().unwrap().push(Published {
            destination: destination.to_string(),
            title: title.to_string(),
            body: body.to_string(),
        });
        match *self.fail_with.lock().unwrap() {
            Some(status) => Err(Error::Notify {
                status: Some(status),
                details: "invalid_payload".to_string(),
            }),
            None => Ok(()),
        }
    }
}
