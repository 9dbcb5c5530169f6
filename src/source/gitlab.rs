//! GitLab REST (v4) queue source.
//!
//! A queue is a project; its items are the open merge requests whose first
//! assignee is the token owner. GitLab does not expose when an MR was
//! assigned, so the assignment time is recovered from the latest
//! "assigned to @user" system note, falling back to the MR creation time.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use secrecy::SecretString;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::QueueSource;
use crate::config::secrets::sensitive_header;
use crate::error::{Error, Result};
use crate::model::{Actor, QueueId, QueueItem};

const PER_PAGE: &str = "100";

#[derive(Debug, Deserialize)]
struct ProjectInfo {
    name: String,
}

#[derive(Debug, Deserialize)]
struct UserRef {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct MergeRequestInfo {
    iid: u64,
    title: String,
    web_url: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    assignee: Option<UserRef>,
    #[serde(default)]
    assignees: Option<Vec<UserRef>>,
}

impl MergeRequestInfo {
    fn is_assigned_to(&self, actor: &Actor) -> bool {
        let first_assignee = self.assignees.as_deref().and_then(|a| a.first());
        first_assignee.is_some_and(|u| u.id == actor.id)
            || self.assignee.as_ref().is_some_and(|u| u.id == actor.id)
    }
}

#[derive(Debug, Deserialize)]
struct NoteInfo {
    body: String,
    #[serde(default)]
    system: bool,
    created_at: DateTime<Utc>,
}

/// Thin client over the handful of GitLab endpoints the watcher needs.
#[derive(Clone)]
pub struct GitLabClient {
    http: reqwest::Client,
    api_base: String,
}

impl GitLabClient {
    /// Create a client for `base_url` (e.g. `https://gitlab.example.com`)
    /// authenticating with a private/personal access token.
    pub fn new(base_url: &str, token: &SecretString, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("queue-herald/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert("private-token", sensitive_header(token)?);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Other(format!("failed to build GitLab HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_base: format!("{}/api/v4", base_url.trim_end_matches('/')),
        })
    }

    /// GET one page. A 404 becomes `NotFound(queue)` when the path is
    /// scoped to a queue.
    async fn get_page<T: DeserializeOwned>(
        &self,
        queue: Option<QueueId>,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<(T, Option<u32>)> {
        let url = format!("{}{}", self.api_base, path);
        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Source(format!("GET {path} failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            if let Some(queue) = queue {
                return Err(Error::NotFound(queue));
            }
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Source(format!("GET {path} returned {status}: {body}")));
        }

        let next_page = response
            .headers()
            .get("x-next-page")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u32>().ok());

        let value = response
            .json::<T>()
            .await
            .map_err(|e| Error::Source(format!("GET {path} returned malformed JSON: {e}")))?;
        Ok((value, next_page))
    }

    /// GET every page of a list endpoint, following `X-Next-Page`.
    async fn get_all_pages<T: DeserializeOwned>(
        &self,
        queue: Option<QueueId>,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let mut rows = Vec::new();
        let mut page = 1_u32;
        loop {
            let mut params: Vec<(&str, String)> =
                query.iter().map(|(k, v)| (*k, v.to_string())).collect();
            params.push(("per_page", PER_PAGE.to_string()));
            params.push(("page", page.to_string()));

            let (chunk, next_page): (Vec<T>, _) = self.get_page(queue, path, &params).await?;
            rows.extend(chunk);
            match next_page {
                Some(next) if next > page => page = next,
                _ => break,
            }
        }
        Ok(rows)
    }

    /// When `actor` was (last) assigned to the merge request, if GitLab
    /// recorded it.
    async fn assignment_time(
        &self,
        queue: QueueId,
        iid: u64,
        actor: &Actor,
    ) -> Result<Option<DateTime<Utc>>> {
        let notes: Vec<NoteInfo> = self
            .get_all_pages(
                None,
                &format!("/projects/{queue}/merge_requests/{iid}/notes"),
                &[("order_by", "created_at"), ("sort", "asc")],
            )
            .await?;

        Ok(notes
            .iter()
            .filter(|note| note.system && mentions_assignment(&note.body, &actor.username))
            .map(|note| note.created_at)
            .max())
    }
}

/// Does a system note body record an assignment to `username`?
///
/// GitLab lists every new assignee after `assigned to`, e.g.
/// `assigned to @alice and @marge` or `reassigned to @marge`. Mentions
/// after `unassigned` in the same note are removals.
fn mentions_assignment(body: &str, username: &str) -> bool {
    const MARKER: &str = "assigned to ";
    body.match_indices(MARKER).any(|(start, _)| {
        let rest = &body[start + MARKER.len()..];
        let assignees = rest.split("unassigned").next().unwrap_or(rest);
        assignees.split('@').skip(1).any(|mention| {
            let name = mention
                .split(|c: char| !(c.is_alphanumeric() || matches!(c, '_' | '-' | '.')))
                .next()
                .unwrap_or_default();
            name.trim_end_matches('.') == username
        })
    })
}

#[async_trait]
impl QueueSource for GitLabClient {
    async fn current_actor(&self) -> Result<Actor> {
        let (actor, _): (Actor, _) = self.get_page(None, "/user", &[]).await?;
        debug!(user_id = actor.id, username = %actor.username, "resolved automation user");
        Ok(actor)
    }

    async fn queue_name(&self, queue: QueueId) -> Result<String> {
        let (project, _): (ProjectInfo, _) = self
            .get_page(Some(queue), &format!("/projects/{queue}"), &[])
            .await?;
        Ok(project.name)
    }

    async fn fetch_assigned_open_items(
        &self,
        queue: QueueId,
        actor: &Actor,
    ) -> Result<Vec<QueueItem>> {
        let open: Vec<MergeRequestInfo> = self
            .get_all_pages(
                Some(queue),
                &format!("/projects/{queue}/merge_requests"),
                &[("state", "opened"), ("order_by", "created_at"), ("sort", "asc")],
            )
            .await?;

        let mut items = Vec::new();
        for mr in open.into_iter().filter(|mr| mr.is_assigned_to(actor)) {
            let assigned_at = self
                .assignment_time(queue, mr.iid, actor)
                .await?
                .unwrap_or(mr.created_at);
            items.push(QueueItem {
                id: mr.iid,
                title: mr.title,
                url: mr.web_url,
                assigned_at,
            });
        }

        // Stable: equal assignment times keep creation order
        items.sort_by_key(|item| item.assigned_at);
        debug!(queue_id = %queue, items = items.len(), "fetched assigned merge requests");
        Ok(items)
    }
}
