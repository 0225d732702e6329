//! Live adapter for the `TaskTracker` port over the task service's REST API.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::SyncConfig;
use crate::ports::tasks::{Stage, Task, TaskFuture, TaskTracker, TrackerError};

/// Upper bound on list pages read while looking for subtasks.
const MAX_LIST_PAGES: u32 = 100;

/// Task tracker backed by HTTP calls to the task service.
pub struct LiveTaskTracker {
    client: Client,
    base_url: String,
    project_id: String,
    list_id: String,
    token: String,
}

impl LiveTaskTracker {
    /// Creates a tracker for the list in `config`, authenticating with `token`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &SyncConfig, token: &str) -> Result<Self, TrackerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TrackerError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            list_id: config.list_id.clone(),
            token: token.to_string(),
        })
    }

    /// Tasks are addressed as project, then list, then task.
    fn list_url(&self) -> String {
        format!("{}/project/{}/list/{}/task", self.base_url, self.project_id, self.list_id)
    }

    fn task_url(&self, id: &str) -> String {
        format!("{}/{id}", self.list_url())
    }

    /// Sends the request and returns the body of a successful response.
    async fn send(&self, request: RequestBuilder) -> Result<String, TrackerError> {
        let response = request
            .header("Authorization", &self.token)
            .send()
            .await
            .map_err(|e| TrackerError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| TrackerError::Transport(e.to_string()))?;
        if !status.is_success() {
            let message = error_message(&body);
            return Err(TrackerError::Status { status: status.as_u16(), message });
        }
        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, TrackerError> {
        let body = self.send(request).await?;
        serde_json::from_str(&body).map_err(|e| TrackerError::Decode(e.to_string()))
    }
}

impl TaskTracker for LiveTaskTracker {
    fn fetch_task<'a>(&'a self, id: &'a str) -> TaskFuture<'a, Task> {
        Box::pin(self.fetch(id))
    }

    fn list_tasks_with_parent<'a>(&'a self, parent_id: &'a str) -> TaskFuture<'a, Vec<Task>> {
        Box::pin(self.subtasks_of(parent_id))
    }

    fn update_task_stage<'a>(&'a self, id: &'a str, stage_id: &'a str) -> TaskFuture<'a, ()> {
        Box::pin(self.move_to_stage(id, stage_id))
    }
}

impl LiveTaskTracker {
    async fn fetch(&self, id: &str) -> Result<Task, TrackerError> {
        tracing::debug!(task_id = %id, "fetching task");
        let wire: WireTask = self.get_json(self.client.get(self.task_url(id))).await?;
        Ok(wire.into())
    }

    /// Scans the whole list page by page and keeps the tasks under `parent_id`.
    ///
    /// A listing that is still unfinished after [`MAX_LIST_PAGES`] pages is an
    /// error, never a partial result.
    async fn subtasks_of(&self, parent_id: &str) -> Result<Vec<Task>, TrackerError> {
        let mut scan = SubtaskScan::new(parent_id);
        for page in 0..MAX_LIST_PAGES {
            tracing::debug!(list_id = %self.list_id, page, "listing tasks");
            let page_param = page.to_string();
            let request = self
                .client
                .get(self.list_url())
                .query(&[("page", page_param.as_str()), ("subtasks", "true")]);
            let wire: WirePage = self.get_json(request).await?;
            if scan.absorb(wire) {
                break;
            }
        }
        scan.finish()
    }

    async fn move_to_stage(&self, id: &str, stage_id: &str) -> Result<(), TrackerError> {
        tracing::debug!(task_id = %id, stage_id = %stage_id, "updating task stage");
        let request = self.client.put(self.task_url(id)).json(&StageUpdate { stage_id });
        self.send(request).await.map(|_| ())
    }
}

/// Body of a stage update.
#[derive(Serialize)]
struct StageUpdate<'a> {
    stage_id: &'a str,
}

/// Identifier that the service may send as a string or a number.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(u64),
}

impl From<WireId> for String {
    fn from(id: WireId) -> Self {
        match id {
            WireId::Text(s) => s,
            WireId::Number(n) => n.to_string(),
        }
    }
}

/// Task as returned by the service.
#[derive(Deserialize)]
struct WireTask {
    id: WireId,
    #[serde(default)]
    stage: Option<Stage>,
    #[serde(default)]
    parent_id: Option<WireId>,
}

impl From<WireTask> for Task {
    fn from(wire: WireTask) -> Self {
        Self { id: wire.id.into(), stage: wire.stage, parent_id: wire.parent_id.map(String::from) }
    }
}

/// One page of a list query.
#[derive(Deserialize)]
struct WirePage {
    #[serde(default)]
    tasks: Vec<WireTask>,
    #[serde(default)]
    last_page: Option<bool>,
}

/// Subtasks of one parent gathered across list pages.
struct SubtaskScan<'a> {
    parent_id: &'a str,
    found: Vec<Task>,
    pages: u32,
    complete: bool,
}

impl<'a> SubtaskScan<'a> {
    fn new(parent_id: &'a str) -> Self {
        Self { parent_id, found: Vec::new(), pages: 0, complete: false }
    }

    /// Keeps the page's subtasks; returns true once the listing is exhausted.
    fn absorb(&mut self, page: WirePage) -> bool {
        self.pages += 1;
        self.complete = page.tasks.is_empty() || page.last_page.unwrap_or(true);
        let parent_id = self.parent_id;
        self.found.extend(
            page.tasks
                .into_iter()
                .map(Task::from)
                .filter(|t| t.parent() == Some(parent_id) && t.id != parent_id),
        );
        self.complete
    }

    fn finish(self) -> Result<Vec<Task>, TrackerError> {
        if self.complete {
            Ok(self.found)
        } else {
            Err(TrackerError::Truncated { pages: self.pages })
        }
    }
}

/// Error body returned by the service.
#[derive(Deserialize)]
struct WireError {
    #[serde(default)]
    err: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Extracts a readable message from an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<WireError>(body)
        .ok()
        .and_then(|e| e.err.or(e.message))
        .unwrap_or_else(|| body.trim().to_string())
}
