use std::collections::HashMap;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::watch;

use super::{Doc, DocumentStore, StoreError};
use crate::core::list::{List, NewList};
use crate::core::task::{NewTask, Task};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Response to a POST against a collection: the server-assigned document id.
#[derive(serde::Deserialize)]
struct PushResponse {
    name: String,
}

/// Document store backed by a Firebase Realtime-Database-style JSON REST API.
///
/// Documents live at `{base}/{collection}/{id}.json`; a POST against
/// `{base}/{collection}.json` creates a document and returns its id; a PATCH
/// against `{base}/.json` applies a multi-path update atomically, which is
/// what `delete_batch` rides on. Live subscriptions are polling loops that
/// push fresh snapshots into a watch channel.
#[derive(Clone)]
pub struct RestStore {
    base_url: String,
    auth_token: Option<String>,
    poll_interval: Duration,
    http: Client,
}

impl RestStore {
    pub fn new(base_url: &str, auth_token: Option<String>) -> Result<Self, StoreError> {
        let http = Client::builder()
            .build()
            .map_err(|e| StoreError::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token,
            poll_interval: DEFAULT_POLL_INTERVAL,
            http,
        })
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}.json", self.base_url, collection)
    }

    fn doc_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}.json", self.base_url, collection, id)
    }

    fn auth_params(&self) -> Vec<(&'static str, String)> {
        match &self.auth_token {
            Some(token) => vec![("auth", token.clone())],
            None => Vec::new(),
        }
    }

    fn error_for_status(&self, status: StatusCode, body: &str) -> StoreError {
        match status {
            // The backend answers 401 both for missing and for rejected
            // credentials; split on whether we sent a token at all.
            StatusCode::UNAUTHORIZED => match self.auth_token {
                Some(_) => StoreError::PermissionDenied,
                None => StoreError::Unauthenticated,
            },
            StatusCode::FORBIDDEN => StoreError::PermissionDenied,
            StatusCode::BAD_REQUEST => StoreError::InvalidArgument,
            StatusCode::NOT_FOUND => StoreError::NotFound,
            StatusCode::PRECONDITION_FAILED => StoreError::FailedPrecondition,
            _ => StoreError::Backend(format!("{}: {}", status, body)),
        }
    }

    /// GET a collection filtered server-side by an indexed field equality.
    async fn query_collection<T: DeserializeOwned>(
        &self,
        collection: &str,
        order_by: &str,
        equal_to: &str,
    ) -> Result<HashMap<String, T>, StoreError> {
        let mut params = self.auth_params();
        // The query grammar wants JSON-encoded values, quotes included.
        params.push(("orderBy", format!("\"{}\"", order_by)));
        params.push(("equalTo", format!("\"{}\"", equal_to)));

        let resp = self
            .http
            .get(self.collection_url(collection))
            .query(&params)
            .send()
            .await
            .map_err(|e| StoreError::Network(format!("GET {} failed: {}", collection, e)))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| StoreError::Network(format!("failed to read {} response: {}", collection, e)))?;

        if !status.is_success() {
            return Err(self.error_for_status(status, &text));
        }

        // An empty result set comes back as `null`, not `{}`.
        let docs: Option<HashMap<String, T>> = serde_json::from_str(&text)
            .map_err(|e| StoreError::Backend(format!("malformed {} document: {}", collection, e)))?;
        Ok(docs.unwrap_or_default())
    }

    /// POST a document body to a collection; returns the assigned id.
    async fn push_document<T: Serialize>(
        &self,
        collection: &str,
        body: &T,
    ) -> Result<String, StoreError> {
        let resp = self
            .http
            .post(self.collection_url(collection))
            .query(&self.auth_params())
            .json(body)
            .send()
            .await
            .map_err(|e| StoreError::Network(format!("POST {} failed: {}", collection, e)))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(self.error_for_status(status, &text));
        }

        let pushed: PushResponse = resp
            .json()
            .await
            .map_err(|e| StoreError::Backend(format!("malformed push response: {}", e)))?;
        log::info!("created {} document {}", collection, pushed.name);
        Ok(pushed.name)
    }

    async fn patch(&self, url: String, body: Value) -> Result<(), StoreError> {
        let resp = self
            .http
            .patch(&url)
            .query(&self.auth_params())
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Network(format!("PATCH failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(self.error_for_status(status, &text));
        }
        Ok(())
    }

    fn assign_ids<T>(docs: HashMap<String, T>, set_id: impl Fn(&mut T, String)) -> Vec<T> {
        docs.into_iter()
            .map(|(id, mut doc)| {
                set_id(&mut doc, id);
                doc
            })
            .collect()
    }
}

impl DocumentStore for RestStore {
    async fn add_task(&self, task: NewTask) -> Result<String, StoreError> {
        self.push_document("tasks", &task).await
    }

    async fn set_task_completed(&self, task_id: &str, completed: bool) -> Result<(), StoreError> {
        self.patch(
            self.doc_url("tasks", task_id),
            serde_json::json!({ "completed": completed }),
        )
        .await
    }

    async fn tasks_for_user(&self, user_id: &str) -> Result<Vec<Task>, StoreError> {
        let docs = self.query_collection("tasks", "userId", user_id).await?;
        let mut tasks = Self::assign_ids(docs, |task: &mut Task, id| task.id = id);
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    async fn tasks_in_list(&self, user_id: &str, list_id: &str) -> Result<Vec<Task>, StoreError> {
        // The query grammar takes a single indexed field; filter by list on
        // the server and narrow to the owner here.
        let docs = self.query_collection("tasks", "listId", list_id).await?;
        let mut tasks = Self::assign_ids(docs, |task: &mut Task, id| task.id = id);
        tasks.retain(|t| t.user_id == user_id);
        Ok(tasks)
    }

    async fn lists_for_user(&self, user_id: &str) -> Result<Vec<List>, StoreError> {
        let docs = self.query_collection("lists", "userId", user_id).await?;
        let mut lists = Self::assign_ids(docs, |list: &mut List, id| list.id = id);
        lists.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(lists)
    }

    async fn add_list(&self, list: NewList) -> Result<String, StoreError> {
        self.push_document("lists", &list).await
    }

    async fn delete_batch(&self, docs: Vec<Doc>) -> Result<(), StoreError> {
        if docs.is_empty() {
            return Ok(());
        }
        // One multi-path update; the backend applies it atomically.
        let mut update = Map::new();
        for doc in &docs {
            let path = match doc {
                Doc::Task(id) => format!("tasks/{}", id),
                Doc::List(id) => format!("lists/{}", id),
            };
            update.insert(path, Value::Null);
        }
        log::info!("deleting {} documents in one batch", docs.len());
        self.patch(format!("{}/.json", self.base_url), Value::Object(update))
            .await
    }

    fn watch_tasks(&self, user_id: &str) -> watch::Receiver<Vec<Task>> {
        let (tx, rx) = watch::channel(Vec::new());
        let store = self.clone();
        let user = user_id.to_string();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(store.poll_interval);
            loop {
                ticker.tick().await;
                if tx.is_closed() {
                    break;
                }
                match store.tasks_for_user(&user).await {
                    Ok(tasks) => {
                        tx.send_if_modified(|current| {
                            if *current != tasks {
                                *current = tasks;
                                true
                            } else {
                                false
                            }
                        });
                    }
                    Err(e) => log::warn!("task subscription poll failed: {}", e),
                }
            }
            log::debug!("task subscription for {} ended", user);
        });
        rx
    }

    fn watch_lists(&self, user_id: &str) -> watch::Receiver<Vec<List>> {
        let (tx, rx) = watch::channel(Vec::new());
        let store = self.clone();
        let user = user_id.to_string();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(store.poll_interval);
            loop {
                ticker.tick().await;
                if tx.is_closed() {
                    break;
                }
                match store.lists_for_user(&user).await {
                    Ok(lists) => {
                        tx.send_if_modified(|current| {
                            if *current != lists {
                                *current = lists;
                                true
                            } else {
                                false
                            }
                        });
                    }
                    Err(e) => log::warn!("list subscription poll failed: {}", e),
                }
            }
            log::debug!("list subscription for {} ended", user);
        });
        rx
    }
}
