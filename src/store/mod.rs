pub mod memory;
pub mod rest;

use thiserror::Error;
use tokio::sync::watch;

use crate::core::list::{List, NewList};
use crate::core::task::{NewTask, Task};

/// Errors surfaced by a document store, one variant per backend condition.
/// Mutations are never retried; the caller decides what to show the user.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("permissão negada")]
    PermissionDenied,
    #[error("usuário não autenticado")]
    Unauthenticated,
    #[error("argumentos inválidos")]
    InvalidArgument,
    #[error("condição prévia falhou")]
    FailedPrecondition,
    #[error("documento não encontrado")]
    NotFound,
    #[error("falha de rede: {0}")]
    Network(String),
    #[error("erro do backend: {0}")]
    Backend(String),
}

/// A document reference for batched deletion, spanning both collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Doc {
    Task(String),
    List(String),
}

/// The backend seam: two collections (`tasks`, `lists`), per-user queries,
/// single-document mutations, an atomic cross-collection batch delete, and
/// live per-user subscriptions.
///
/// Subscriptions are `watch` channels carrying whole snapshots; dropping the
/// receiver unsubscribes. The tasks and lists channels update independently,
/// so consumers must tolerate one snapshot briefly referencing documents the
/// other no longer contains.
#[allow(async_fn_in_trait)]
pub trait DocumentStore: Clone + Send + Sync + 'static {
    /// Persist a new task; returns the store-assigned document id.
    async fn add_task(&self, task: NewTask) -> Result<String, StoreError>;

    /// Overwrite the completion flag of a single task.
    async fn set_task_completed(&self, task_id: &str, completed: bool) -> Result<(), StoreError>;

    /// One-shot query: all tasks owned by `user_id`.
    async fn tasks_for_user(&self, user_id: &str) -> Result<Vec<Task>, StoreError>;

    /// One-shot query: all tasks owned by `user_id` filed in `list_id`.
    async fn tasks_in_list(&self, user_id: &str, list_id: &str) -> Result<Vec<Task>, StoreError>;

    /// One-shot query: all lists owned by `user_id`.
    async fn lists_for_user(&self, user_id: &str) -> Result<Vec<List>, StoreError>;

    /// Persist a new list; returns the store-assigned document id.
    async fn add_list(&self, list: NewList) -> Result<String, StoreError>;

    /// Delete a set of documents as a single all-or-nothing batch. On error,
    /// no document has been removed.
    async fn delete_batch(&self, docs: Vec<Doc>) -> Result<(), StoreError>;

    /// Live subscription to the tasks of `user_id`.
    fn watch_tasks(&self, user_id: &str) -> watch::Receiver<Vec<Task>>;

    /// Live subscription to the lists of `user_id`.
    fn watch_lists(&self, user_id: &str) -> watch::Receiver<Vec<List>>;
}
