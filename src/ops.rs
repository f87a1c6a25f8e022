use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use crate::auth::{AuthClient, Session};
use crate::core::filter::Filter;
use crate::core::list::NewList;
use crate::core::task::NewTask;
use crate::store::{Doc, DocumentStore, StoreError};

/// Why a mutation did not happen. Validation variants are rejected locally,
/// before any store call; `Store` wraps whatever the backend reported.
#[derive(Debug, Clone, Error)]
pub enum OpError {
    #[error("o título não pode estar vazio")]
    EmptyTitle,
    #[error("o nome da lista não pode estar vazio")]
    EmptyName,
    #[error("nenhuma sessão ativa")]
    NoSession,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Shared loading indicator, passed explicitly into the operations that want
/// to show a spinner. Counts overlapping operations; the indicator clears
/// when the last guard drops.
#[derive(Clone, Default)]
pub struct LoadingHandle {
    active: Arc<AtomicUsize>,
}

impl LoadingHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self) -> LoadingGuard {
        self.active.fetch_add(1, Ordering::Relaxed);
        LoadingGuard {
            active: Arc::clone(&self.active),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.active.load(Ordering::Relaxed) > 0
    }
}

pub struct LoadingGuard {
    active: Arc<AtomicUsize>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Create a task under the current filter; returns the new document id.
///
/// The active filter shapes the stored fields: `Today` stamps a due date of
/// now, `Important` sets the flag, a list or task selector files the task
/// under that id, and the remaining built-ins leave it in the inbox.
pub async fn create_task<S: DocumentStore>(
    store: &S,
    session: Option<&Session>,
    title: &str,
    active_filter: &Filter,
    completed: bool,
) -> Result<String, OpError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(OpError::EmptyTitle);
    }
    let session = session.ok_or(OpError::NoSession)?;

    let task = NewTask {
        title: title.to_string(),
        completed,
        created_at: Utc::now(),
        user_id: session.user_id.clone(),
        due_date: matches!(active_filter, Filter::Today).then(Utc::now),
        list_id: active_filter.implied_list_id().map(str::to_string),
        important: matches!(active_filter, Filter::Important),
    };

    match store.add_task(task).await {
        Ok(id) => Ok(id),
        Err(e) => {
            log::error!("failed to create task: {}", e);
            Err(e.into())
        }
    }
}

/// Persist the negation of the caller-supplied pre-toggle value.
///
/// The value comes from the last rendered snapshot, not from a fresh read:
/// two rapid toggles before the snapshot refreshes both observe the same
/// `currently_completed` and the second write restores the original state.
/// Fixing that takes a compare-and-set precondition or a server-side
/// negation.
pub async fn toggle_task_completion<S: DocumentStore>(
    store: &S,
    task_id: &str,
    currently_completed: bool,
) -> Result<(), OpError> {
    match store.set_task_completed(task_id, !currently_completed).await {
        Ok(()) => Ok(()),
        Err(e) => {
            log::error!("failed to toggle task {}: {}", task_id, e);
            Err(e.into())
        }
    }
}

/// Permanently remove a single task. No soft-delete, no undo.
pub async fn delete_task<S: DocumentStore>(store: &S, task_id: &str) -> Result<(), OpError> {
    match store.delete_batch(vec![Doc::Task(task_id.to_string())]).await {
        Ok(()) => Ok(()),
        Err(e) => {
            log::error!("failed to delete task {}: {}", task_id, e);
            Err(e.into())
        }
    }
}

/// Create a named list; returns the new document id.
pub async fn create_list<S: DocumentStore>(
    store: &S,
    session: Option<&Session>,
    name: &str,
) -> Result<String, OpError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(OpError::EmptyName);
    }
    let session = session.ok_or(OpError::NoSession)?;

    let list = NewList {
        name: name.to_string(),
        user_id: session.user_id.clone(),
        created_at: Utc::now(),
    };

    match store.add_list(list).await {
        Ok(id) => Ok(id),
        Err(e) => {
            log::error!("failed to create list: {}", e);
            Err(e.into())
        }
    }
}

/// Delete a list together with every task filed in it, as one atomic batch.
/// Returns the number of cascaded tasks.
///
/// If the view is currently showing the doomed list, the active filter is
/// reset to the inbox first, before the store is touched. A failed batch
/// leaves tasks and list intact.
pub async fn delete_list<S: DocumentStore>(
    store: &S,
    session: Option<&Session>,
    list_id: &str,
    active_filter: &mut Filter,
) -> Result<usize, OpError> {
    if active_filter.selects_list(list_id) {
        *active_filter = Filter::Inbox;
    }
    let session = session.ok_or(OpError::NoSession)?;

    let members = match store.tasks_in_list(&session.user_id, list_id).await {
        Ok(members) => members,
        Err(e) => {
            log::error!("failed to query tasks of list {}: {}", list_id, e);
            return Err(e.into());
        }
    };

    let mut docs: Vec<Doc> = members.into_iter().map(|t| Doc::Task(t.id)).collect();
    let cascaded = docs.len();
    docs.push(Doc::List(list_id.to_string()));

    match store.delete_batch(docs).await {
        Ok(()) => {
            log::info!("deleted list {} and {} member tasks", list_id, cascaded);
            Ok(cascaded)
        }
        Err(e) => {
            log::error!("failed to delete list {}: {}", list_id, e);
            Err(e.into())
        }
    }
}

/// End the session under a loading guard. Sign-out cannot fail; the token is
/// simply discarded.
pub fn log_out(auth: &AuthClient, session: Session, loading: &LoadingHandle) {
    let _guard = loading.start();
    auth.sign_out(session);
}
