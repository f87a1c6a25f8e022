use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use uuid::Uuid;

use super::{Doc, DocumentStore, StoreError};
use crate::core::list::{List, NewList};
use crate::core::task::{NewTask, Task};

/// In-memory document store. Backs the test suite and offline use.
///
/// Both collections live under one mutex, which makes `delete_batch`
/// trivially all-or-nothing. Watch channels are created per user on first
/// subscription and refreshed after every mutation touching that user.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    tasks: HashMap<String, Task>,
    lists: HashMap<String, List>,
    task_watchers: HashMap<String, watch::Sender<Vec<Task>>>,
    list_watchers: HashMap<String, watch::Sender<Vec<List>>>,
}

impl State {
    fn user_tasks(&self, user_id: &str) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .tasks
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tasks
    }

    fn user_lists(&self, user_id: &str) -> Vec<List> {
        let mut lists: Vec<List> = self
            .lists
            .values()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect();
        lists.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        lists
    }

    fn notify_user(&self, user_id: &str) {
        if let Some(tx) = self.task_watchers.get(user_id) {
            let tasks = self.user_tasks(user_id);
            tx.send_if_modified(|current| {
                if *current != tasks {
                    *current = tasks;
                    true
                } else {
                    false
                }
            });
        }
        if let Some(tx) = self.list_watchers.get(user_id) {
            let lists = self.user_lists(user_id);
            tx.send_if_modified(|current| {
                if *current != lists {
                    *current = lists;
                    true
                } else {
                    false
                }
            });
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner.lock().expect("store state lock poisoned")
    }
}

impl DocumentStore for MemoryStore {
    async fn add_task(&self, task: NewTask) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        let mut state = self.state();
        let task = task.into_task(id.clone());
        let owner = task.user_id.clone();
        state.tasks.insert(id.clone(), task);
        state.notify_user(&owner);
        Ok(id)
    }

    async fn set_task_completed(&self, task_id: &str, completed: bool) -> Result<(), StoreError> {
        let mut state = self.state();
        let owner = match state.tasks.get_mut(task_id) {
            Some(task) => {
                task.completed = completed;
                task.user_id.clone()
            }
            None => return Err(StoreError::NotFound),
        };
        state.notify_user(&owner);
        Ok(())
    }

    async fn tasks_for_user(&self, user_id: &str) -> Result<Vec<Task>, StoreError> {
        Ok(self.state().user_tasks(user_id))
    }

    async fn tasks_in_list(&self, user_id: &str, list_id: &str) -> Result<Vec<Task>, StoreError> {
        let mut tasks = self.state().user_tasks(user_id);
        tasks.retain(|t| t.list_id.as_deref() == Some(list_id));
        Ok(tasks)
    }

    async fn lists_for_user(&self, user_id: &str) -> Result<Vec<List>, StoreError> {
        Ok(self.state().user_lists(user_id))
    }

    async fn add_list(&self, list: NewList) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        let mut state = self.state();
        let list = list.into_list(id.clone());
        let owner = list.user_id.clone();
        state.lists.insert(id.clone(), list);
        state.notify_user(&owner);
        Ok(id)
    }

    async fn delete_batch(&self, docs: Vec<Doc>) -> Result<(), StoreError> {
        let mut state = self.state();
        let mut touched: Vec<String> = Vec::new();
        // Single lock over both collections; the whole batch lands at once.
        for doc in docs {
            let owner = match doc {
                Doc::Task(id) => state.tasks.remove(&id).map(|t| t.user_id),
                Doc::List(id) => state.lists.remove(&id).map(|l| l.user_id),
            };
            if let Some(owner) = owner {
                if !touched.contains(&owner) {
                    touched.push(owner);
                }
            }
        }
        for owner in touched {
            state.notify_user(&owner);
        }
        Ok(())
    }

    fn watch_tasks(&self, user_id: &str) -> watch::Receiver<Vec<Task>> {
        let mut state = self.state();
        let snapshot = state.user_tasks(user_id);
        let tx = state
            .task_watchers
            .entry(user_id.to_string())
            .or_insert_with(|| watch::channel(Vec::new()).0);
        tx.send_replace(snapshot);
        tx.subscribe()
    }

    fn watch_lists(&self, user_id: &str) -> watch::Receiver<Vec<List>> {
        let mut state = self.state();
        let snapshot = state.user_lists(user_id);
        let tx = state
            .list_watchers
            .entry(user_id.to_string())
            .or_insert_with(|| watch::channel(Vec::new()).0);
        tx.send_replace(snapshot);
        tx.subscribe()
    }
}
