use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A task document as stored in the `tasks` collection.
///
/// The document id lives outside the document body: the store assigns it on
/// creation and it is never serialized back into the fields.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(skip)]
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub list_id: Option<String>,
    #[serde(default)]
    pub important: bool,
}

impl Task {
    /// True if the task was created on `day` (local calendar day).
    pub fn created_on(&self, day: NaiveDate) -> bool {
        self.created_at.with_timezone(&Local).date_naive() == day
    }

    /// True if the task has a due date falling on `day` (local calendar day).
    pub fn due_on(&self, day: NaiveDate) -> bool {
        self.due_date
            .map(|due| due.with_timezone(&Local).date_naive() == day)
            .unwrap_or(false)
    }

    /// Returns true if this task should appear in the "today" view:
    /// created on `day` or due on `day`.
    pub fn occurs_on(&self, day: NaiveDate) -> bool {
        self.created_on(day) || self.due_on(day)
    }

    /// Inbox membership: no list and not yet completed.
    pub fn in_inbox(&self) -> bool {
        self.list_id.is_none() && !self.completed
    }

    /// Case-insensitive substring match against the title.
    pub fn title_matches(&self, query: &str) -> bool {
        self.title.to_lowercase().contains(&query.to_lowercase())
    }
}

/// The document body handed to the store when creating a task.
/// Same fields as [`Task`] minus the id, which the store mints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub user_id: String,
    pub due_date: Option<DateTime<Utc>>,
    pub list_id: Option<String>,
    pub important: bool,
}

impl NewTask {
    pub fn into_task(self, id: String) -> Task {
        Task {
            id,
            title: self.title,
            completed: self.completed,
            created_at: self.created_at,
            user_id: self.user_id,
            due_date: self.due_date,
            list_id: self.list_id,
            important: self.important,
        }
    }
}
