use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user-created named grouping of tasks, stored in the `lists` collection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    #[serde(skip)]
    pub id: String,
    pub name: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// Document body for list creation; the store mints the id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewList {
    pub name: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl NewList {
    pub fn into_list(self, id: String) -> List {
        List {
            id,
            name: self.name,
            user_id: self.user_id,
            created_at: self.created_at,
        }
    }
}
