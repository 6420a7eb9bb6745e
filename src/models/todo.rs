use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A to-do item on a user's list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Todo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Form body for adding a to-do item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTodoInput {
    #[serde(default)]
    pub content: String,
}

/// Form body for removing a to-do item. The id is kept as text so that a
/// malformed value degrades to a no-op instead of a rejected request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteTodoInput {
    #[serde(default)]
    pub todo_id: String,
}
