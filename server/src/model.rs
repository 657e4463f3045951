//! Wire and storage types for todo items.
//!
//! `TodoItem` is both the row shape returned by the repository and the JSON
//! object sent to clients. The caller-supplied logical date travels as
//! `create_time` on the wire and in the table; it is unrelated to the
//! server-managed `created_at` timestamp.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A single todo item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TodoItem {
    pub id: i64,
    pub name: String,
    pub create_time: String,
    pub importance: i32,
    pub flag: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTodo {
    #[validate(length(min = 1, max = 500, message = "name must be between 1 and 500 characters"))]
    pub name: String,
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub importance: Option<i32>,
}

/// Partial update; only the fields present in the JSON are applied.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTodo {
    #[validate(length(min = 1, max = 500, message = "name must be between 1 and 500 characters"))]
    pub name: Option<String>,
    pub create_time: Option<String>,
    pub importance: Option<i32>,
    pub flag: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ReorderTodos {
    pub todo_ids: Vec<i64>,
}

/// Values ready for insertion, after defaults have been substituted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTodo {
    pub name: String,
    pub create_time: String,
    pub importance: i32,
}

/// One column assignment of a partial update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TodoField {
    Name(String),
    CreateTime(String),
    Importance(i32),
    Flag(bool),
}

impl TodoField {
    pub fn column(&self) -> &'static str {
        match self {
            TodoField::Name(_) => "name",
            TodoField::CreateTime(_) => "create_time",
            TodoField::Importance(_) => "importance",
            TodoField::Flag(_) => "flag",
        }
    }

    /// Apply this assignment to an in-memory item.
    pub fn apply(&self, todo: &mut TodoItem) {
        match self {
            TodoField::Name(name) => todo.name.clone_from(name),
            TodoField::CreateTime(create_time) => todo.create_time.clone_from(create_time),
            TodoField::Importance(importance) => todo.importance = *importance,
            TodoField::Flag(flag) => todo.flag = *flag,
        }
    }
}

impl UpdateTodo {
    /// Collect the supplied fields in a fixed column order.
    pub fn into_fields(self) -> Vec<TodoField> {
        let mut fields = Vec::new();
        if let Some(name) = self.name {
            fields.push(TodoField::Name(name));
        }
        if let Some(create_time) = self.create_time {
            fields.push(TodoField::CreateTime(create_time));
        }
        if let Some(importance) = self.importance {
            fields.push(TodoField::Importance(importance));
        }
        if let Some(flag) = self.flag {
            fields.push(TodoField::Flag(flag));
        }
        fields
    }
}

/// Today's server-local date as `YYYY-MM-DD`.
pub fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Largest reorder batch whose ranks still fit the `importance` column.
pub const MAX_REORDER_IDS: usize = i32::MAX as usize;

/// Importance values for a reorder batch: the first id gets `len`, the last gets 1.
///
/// Batches longer than [`MAX_REORDER_IDS`] are rejected before they get here.
pub fn reorder_ranks(todo_ids: &[i64]) -> impl Iterator<Item = (i64, i32)> + '_ {
    debug_assert!(todo_ids.len() <= MAX_REORDER_IDS);
    todo_ids
        .iter()
        .zip((1..=todo_ids.len()).rev())
        .map(|(id, rank)| (*id, rank as i32))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TodoListResponse {
    pub todos: Vec<TodoItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TodoResponse {
    pub todo: TodoItem,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}
