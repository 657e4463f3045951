//! DTOs for the todo API as seen by a client.
//!
//! # Design
//! Defined independently from the server crate so the client never links
//! axum or sqlx. The integration tests catch schema drift between the two.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single todo item returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: i64,
    pub name: String,
    /// Caller-chosen logical date, `YYYY-MM-DD` unless the caller sent
    /// something else.
    pub create_time: String,
    pub importance: i32,
    pub flag: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for creating a todo. Omitted fields get server defaults:
/// today's date and an importance one above the current maximum.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTodo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<i32>,
}

/// Request payload for updating an existing todo. Only the fields present in
/// the JSON are applied; at least one must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTodo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReorderTodos {
    pub todo_ids: Vec<i64>,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Health {
    pub status: String,
    pub message: String,
}
