//! Storage seam for todo items.
//!
//! Handlers only see `TodoRepository`. `PostgresTodoRepository` is the
//! production backend; `InMemoryTodoRepository` backs development runs and
//! the router tests, and can be told to fail specific statements.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{NewTodo, TodoField, TodoItem};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryTodoRepository;
pub use postgres::PostgresTodoRepository;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Simulated fault raised by the in-memory repository.
    #[error("injected failure: {0}")]
    Injected(String),
}

#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// All todos, highest importance first, ties by `create_time` ascending.
    async fn list(&self) -> Result<Vec<TodoItem>, StoreError>;

    /// Highest stored importance, or 0 when the table is empty.
    async fn max_importance(&self) -> Result<i32, StoreError>;

    async fn insert(&self, todo: NewTodo) -> Result<TodoItem, StoreError>;

    /// Apply `fields` and refresh `updated_at`. `Ok(None)` when no row has `id`.
    async fn update(&self, id: i64, fields: &[TodoField]) -> Result<Option<TodoItem>, StoreError>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;

    /// Rank `todo_ids` in one transaction, first id highest. Unknown ids are
    /// skipped; any failure leaves every row untouched.
    async fn reorder(&self, todo_ids: &[i64]) -> Result<(), StoreError>;
}
