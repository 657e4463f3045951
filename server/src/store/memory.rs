//! In-memory repository guarded by a tokio `RwLock`.
//!
//! Mirrors the PostgreSQL behaviour closely enough for router tests: ids come
//! from a never-reused counter, timestamps from the wall clock, and reorder
//! works on a copy of the table that only replaces the original on success.
//! [`InMemoryTodoRepository::fail_updates_for`] makes a given id fail like a
//! broken statement, which is how rollback is exercised without a database.
//! [`InMemoryTodoRepository::set_stall`] slows `list` and `reorder` down so
//! request timeouts can be hit on purpose.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::model::{reorder_ranks, NewTodo, TodoField, TodoItem};
use crate::store::{StoreError, TodoRepository};

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<i64, TodoItem>,
    last_id: i64,
    failing_ids: HashSet<i64>,
    unavailable: bool,
    stall: Option<Duration>,
}

impl Table {
    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Injected("storage unavailable".to_string()));
        }
        Ok(())
    }

    fn check_writable(&self, id: i64) -> Result<(), StoreError> {
        if self.failing_ids.contains(&id) {
            return Err(StoreError::Injected(format!("update of todo {id} failed")));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryTodoRepository {
    table: Arc<RwLock<Table>>,
}

impl InMemoryTodoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later update of `id` fail, including inside a reorder batch.
    pub async fn fail_updates_for(&self, id: i64) {
        self.table.write().await.failing_ids.insert(id);
    }

    /// Delay `list`, and `reorder` after staging its changes, by `stall`.
    pub async fn set_stall(&self, stall: Option<Duration>) {
        self.table.write().await.stall = stall;
    }

    /// Make every operation fail until toggled back.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.table.write().await.unavailable = unavailable;
    }
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    async fn list(&self) -> Result<Vec<TodoItem>, StoreError> {
        let table = self.table.read().await;
        table.check_available()?;
        if let Some(stall) = table.stall {
            tokio::time::sleep(stall).await;
        }
        let mut todos: Vec<TodoItem> = table.rows.values().cloned().collect();
        todos.sort_by(|a, b| {
            b.importance
                .cmp(&a.importance)
                .then_with(|| a.create_time.cmp(&b.create_time))
        });
        Ok(todos)
    }

    async fn max_importance(&self) -> Result<i32, StoreError> {
        let table = self.table.read().await;
        table.check_available()?;
        Ok(table.rows.values().map(|todo| todo.importance).max().unwrap_or(0))
    }

    async fn insert(&self, todo: NewTodo) -> Result<TodoItem, StoreError> {
        let mut table = self.table.write().await;
        table.check_available()?;
        table.last_id += 1;
        let now = Utc::now();
        let created = TodoItem {
            id: table.last_id,
            name: todo.name,
            create_time: todo.create_time,
            importance: todo.importance,
            flag: false,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: i64, fields: &[TodoField]) -> Result<Option<TodoItem>, StoreError> {
        let mut table = self.table.write().await;
        table.check_available()?;
        table.check_writable(id)?;
        let Some(todo) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        for field in fields {
            field.apply(todo);
        }
        todo.updated_at = Utc::now();
        Ok(Some(todo.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut table = self.table.write().await;
        table.check_available()?;
        Ok(table.rows.remove(&id).is_some())
    }

    async fn reorder(&self, todo_ids: &[i64]) -> Result<(), StoreError> {
        let mut table = self.table.write().await;
        table.check_available()?;
        let mut staged = table.rows.clone();
        let now = Utc::now();
        for (id, importance) in reorder_ranks(todo_ids) {
            table.check_writable(id)?;
            if let Some(todo) = staged.get_mut(&id) {
                todo.importance = importance;
                todo.updated_at = now;
            }
        }
        // Cancellation here drops `staged` and leaves the table untouched.
        if let Some(stall) = table.stall {
            tokio::time::sleep(stall).await;
        }
        table.rows = staged;
        Ok(())
    }
}
