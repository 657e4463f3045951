//! PostgreSQL repository built on a shared `sqlx::PgPool`.
//!
//! The schema lives in `migrations/` and is embedded into the binary; call
//! [`PostgresTodoRepository::migrate`] once at startup.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::config::DatabaseConfig;
use crate::model::{reorder_ranks, NewTodo, TodoField, TodoItem};
use crate::store::{StoreError, TodoRepository};

const TODO_COLUMNS: &str = "id, name, create_time, importance, flag, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PostgresTodoRepository {
    pool: PgPool,
}

impl PostgresTodoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a bounded pool. Establishing the first connection doubles as the
    /// startup reachability check.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_with(config.connect_options())
            .await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|error| StoreError::Database(error.into()))
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM todos")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

/// `UPDATE todos SET <fields>, updated_at = NOW() WHERE id = $n RETURNING ...`
/// with every value bound as a parameter.
fn update_query(id: i64, fields: &[TodoField]) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("UPDATE todos SET ");
    {
        let mut assignments = builder.separated(", ");
        for field in fields {
            assignments.push(format_args!("{} = ", field.column()));
            match field {
                TodoField::Name(name) => assignments.push_bind_unseparated(name.clone()),
                TodoField::CreateTime(create_time) => {
                    assignments.push_bind_unseparated(create_time.clone())
                }
                TodoField::Importance(importance) => assignments.push_bind_unseparated(*importance),
                TodoField::Flag(flag) => assignments.push_bind_unseparated(*flag),
            };
        }
        assignments.push("updated_at = NOW()");
    }
    builder
        .push(" WHERE id = ")
        .push_bind(id)
        .push(" RETURNING ")
        .push(TODO_COLUMNS);
    builder
}

#[async_trait]
impl TodoRepository for PostgresTodoRepository {
    async fn list(&self) -> Result<Vec<TodoItem>, StoreError> {
        let todos = sqlx::query_as::<_, TodoItem>(&format!(
            "SELECT {TODO_COLUMNS} FROM todos ORDER BY importance DESC, create_time ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(todos)
    }

    async fn max_importance(&self) -> Result<i32, StoreError> {
        let (max,): (i32,) = sqlx::query_as("SELECT COALESCE(MAX(importance), 0) FROM todos")
            .fetch_one(&self.pool)
            .await?;
        Ok(max)
    }

    async fn insert(&self, todo: NewTodo) -> Result<TodoItem, StoreError> {
        let created = sqlx::query_as::<_, TodoItem>(&format!(
            "INSERT INTO todos (name, create_time, importance, flag) \
             VALUES ($1, $2, $3, FALSE) RETURNING {TODO_COLUMNS}"
        ))
        .bind(todo.name)
        .bind(todo.create_time)
        .bind(todo.importance)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn update(&self, id: i64, fields: &[TodoField]) -> Result<Option<TodoItem>, StoreError> {
        let updated = update_query(id, fields)
            .build_query_as::<TodoItem>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn reorder(&self, todo_ids: &[i64]) -> Result<(), StoreError> {
        // Dropping an uncommitted transaction rolls it back, so every `?`
        // below (and a cancelled request) leaves the table as it was.
        let mut transaction = self.pool.begin().await?;
        for (id, importance) in reorder_ranks(todo_ids) {
            sqlx::query("UPDATE todos SET importance = $1, updated_at = NOW() WHERE id = $2")
                .bind(importance)
                .bind(id)
                .execute(&mut *transaction)
                .await?;
        }
        transaction.commit().await?;
        Ok(())
    }
}
