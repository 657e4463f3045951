//! Repository behaviour against a live PostgreSQL database.
//!
//! Run with `DATABASE_URL=postgres://... cargo test -- --ignored`. Each test
//! clears the `todos` table, so point it at a throwaway database.

use sqlx::postgres::PgPoolOptions;
use tokio::sync::{Mutex, MutexGuard};
use todo_server::model::{NewTodo, TodoField};
use todo_server::{PostgresTodoRepository, TodoRepository};

// Tests share one table; run them one at a time.
static DATABASE: Mutex<()> = Mutex::const_new(());

async fn repository() -> (MutexGuard<'static, ()>, PostgresTodoRepository) {
    let guard = DATABASE.lock().await;
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .unwrap();
    let repository = PostgresTodoRepository::new(pool);
    repository.migrate().await.unwrap();
    sqlx::query("DELETE FROM todos")
        .execute(repository.pool())
        .await
        .unwrap();
    (guard, repository)
}

fn new_todo(name: &str, create_time: &str, importance: i32) -> NewTodo {
    NewTodo {
        name: name.to_string(),
        create_time: create_time.to_string(),
        importance,
    }
}

#[tokio::test]
#[ignore = "Requires PostgreSQL instance"]
async fn insert_then_list_round_trips() {
    let (_guard, repository) = repository().await;
    let created = repository
        .insert(new_todo("Buy milk", "2024-05-01", 1))
        .await
        .unwrap();
    assert!(!created.flag);
    assert_eq!(created.created_at, created.updated_at);

    let todos = repository.list().await.unwrap();
    assert_eq!(todos, vec![created]);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL instance"]
async fn list_orders_by_importance_then_date() {
    let (_guard, repository) = repository().await;
    repository.insert(new_todo("low", "2024-01-01", 1)).await.unwrap();
    repository.insert(new_todo("late", "2024-06-01", 5)).await.unwrap();
    repository.insert(new_todo("early", "2024-02-01", 5)).await.unwrap();

    let names: Vec<_> = repository
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|todo| todo.name)
        .collect();
    assert_eq!(names, ["early", "late", "low"]);
    assert_eq!(repository.max_importance().await.unwrap(), 5);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL instance"]
async fn max_importance_of_empty_table_is_zero() {
    let (_guard, repository) = repository().await;
    assert_eq!(repository.max_importance().await.unwrap(), 0);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL instance"]
async fn update_touches_only_supplied_fields() {
    let (_guard, repository) = repository().await;
    let created = repository
        .insert(new_todo("Walk dog", "2024-01-01", 3))
        .await
        .unwrap();

    let updated = repository
        .update(
            created.id,
            &[TodoField::Name("Walk cat".to_string()), TodoField::Flag(true)],
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.name, "Walk cat");
    assert!(updated.flag);
    assert_eq!(updated.create_time, "2024-01-01");
    assert_eq!(updated.importance, 3);
    assert!(updated.updated_at >= created.updated_at);

    let missing = repository
        .update(created.id + 1000, &[TodoField::Flag(true)])
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL instance"]
async fn delete_reports_affected_rows() {
    let (_guard, repository) = repository().await;
    let created = repository
        .insert(new_todo("gone", "2024-01-01", 1))
        .await
        .unwrap();
    assert!(repository.delete(created.id).await.unwrap());
    assert!(!repository.delete(created.id).await.unwrap());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL instance"]
async fn reorder_assigns_descending_ranks() {
    let (_guard, repository) = repository().await;
    let one = repository.insert(new_todo("one", "2024-01-01", 1)).await.unwrap();
    let two = repository.insert(new_todo("two", "2024-01-01", 2)).await.unwrap();
    let three = repository.insert(new_todo("three", "2024-01-01", 3)).await.unwrap();

    repository
        .reorder(&[three.id, one.id, -1, two.id])
        .await
        .unwrap();

    let order: Vec<_> = repository
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|todo| (todo.id, todo.importance))
        .collect();
    assert_eq!(order, vec![(three.id, 4), (one.id, 3), (two.id, 1)]);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL instance"]
async fn reorder_rolls_back_when_a_statement_fails() {
    let (_guard, repository) = repository().await;
    let one = repository.insert(new_todo("one", "2024-01-01", 1)).await.unwrap();
    let two = repository.insert(new_todo("two", "2024-01-01", 2)).await.unwrap();
    let before = repository.list().await.unwrap();

    // Abort any transaction that writes importance 1, i.e. the last id of a batch.
    sqlx::query(
        "CREATE OR REPLACE FUNCTION reject_rank_one() RETURNS trigger AS $$ \
         BEGIN IF NEW.importance = 1 THEN RAISE EXCEPTION 'rank one rejected'; END IF; \
         RETURN NEW; END $$ LANGUAGE plpgsql",
    )
    .execute(repository.pool())
    .await
    .unwrap();
    sqlx::query(
        "CREATE TRIGGER reject_rank_one BEFORE UPDATE ON todos \
         FOR EACH ROW EXECUTE FUNCTION reject_rank_one()",
    )
    .execute(repository.pool())
    .await
    .unwrap();

    let result = repository.reorder(&[one.id, two.id]).await;

    sqlx::query("DROP TRIGGER reject_rank_one ON todos")
        .execute(repository.pool())
        .await
        .unwrap();
    sqlx::query("DROP FUNCTION reject_rank_one()")
        .execute(repository.pool())
        .await
        .unwrap();

    assert!(result.is_err());
    assert_eq!(repository.list().await.unwrap(), before);
}
