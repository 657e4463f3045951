use axum::{
    body::Bytes,
    extract::{FromRequest, Path, Request, State},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::{AppError, StorageContext};
use crate::model::{
    today, CreateTodo, HealthResponse, MessageResponse, NewTodo, ReorderTodos, TodoListResponse,
    TodoResponse, UpdateTodo, MAX_REORDER_IDS,
};
use crate::AppState;

/// JSON request body decoded whatever the `Content-Type` says. Unreadable or
/// malformed bodies become 400 `{"error": ...}` responses.
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(request, state)
            .await
            .map_err(|rejection| AppError::client_input(rejection.body_text()))?;
        serde_json::from_slice(&bytes)
            .map(ApiJson)
            .map_err(|error| AppError::client_input(error.to_string()))
    }
}

fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse()
        .map_err(|_| AppError::client_input("Invalid todo ID"))
}

fn check_reorder_size(count: usize) -> Result<(), AppError> {
    if count > MAX_REORDER_IDS {
        return Err(AppError::client_input("Too many todos to reorder"));
    }
    Ok(())
}

fn todo_not_found() -> AppError {
    AppError::NotFound("Todo not found".to_string())
}

pub async fn list_todos(State(state): State<AppState>) -> Result<Json<TodoListResponse>, AppError> {
    let todos = state
        .repository
        .list()
        .await
        .context("Failed to fetch todos")?;
    Ok(Json(TodoListResponse { todos }))
}

pub async fn create_todo(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateTodo>,
) -> Result<(StatusCode, Json<TodoResponse>), AppError> {
    input.validate()?;

    let create_time = input
        .create_time
        .filter(|date| !date.is_empty())
        .unwrap_or_else(today);

    // Read and insert are separate statements; two concurrent creates may
    // end up with the same importance.
    let importance = match input.importance {
        Some(importance) if importance != 0 => importance,
        _ => {
            let max = state
                .repository
                .max_importance()
                .await
                .context("Failed to get max importance")?;
            max.saturating_add(1)
        }
    };

    let todo = state
        .repository
        .insert(NewTodo {
            name: input.name,
            create_time,
            importance,
        })
        .await
        .context("Failed to create todo")?;
    tracing::debug!(id = todo.id, importance = todo.importance, "todo created");
    Ok((StatusCode::CREATED, Json(TodoResponse { todo })))
}

pub async fn update_todo(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Result<ApiJson<UpdateTodo>, AppError>,
) -> Result<Json<TodoResponse>, AppError> {
    let id = parse_id(&raw_id)?;
    let ApiJson(input) = body?;
    input.validate()?;

    let fields = input.into_fields();
    if fields.is_empty() {
        return Err(AppError::client_input("No fields to update"));
    }

    let todo = state
        .repository
        .update(id, &fields)
        .await
        .context("Failed to update todo")?
        .ok_or_else(todo_not_found)?;
    Ok(Json(TodoResponse { todo }))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&raw_id)?;
    let deleted = state
        .repository
        .delete(id)
        .await
        .context("Failed to delete todo")?;
    if !deleted {
        return Err(todo_not_found());
    }
    Ok(Json(MessageResponse::new("Todo deleted successfully")))
}

/// Drag-and-drop ordering: the first id in the list ends up on top.
pub async fn reorder_todos(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ReorderTodos>,
) -> Result<Json<MessageResponse>, AppError> {
    check_reorder_size(input.todo_ids.len())?;
    state
        .repository
        .reorder(&input.todo_ids)
        .await
        .context("Failed to reorder todos")?;
    tracing::debug!(count = input.todo_ids.len(), "todos reordered");
    Ok(Json(MessageResponse::new("Todos reordered successfully")))
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Todo App API is running".to_string(),
    })
}
