//! Stateless request builder and response parser for the todo API.
//!
//! # Design
//! `TodoClient` holds only a `base_url`. Every operation is a `build_*`
//! method producing an `HttpRequest` and a `parse_*` method consuming the
//! matching `HttpResponse`; the caller does the round-trip in between.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{CreateTodo, Health, ReorderTodos, Todo, UpdateTodo};

#[derive(Deserialize)]
struct TodosEnvelope {
    // Older deployments send `null` for an empty list.
    todos: Option<Vec<Todo>>,
}

#[derive(Deserialize)]
struct TodoEnvelope {
    todo: Todo,
}

#[derive(Deserialize)]
struct MessageEnvelope {
    message: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Synchronous, stateless client for the todo API.
#[derive(Debug, Clone)]
pub struct TodoClient {
    base_url: String,
}

impl TodoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn todos_url(&self) -> String {
        format!("{}/api/todos", self.base_url)
    }

    pub fn build_list_todos(&self) -> HttpRequest {
        HttpRequest::without_body(HttpMethod::Get, self.todos_url())
    }

    pub fn build_create_todo(&self, input: &CreateTodo) -> Result<HttpRequest, ApiError> {
        HttpRequest::with_json(HttpMethod::Post, self.todos_url(), input)
    }

    pub fn build_update_todo(&self, id: i64, input: &UpdateTodo) -> Result<HttpRequest, ApiError> {
        HttpRequest::with_json(HttpMethod::Put, format!("{}/{id}", self.todos_url()), input)
    }

    pub fn build_delete_todo(&self, id: i64) -> HttpRequest {
        HttpRequest::without_body(HttpMethod::Delete, format!("{}/{id}", self.todos_url()))
    }

    /// `todo_ids` in display order; the first id ends up on top.
    pub fn build_reorder_todos(&self, todo_ids: &[i64]) -> Result<HttpRequest, ApiError> {
        let payload = ReorderTodos {
            todo_ids: todo_ids.to_vec(),
        };
        HttpRequest::with_json(
            HttpMethod::Post,
            format!("{}/reorder", self.todos_url()),
            &payload,
        )
    }

    pub fn build_health(&self) -> HttpRequest {
        HttpRequest::without_body(HttpMethod::Get, format!("{}/health", self.base_url))
    }

    pub fn parse_list_todos(&self, response: HttpResponse) -> Result<Vec<Todo>, ApiError> {
        let envelope: TodosEnvelope = parse_body(&response, 200)?;
        Ok(envelope.todos.unwrap_or_default())
    }

    pub fn parse_create_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        let envelope: TodoEnvelope = parse_body(&response, 201)?;
        Ok(envelope.todo)
    }

    pub fn parse_update_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        let envelope: TodoEnvelope = parse_body(&response, 200)?;
        Ok(envelope.todo)
    }

    /// Returns the server's confirmation message.
    pub fn parse_delete_todo(&self, response: HttpResponse) -> Result<String, ApiError> {
        let envelope: MessageEnvelope = parse_body(&response, 200)?;
        Ok(envelope.message)
    }

    pub fn parse_reorder_todos(&self, response: HttpResponse) -> Result<String, ApiError> {
        let envelope: MessageEnvelope = parse_body(&response, 200)?;
        Ok(envelope.message)
    }

    pub fn parse_health(&self, response: HttpResponse) -> Result<Health, ApiError> {
        parse_body(&response, 200)
    }
}

fn parse_body<T: DeserializeOwned>(response: &HttpResponse, expected: u16) -> Result<T, ApiError> {
    check_status(response, expected)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    match response.status {
        status if status == expected => Ok(()),
        400 => Err(ApiError::BadRequest(error_message(&response.body))),
        404 => Err(ApiError::NotFound),
        status => Err(ApiError::HttpError {
            status,
            body: response.body.clone(),
        }),
    }
}

/// The `error` field of a JSON error body, or the raw body otherwise.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|parsed| parsed.error)
        .unwrap_or_else(|_| body.to_string())
}
