//! HTTP/JSON service for a single, reorderable todo list.
//!
//! # Overview
//! `app` builds the axum router over a [`TodoRepository`]; `run` serves it on
//! a bound listener. Routes live under `/api/todos` plus a `/health` probe.
//!
//! # Design
//! - Handlers only talk to `Arc<dyn TodoRepository>`, so the same router
//!   runs against PostgreSQL in production and the in-memory store in tests.
//! - Every request runs under a timeout and gets 408 `{"error": ...}` when it
//!   expires. Dropping a timed-out handler drops any open reorder transaction
//!   with it, which rolls the batch back.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    middleware,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod cors;
pub mod error;
pub mod handlers;
pub mod model;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use error::AppError;
pub use model::TodoItem;
pub use store::{InMemoryTodoRepository, PostgresTodoRepository, StoreError, TodoRepository};

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn TodoRepository>,
}

impl AppState {
    pub fn new(repository: Arc<dyn TodoRepository>) -> Self {
        Self { repository }
    }
}

pub fn app(state: AppState, request_timeout: Duration) -> Router {
    let todos = Router::new()
        .route("/todos", get(handlers::list_todos).post(handlers::create_todo))
        .route("/todos/reorder", post(handlers::reorder_todos))
        .route(
            "/todos/{id}",
            put(handlers::update_todo).delete(handlers::delete_todo),
        );

    Router::new()
        .nest("/api", todos)
        .route("/health", get(handlers::health_check))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(error::handle_middleware_error))
                .timeout(request_timeout),
        )
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(cors::cors))
}

pub async fn run<S>(listener: TcpListener, app: Router, shutdown: S) -> Result<(), std::io::Error>
where
    S: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}
