//! Synchronous API client core for the todo service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). The embedding app executes
//! the HTTP round-trip itself, so the core stays deterministic and testable.
//!
//! # Design
//! - `TodoClient` is stateless; it holds only `base_url`.
//! - Each operation is split into `build_*` (produces a request) and
//!   `parse_*` (consumes a response), keeping the I/O boundary explicit.
//! - Parsers unwrap the server's `{"todos": ..}` / `{"todo": ..}` /
//!   `{"message": ..}` envelopes and surface `{"error": ..}` bodies as
//!   `ApiError` values.

pub mod client;
pub mod error;
pub mod http;
pub mod types;

pub use client::TodoClient;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use types::{CreateTodo, Health, ReorderTodos, Todo, UpdateTodo};
