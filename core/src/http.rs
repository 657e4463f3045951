//! Plain-data HTTP requests and responses.
//!
//! The client never performs I/O: it hands an `HttpRequest` to the host and
//! gets an `HttpResponse` back. Everything is owned so values can move across
//! threads or language boundaries freely.

use serde::Serialize;

use crate::error::ApiError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// Upper-case method name as it appears on the request line.
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// A request the host should execute. `path` is the absolute URL.
///
/// Built by `TodoClient::build_*`; the host sends it and hands the result
/// back as an `HttpResponse`.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub(crate) fn without_body(method: HttpMethod, path: String) -> Self {
        Self {
            method,
            path,
            headers: Vec::new(),
            body: None,
        }
    }

    pub(crate) fn with_json<T: Serialize>(
        method: HttpMethod,
        path: String,
        payload: &T,
    ) -> Result<Self, ApiError> {
        let body = serde_json::to_string(payload)
            .map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(Self {
            method,
            path,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }
}

/// What the host got back after executing an `HttpRequest`.
///
/// Passed to `TodoClient::parse_*` for status mapping and decoding.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// A response with no headers, which is all the parsers look at.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_names_match_request_line() {
        let names: Vec<_> = [
            HttpMethod::Get,
            HttpMethod::Post,
            HttpMethod::Put,
            HttpMethod::Delete,
        ]
        .into_iter()
        .map(HttpMethod::as_str)
        .collect();
        assert_eq!(names, ["GET", "POST", "PUT", "DELETE"]);
    }

    #[test]
    fn json_request_sets_content_type() {
        let req = HttpRequest::with_json(HttpMethod::Post, "http://h/x".to_string(), &[1, 2])
            .unwrap();
        assert_eq!(req.method.as_str(), "POST");
        assert_eq!(req.body.as_deref(), Some("[1,2]"));
        assert_eq!(
            req.headers,
            vec![("content-type".to_string(), "application/json".to_string())]
        );
    }
}
