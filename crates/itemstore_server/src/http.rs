//! Transport-neutral HTTP request/response types.
//!
//! # Responsibility
//! - Give the item handler a request/response shape it can be tested with
//!   directly, without a socket.
//! - Define the `HttpService` seam the server dispatches into.

use log::error;
use serde::Serialize;
use std::fmt::{Display, Formatter};

const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Other(String),
}

impl HttpMethod {
    /// Parses a method token, case-insensitively.
    pub fn parse(method: &str) -> Self {
        match method.to_ascii_uppercase().as_str() {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "PATCH" => Self::Patch,
            "DELETE" => Self::Delete,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Other(other) => other.as_str(),
        }
    }
}

impl Display for HttpMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Incoming request. `path` never includes the query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    method: HttpMethod,
    path: String,
    body: Vec<u8>,
}

impl HttpRequest {
    /// Builds a request from a raw request target such as `/items/1?x=y`.
    pub fn new(method: HttpMethod, target: &str) -> Self {
        let path = target.split_once('?').map_or(target, |(path, _)| path);
        Self {
            method,
            path: path.to_string(),
            body: Vec::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &HttpMethod {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// Status codes produced by this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatus {
    Ok = 200,
    Created = 201,
    NoContent = 204,
    BadRequest = 400,
    NotFound = 404,
    MethodNotAllowed = 405,
    PayloadTooLarge = 413,
    InternalServerError = 500,
}

impl HttpStatus {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

/// Outgoing response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    status: HttpStatus,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: HttpStatus) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn no_content() -> Self {
        Self::new(HttpStatus::NoContent)
    }

    /// Serializes `value` as the JSON body.
    ///
    /// A value that fails to serialize yields a 500 instead of a partial body.
    pub fn json<T: Serialize + ?Sized>(status: HttpStatus, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self::new(status)
                .with_header("Content-Type", JSON_CONTENT_TYPE)
                .with_body(body),
            Err(err) => {
                error!("event=http_encode module=http status=error error={err}");
                Self::error(HttpStatus::InternalServerError, "failed to encode response")
            }
        }
    }

    /// `{"error": message}` with the given status.
    pub fn error(status: HttpStatus, message: &str) -> Self {
        let body = serde_json::to_vec(&ErrorBody { error: message }).unwrap_or_default();
        Self::new(status)
            .with_header("Content-Type", JSON_CONTENT_TYPE)
            .with_body(body)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn status(&self) -> HttpStatus {
        self.status
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_parts(self) -> (HttpStatus, Vec<(String, String)>, Vec<u8>) {
        (self.status, self.headers, self.body)
    }
}

/// Request handler the server dispatches every request to.
pub trait HttpService: Send + Sync + 'static {
    fn handle_request(&self, request: HttpRequest) -> HttpResponse;
}
