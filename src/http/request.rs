//! Request handling.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for every request
//! - Collect query and form fields into an ordered field bag
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Fields keep arrival order; a repeated name keeps its first position and
//!   takes the last value

use axum::http::{HeaderMap, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates `x-request-id` values.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// The request ID header value, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// Ordered mapping of request field names to raw values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestFields {
    entries: Vec<(String, String)>,
}

impl RequestFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fields from a URL query string.
    pub fn from_query(query: Option<&str>) -> Self {
        let mut fields = Self::new();
        if let Some(query) = query {
            fields.extend_urlencoded(query.as_bytes());
        }
        fields
    }

    /// Append `application/x-www-form-urlencoded` pairs.
    pub fn extend_urlencoded(&mut self, input: &[u8]) {
        for (name, value) in url::form_urlencoded::parse(input) {
            self.insert(name.into_owned(), value.into_owned());
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RequestFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Self::new();
        for (name, value) in iter {
            fields.insert(name, value);
        }
        fields
    }
}
