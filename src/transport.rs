//! Request and response shapes at the transport boundary.

use crate::record::collection::RecordCollection;
use crate::record::Record;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{Map, Value};

/// Recognized HTTP methods, in `Allow`-header order. Raw method strings
/// outside this set are rejected at the routing layer with a 405.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Head,
    Get,
    Post,
    Put,
    Delete,
    Options,
}

impl Method {
    pub const ALL: [Method; 6] = [
        Method::Head,
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Delete,
        Method::Options,
    ];

    pub fn parse(raw: &str) -> Option<Method> {
        match raw.to_lowercase().as_str() {
            "head" => Some(Method::Head),
            "get" => Some(Method::Get),
            "post" => Some(Method::Post),
            "put" => Some(Method::Put),
            "delete" => Some(Method::Delete),
            "options" => Some(Method::Options),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Head => "head",
            Method::Get => "get",
            Method::Post => "post",
            Method::Put => "put",
            Method::Delete => "delete",
            Method::Options => "options",
        }
    }

    /// Permission component guarding this method, if any.
    pub fn required_component(&self) -> Option<&'static str> {
        match self {
            Method::Head | Method::Get => Some("search"),
            Method::Post => Some("create"),
            Method::Put => Some("edit"),
            Method::Delete => Some("delete"),
            Method::Options => None,
        }
    }

    /// Comma-joined upper-case method list for the Allow header.
    pub fn allow_header() -> String {
        Method::ALL
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(",")
            .to_uppercase()
    }
}

/// One request as the dispatcher sees it: routing fields plus the raw
/// query/body parameters. URI parsing happens outside the core.
#[derive(Clone, Debug)]
pub struct Route {
    pub method: Method,
    pub action: String,
    pub sub_action: String,
    pub id: Option<i64>,
    pub query: Map<String, Value>,
    pub body: Map<String, Value>,
    pub ajax: bool,
}

impl Route {
    pub fn new(method: Method, action: &str) -> Self {
        Route {
            method,
            action: action.to_string(),
            sub_action: String::new(),
            id: None,
            query: Map::new(),
            body: Map::new(),
            ajax: false,
        }
    }

    pub fn with_sub_action(mut self, sub_action: &str) -> Self {
        self.sub_action = sub_action.to_string();
        self
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_query(mut self, query: Map<String, Value>) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: Map<String, Value>) -> Self {
        self.body = body;
        self
    }

    pub fn ajax(mut self) -> Self {
        self.ajax = true;
        self
    }
}

/// What a handler produced.
pub enum ApiOutcome {
    Record(Record),
    Collection(RecordCollection),
    Value(Value),
    None,
}

impl ApiOutcome {
    /// Flatten records and collections to their full data form before they
    /// cross the transport boundary; plain values pass through unchanged.
    pub fn into_body(self) -> Option<Value> {
        match self {
            ApiOutcome::Record(record) => Some(record.all()),
            ApiOutcome::Collection(collection) => Some(collection.all()),
            ApiOutcome::Value(value) => Some(value),
            ApiOutcome::None => None,
        }
    }
}

/// Final dispatch product: status, optional Allow header, optional JSON body.
#[derive(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub allow: Option<String>,
    pub body: Option<Value>,
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let mut response = match self.body {
            Some(body) => (self.status, Json(body)).into_response(),
            None => self.status.into_response(),
        };
        if let Some(allow) = self.allow {
            if let Ok(value) = HeaderValue::from_str(&allow) {
                response.headers_mut().insert(header::ALLOW, value);
            }
        }
        response
    }
}
