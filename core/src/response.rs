//! HTTP outcome returned by `HttpClient::send`.
//!
//! # Design
//! The raw body is always kept. JSON views decode it on every call, so they
//! are pure and repeatable, and a body that is not JSON only fails the view
//! that asked for it, never the send.

use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{HttpError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
}

impl Response {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Attach response headers in the order they were received.
    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// True for 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Header value by name, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Decode the body as a JSON object.
    ///
    /// An empty body yields an empty map. Malformed JSON, or JSON whose top
    /// level is not an object, fails with `HttpError::Decoding`.
    pub fn to_map(&self) -> Result<Map<String, Value>> {
        match self.to_value()? {
            None => Ok(Map::new()),
            Some(Value::Object(map)) => Ok(map),
            Some(other) => Err(HttpError::Decoding(format!(
                "expected a JSON object, found {}",
                kind(&other)
            ))),
        }
    }

    /// Decode the body as a generic JSON value; `None` when the body is empty.
    pub fn to_value(&self) -> Result<Option<Value>> {
        if self.body.is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&self.body)
            .map(Some)
            .map_err(|e| HttpError::Decoding(e.to_string()))
    }

    /// Decode the body into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| HttpError::Decoding(e.to_string()))
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.body)
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn response_properties() {
        let response = Response::new(200, r#"{"success":true}"#);
        assert_eq!(response.status(), 200);
        assert!(response.is_success());
        assert_eq!(response.body(), r#"{"success":true}"#);
        assert_eq!(Value::Object(response.to_map().unwrap()), json!({"success": true}));
    }

    #[test]
    fn empty_body_decodes_to_empty_views() {
        let response = Response::new(204, "");
        assert!(response.to_map().unwrap().is_empty());
        assert_eq!(response.to_value().unwrap(), None);
    }

    #[test]
    fn malformed_json_fails_both_views() {
        let response = Response::new(200, r#"{"key": "value""#);
        assert!(matches!(response.to_map(), Err(HttpError::Decoding(_))));
        assert!(matches!(response.to_value(), Err(HttpError::Decoding(_))));
        // The raw body is still there.
        assert_eq!(response.body(), r#"{"key": "value""#);
    }

    #[test]
    fn non_object_json_is_not_a_map() {
        let response = Response::new(200, "[1,2,3]");
        assert!(matches!(response.to_map(), Err(HttpError::Decoding(_))));
        assert_eq!(response.to_value().unwrap(), Some(json!([1, 2, 3])));
    }

    #[test]
    fn value_view_keeps_nested_structure() {
        let response = Response::new(200, r#"{"key": "value", "nested": {"list": [1, null]}}"#);
        let value = response.to_value().unwrap().unwrap();
        assert_eq!(value["key"], "value");
        assert_eq!(value["nested"]["list"][0], 1);
        assert!(value["nested"]["list"][1].is_null());
    }

    #[test]
    fn decoding_is_repeatable() {
        let response = Response::new(200, r#"{"a":1,"b":[true]}"#);
        assert_eq!(response.to_map().unwrap(), response.to_map().unwrap());
        assert_eq!(response.to_value().unwrap(), response.to_value().unwrap());
    }

    #[test]
    fn status_is_not_validated() {
        let response = Response::new(999, "");
        assert_eq!(response.status(), 999);
        assert!(!response.is_success());
    }

    #[test]
    fn typed_decode() {
        #[derive(Debug, Deserialize)]
        struct User {
            name: String,
        }
        let user: User = Response::new(200, r#"{"name":"John"}"#).json().unwrap();
        assert_eq!(user.name, "John");

        let err = Response::new(200, "nope").json::<User>().unwrap_err();
        assert!(matches!(err, HttpError::Decoding(_)));
    }

    #[test]
    fn displays_raw_body() {
        let response = Response::new(500, "internal error");
        assert_eq!(response.to_string(), "internal error");
        assert_eq!(format!("got: {response}"), "got: internal error");
    }

    #[test]
    fn header_lookup_ignores_case() {
        let response = Response::new(200, "")
            .with_headers(vec![("content-type".to_string(), "text/plain".to_string())]);
        assert_eq!(response.header("Content-Type"), Some("text/plain"));
        assert_eq!(response.header("X-Missing"), None);
    }
}
