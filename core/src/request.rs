//! Immutable request produced by `RequestBuilder::build`.

use serde_json::Value;

use crate::builder::RequestBuilder;
use crate::config::RequestOptions;
use crate::encoding::to_json_text;
use crate::error::{HttpError, Result};
use crate::http::{find_header, Body, HttpMethod};

/// A fully specified HTTP request.
///
/// Only `RequestBuilder` can construct one; fields are read through
/// accessors and never change after `build`.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: HttpMethod,
    url: String,
    headers: Vec<(String, String)>,
    body: Body,
    options: RequestOptions,
}

impl Request {
    /// Start a new builder. Shorthand for `RequestBuilder::new()`.
    pub fn builder() -> RequestBuilder {
        RequestBuilder::new()
    }

    pub(crate) fn from_builder(
        method: HttpMethod,
        url: String,
        headers: Vec<(String, String)>,
        body: Body,
        options: RequestOptions,
    ) -> Self {
        Self {
            method,
            url,
            headers,
            body,
            options,
        }
    }

    pub fn method(&self) -> &HttpMethod {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Header value by exact name.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    /// Render the body as JSON text.
    ///
    /// A raw body becomes a JSON string literal. Multipart bodies hold file
    /// references and fail with `HttpError::Encoding`.
    pub fn to_json(&self) -> Result<String> {
        match &self.body {
            Body::Fields(fields) => to_json_text(fields),
            Body::Raw(text) => to_json_text(&Value::String(text.clone())),
            Body::Multipart(form) => Err(HttpError::Encoding(format!(
                "multipart body with {} file part(s) cannot be rendered as JSON",
                form.files.len()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_properties() {
        let request = Request::builder()
            .method("get")
            .url("https://example.com")
            .header("Authorization", "Bearer token")
            .body([("key", "value")])
            .build();

        assert_eq!(request.method(), &HttpMethod::Get);
        assert_eq!(request.url(), "https://example.com");
        assert_eq!(
            request.headers(),
            &[("Authorization".to_string(), "Bearer token".to_string())]
        );
        assert_eq!(request.header("Authorization"), Some("Bearer token"));
        assert_eq!(request.header("authorization"), None);
        assert_eq!(
            request.body().as_fields().map(|f| Value::Object(f.clone())),
            Some(json!({"key": "value"}))
        );
        assert_eq!(request.to_json().unwrap(), r#"{"key":"value"}"#);
    }

    #[test]
    fn raw_body_renders_as_json_string() {
        let request = Request::builder().xml_body("<a href=\"/x\"/>").build();
        assert_eq!(request.to_json().unwrap(), r#""<a href=\"/x\"/>""#);
    }

    #[test]
    fn multipart_body_cannot_render_as_json() {
        let request = Request::builder().file("doc", "/tmp/report.pdf").build();
        let err = request.to_json().unwrap_err();
        assert!(matches!(err, HttpError::Encoding(_)));
    }

    #[test]
    fn empty_body_renders_as_empty_object() {
        let request = Request::builder().build();
        assert_eq!(request.to_json().unwrap(), "{}");
    }
}
