//! Plain-data building blocks shared by requests and responses.
//!
//! # Design
//! Headers are an ordered `Vec<(String, String)>` rather than a map so the
//! wire order matches insertion order. Names are compared case-sensitively
//! when stored, matching how callers set them; setting a name twice replaces
//! the value in place.
//!
//! `Body` is a tagged value: a field mapping, a pre-encoded string, or a
//! multipart form with file parts. The client decides how each variant is
//! put on the wire.

use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

/// Upper-case HTTP method token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Trace,
    Connect,
    /// Any other token, stored upper-cased.
    Other(String),
}

impl HttpMethod {
    /// Normalize `method` to upper case and map it onto a variant.
    pub fn parse(method: &str) -> Self {
        let upper = method.trim().to_ascii_uppercase();
        match upper.as_str() {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "PATCH" => HttpMethod::Patch,
            "DELETE" => HttpMethod::Delete,
            "HEAD" => HttpMethod::Head,
            "OPTIONS" => HttpMethod::Options,
            "TRACE" => HttpMethod::Trace,
            "CONNECT" => HttpMethod::Connect,
            _ => HttpMethod::Other(upper),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
            HttpMethod::Connect => "CONNECT",
            HttpMethod::Other(token) => token,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for HttpMethod {
    fn from(method: &str) -> Self {
        HttpMethod::parse(method)
    }
}

/// A file to upload as one part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field: String,
    pub path: PathBuf,
}

impl FilePart {
    /// File name sent in the part's `Content-Disposition`.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.field.clone())
    }
}

/// Text fields plus file parts of a `multipart/form-data` body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartForm {
    pub fields: Map<String, Value>,
    pub files: Vec<FilePart>,
}

impl MultipartForm {
    /// Add a file part, replacing an earlier part for the same field.
    pub fn add_file(&mut self, field: &str, path: &Path) {
        let part = FilePart {
            field: field.to_string(),
            path: path.to_path_buf(),
        };
        match self.files.iter_mut().find(|f| f.field == field) {
            Some(existing) => *existing = part,
            None => self.files.push(part),
        }
    }
}

/// Request body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Key/value mapping, encoded by the client according to `Content-Type`.
    Fields(Map<String, Value>),
    /// Pre-encoded text sent verbatim.
    Raw(String),
    Multipart(MultipartForm),
}

impl Default for Body {
    fn default() -> Self {
        Body::Fields(Map::new())
    }
}

impl Body {
    /// True for an empty mapping or an empty string.
    pub fn is_empty(&self) -> bool {
        match self {
            Body::Fields(fields) => fields.is_empty(),
            Body::Raw(text) => text.is_empty(),
            Body::Multipart(form) => form.fields.is_empty() && form.files.is_empty(),
        }
    }

    pub fn as_fields(&self) -> Option<&Map<String, Value>> {
        match self {
            Body::Fields(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> Option<&str> {
        match self {
            Body::Raw(text) => Some(text),
            _ => None,
        }
    }
}

/// Set `name` to `value`, replacing an existing entry in place.
pub(crate) fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: String) {
    match headers.iter_mut().find(|(k, _)| k == name) {
        Some(entry) => entry.1 = value,
        None => headers.push((name.to_string(), value)),
    }
}

/// Case-sensitive lookup, as headers are stored.
pub(crate) fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

/// Render headers as `Name: value` lines in stored order.
pub fn format_headers(headers: &[(String, String)]) -> Vec<String> {
    headers
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect()
}
