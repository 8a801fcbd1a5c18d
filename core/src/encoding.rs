//! Body encoders: JSON text, URL-encoded forms and multipart payloads.
//!
//! Form encoding flattens nested values with bracket keys (`tags[0]=a`,
//! `user[name]=b`), writes booleans as `1`/`0`, and drops nulls.

use serde::Serialize;
use serde_json::{Map, Value};
use url::form_urlencoded;
use uuid::Uuid;

use crate::error::{HttpError, Result};
use crate::http::MultipartForm;

pub const JSON: &str = "application/json";
pub const XML: &str = "application/xml";
pub const FORM: &str = "application/x-www-form-urlencoded";
pub const MULTIPART: &str = "multipart/form-data";

/// Serialize `value` to compact JSON text. Non-ASCII and `/` are left as-is.
pub fn to_json_text<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| HttpError::Encoding(e.to_string()))
}

/// URL-encode a field mapping as `k=v&k2=v2`.
pub fn encode_form(fields: &Map<String, Value>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (name, value) in flatten(fields) {
        serializer.append_pair(&name, &value);
    }
    serializer.finish()
}

/// Flatten a mapping into `(name, text)` pairs in insertion order.
pub fn flatten(fields: &Map<String, Value>) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (name, value) in fields {
        flatten_value(name.clone(), value, &mut pairs);
    }
    pairs
}

fn flatten_value(name: String, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(flag) => out.push((name, if *flag { "1" } else { "0" }.to_string())),
        Value::Number(n) => out.push((name, n.to_string())),
        Value::String(s) => out.push((name, s.clone())),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_value(format!("{name}[{index}]"), item, out);
            }
        }
        Value::Object(entries) => {
            for (key, item) in entries {
                flatten_value(format!("{name}[{key}]"), item, out);
            }
        }
    }
}

/// Random boundary for one multipart body.
pub fn multipart_boundary() -> String {
    format!("------------------------{}", Uuid::new_v4().simple())
}

/// Encode text fields and file parts as `multipart/form-data`.
///
/// File contents are read eagerly; a missing or unreadable file fails the
/// whole body.
pub fn encode_multipart(form: &MultipartForm, boundary: &str) -> Result<Vec<u8>> {
    let mut out = Vec::new();

    for (name, value) in flatten(&form.fields) {
        out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        out.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", quote(&name)).as_bytes(),
        );
        out.extend_from_slice(value.as_bytes());
        out.extend_from_slice(b"\r\n");
    }

    for part in &form.files {
        let contents = std::fs::read(&part.path).map_err(|source| HttpError::File {
            path: part.path.clone(),
            source,
        })?;
        out.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        out.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                quote(&part.field),
                quote(&part.file_name())
            )
            .as_bytes(),
        );
        out.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        out.extend_from_slice(&contents);
        out.extend_from_slice(b"\r\n");
    }

    out.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    Ok(out)
}

fn quote(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn form_keeps_insertion_order_and_escapes() {
        let fields = map(json!({"username": "john doe", "password": "s&cret"}));
        assert_eq!(encode_form(&fields), "username=john+doe&password=s%26cret");
    }

    #[test]
    fn form_flattens_scalars_like_a_query_builder() {
        let fields = map(json!({"n": 30, "yes": true, "no": false, "skip": null}));
        assert_eq!(encode_form(&fields), "n=30&yes=1&no=0");
    }

    #[test]
    fn form_flattens_nested_values_with_brackets() {
        let fields = map(json!({"tags": ["a", "b"], "user": {"name": "x"}}));
        assert_eq!(
            flatten(&fields),
            vec![
                ("tags[0]".to_string(), "a".to_string()),
                ("tags[1]".to_string(), "b".to_string()),
                ("user[name]".to_string(), "x".to_string()),
            ]
        );
        assert_eq!(
            encode_form(&fields),
            "tags%5B0%5D=a&tags%5B1%5D=b&user%5Bname%5D=x"
        );
    }

    #[test]
    fn json_text_leaves_unicode_and_slashes_unescaped() {
        let text = to_json_text(&json!({"path": "a/b", "name": "Zoë"})).unwrap();
        assert_eq!(text, r#"{"path":"a/b","name":"Zoë"}"#);
    }

    #[test]
    fn multipart_contains_fields_and_terminator() {
        let form = MultipartForm {
            fields: map(json!({"title": "hello"})),
            files: Vec::new(),
        };
        let body = String::from_utf8(encode_multipart(&form, "XYZ").unwrap()).unwrap();
        assert_eq!(
            body,
            "--XYZ\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nhello\r\n--XYZ--\r\n"
        );
    }

    #[test]
    fn multipart_with_missing_file_fails() {
        let mut form = MultipartForm::default();
        form.add_file("doc", std::path::Path::new("/definitely/not/here.txt"));
        let err = encode_multipart(&form, "XYZ").unwrap_err();
        assert!(matches!(err, HttpError::File { .. }));
    }

    #[test]
    fn boundaries_are_unique() {
        assert_ne!(multipart_boundary(), multipart_boundary());
    }
}
