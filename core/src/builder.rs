//! Fluent construction of `Request` values.
//!
//! # Design
//! `RequestBuilder` is an owned value: every setter takes `self` and hands it
//! back, so a builder has exactly one owner at a time and is never shared
//! while it is being filled in. `build` borrows, so the same builder can
//! snapshot several requests.
//!
//! Transport settings (timeout, retries, TLS, proxy, redirects, accepted
//! statuses, simulation, background dispatch) go into `RequestOptions` and
//! are read by `HttpClient`; they are never sent to the server as headers.

use std::path::Path;
use std::time::Duration;

use base64::prelude::*;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::RequestOptions;
use crate::encoding::{self, encode_form, to_json_text};
use crate::error::Result;
use crate::http::{find_header, set_header, Body, HttpMethod, MultipartForm};
use crate::request::Request;

/// Accumulates method, URL, headers, body and transport options.
///
/// ```
/// use jm_http::RequestBuilder;
///
/// let request = RequestBuilder::new()
///     .method("post")
///     .url("https://api.example.com/users")
///     .bearer_auth("token")
///     .json_body(&serde_json::json!({"name": "John"}))
///     .unwrap()
///     .build();
///
/// assert_eq!(request.method().as_str(), "POST");
/// assert_eq!(request.header("Content-Type"), Some("application/json"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    method: HttpMethod,
    url: String,
    headers: Vec<(String, String)>,
    body: Body,
    options: RequestOptions,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the method, normalized to upper case.
    pub fn method(mut self, method: &str) -> Self {
        self.method = HttpMethod::parse(method);
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set one header; a second call with the same name replaces the value.
    ///
    /// Names are stored as given and matched case-sensitively, so
    /// `header("content-type", ..)` and `content_type(..)` keep two separate
    /// entries and both are sent. Use the same spelling to overwrite.
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        set_header(&mut self.headers, name, value.into());
        self
    }

    /// Replace every header.
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers.clear();
        for (name, value) in headers {
            let name: String = name.into();
            set_header(&mut self.headers, &name, value.into());
        }
        self
    }

    /// Replace the body with a field mapping.
    pub fn body<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.body = Body::Fields(collect_fields(fields));
        self
    }

    /// Append URL-encoded query parameters.
    ///
    /// Uses `?` when the URL has no query string yet and `&` otherwise.
    /// Existing parameters are left alone, so repeated keys accumulate.
    pub fn query_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let query = encode_form(&collect_fields(params));
        if query.is_empty() {
            return self;
        }
        let separator = if self.url.contains('?') { '&' } else { '?' };
        self.url.push(separator);
        self.url.push_str(&query);
        self
    }

    pub fn basic_auth(self, username: &str, password: &str) -> Self {
        let credentials = BASE64_STANDARD.encode(format!("{username}:{password}"));
        self.header("Authorization", format!("Basic {credentials}"))
    }

    pub fn bearer_auth(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {token}"))
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    /// Serialize `data` as the JSON body and set `Content-Type: application/json`.
    pub fn json_body<T: Serialize + ?Sized>(self, data: &T) -> Result<Self> {
        let text = to_json_text(data)?;
        let mut builder = self.content_type(encoding::JSON);
        builder.body = Body::Raw(text);
        Ok(builder)
    }

    /// Attach a file as a multipart part named `field`.
    ///
    /// Fields already in a mapping body are kept as text parts. A raw string
    /// body is discarded.
    pub fn file(mut self, field: &str, path: impl AsRef<Path>) -> Self {
        let mut form = match std::mem::take(&mut self.body) {
            Body::Multipart(form) => form,
            Body::Fields(fields) => MultipartForm {
                fields,
                files: Vec::new(),
            },
            Body::Raw(_) => MultipartForm::default(),
        };
        form.add_file(field, path.as_ref());
        self.body = Body::Multipart(form);
        self.content_type(encoding::MULTIPART)
    }

    pub fn user_agent(self, user_agent: &str) -> Self {
        self.header("User-Agent", user_agent)
    }

    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.options.follow_redirects = Some(follow);
        self
    }

    pub fn content_type(self, content_type: &str) -> Self {
        self.header("Content-Type", content_type)
    }

    /// Add `name=value` to the `Cookie` header, replacing a cookie of the
    /// same name and keeping the others.
    pub fn cookie(self, name: &str, value: &str) -> Self {
        let mut pairs: Vec<String> = find_header(&self.headers, "Cookie")
            .map(|existing| {
                existing
                    .split("; ")
                    .filter(|pair| !pair.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let entry = format!("{name}={value}");
        let prefix = format!("{name}=");
        match pairs.iter_mut().find(|pair| pair.starts_with(&prefix)) {
            Some(pair) => *pair = entry,
            None => pairs.push(entry),
        }
        self.header("Cookie", pairs.join("; "))
    }

    pub fn cookies<I, K, V>(self, cookies: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        cookies
            .into_iter()
            .fold(self, |builder, (name, value)| builder.cookie(name.as_ref(), value.as_ref()))
    }

    pub fn xml_body(mut self, xml: impl Into<String>) -> Self {
        self.body = Body::Raw(xml.into());
        self.content_type(encoding::XML)
    }

    /// URL-encode `data` as the body and set the form content type.
    pub fn form_data<I, K, V>(mut self, data: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.body = Body::Raw(encode_form(&collect_fields(data)));
        self.content_type(encoding::FORM)
    }

    /// Extra attempts after a transport failure.
    pub fn retries(mut self, retries: u32) -> Self {
        self.options.retries = Some(retries);
        self
    }

    /// Statuses the client treats as success; anything else fails with
    /// `HttpError::UnexpectedStatus`.
    pub fn accepted_status_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.options.accepted_status_codes = Some(codes.into_iter().collect());
        self
    }

    /// Answer with a synthetic `200` instead of touching the network.
    pub fn simulate(mut self, simulate: bool) -> Self {
        self.options.simulate = simulate;
        self
    }

    pub fn disable_tls_verification(mut self) -> Self {
        self.options.verify_tls = Some(false);
        self
    }

    /// Set `Connection: keep-alive` or `Connection: close`.
    pub fn keep_alive(self, keep_alive: bool) -> Self {
        self.header("Connection", if keep_alive { "keep-alive" } else { "close" })
    }

    /// Run on a background thread when sent through `HttpClient::dispatch`.
    pub fn asynchronous(mut self) -> Self {
        self.options.asynchronous = true;
        self
    }

    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.options.proxy = Some(proxy.into());
        self
    }

    /// Snapshot the current state. The builder stays usable.
    pub fn build(&self) -> Request {
        Request::from_builder(
            self.method.clone(),
            self.url.clone(),
            self.headers.clone(),
            self.body.clone(),
            self.options.clone(),
        )
    }
}

fn collect_fields<I, K, V>(fields: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    fields
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
