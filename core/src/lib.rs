//! Fluent builder for constructing and sending HTTP requests.
//!
//! # Overview
//! `RequestBuilder` accumulates method, URL, headers, body and transport
//! options through chained calls and freezes them into an immutable
//! `Request`. `HttpClient` executes a `Request` with one blocking call and
//! returns a `Response`, whose body can be read raw or decoded as JSON.
//!
//! # Design
//! - The builder is an owned value moved through each call; `build` borrows
//!   it, so one builder can produce several requests.
//! - Transport settings (timeout, retries, TLS verification, proxy,
//!   redirects, accepted statuses) travel as `RequestOptions` and are applied
//!   by the client. They are never sent to the server as headers.
//! - Bodies are tagged (`Body::Fields`, `Body::Raw`, `Body::Multipart`) and
//!   the client encodes each variant explicitly.
//! - Every failure is an `HttpError` returned to the immediate caller; HTTP
//!   status codes are data unless the caller narrows the accepted set.

pub mod builder;
pub mod client;
pub mod config;
pub mod encoding;
pub mod error;
pub mod http;
pub mod request;
pub mod response;

pub use builder::RequestBuilder;
pub use client::{HttpClient, PendingResponse};
pub use config::{ClientConfig, RequestOptions};
pub use error::{HttpError, Result};
pub use http::{Body, FilePart, HttpMethod, MultipartForm};
pub use request::Request;
pub use response::Response;

/// Re-exported so callers can build bodies without a direct dependency.
pub use serde_json::{json, Map, Value};
