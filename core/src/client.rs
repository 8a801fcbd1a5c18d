//! Blocking HTTP execution of `Request` values.
//!
//! # Design
//! `HttpClient` holds only a `ClientConfig`. Every `send` builds its own
//! ureq agent from the config merged with the request's options, performs
//! the round-trip, and drops the agent on return, so no connection outlives
//! the call and separate calls share nothing.
//!
//! Body rules on the wire:
//! - `GET` never carries a body.
//! - `Body::Raw` is sent verbatim.
//! - `Body::Fields` is JSON when `Content-Type` says so, otherwise
//!   URL-encoded (adding the form content type if none was set).
//! - `Body::Multipart` is encoded with a fresh boundary, which replaces any
//!   bare `multipart/form-data` content type.
//!
//! Status codes are data: 4xx/5xx come back as `Response` unless the
//! accepted-status set excludes them.

use std::thread::JoinHandle;

use tracing::{debug, info, trace, warn};
use ureq::tls::TlsConfig;
use ureq::Agent;

use crate::config::ClientConfig;
use crate::encoding::{self, encode_form, encode_multipart, multipart_boundary, to_json_text};
use crate::error::{HttpError, Result};
use crate::http::{Body, HttpMethod};
use crate::request::Request;
use crate::response::Response;

const REDIRECT_LIMIT: u32 = 10;

/// Synchronous HTTP client.
///
/// Cheap to clone and safe to use from several threads at once.
#[derive(Debug, Clone, Default)]
pub struct HttpClient {
    config: ClientConfig,
}

impl HttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Execute `request` and wait for the response.
    ///
    /// Transport failures are retried as many times as the merged config
    /// allows and then surface as `HttpError::Transport`.
    pub fn send(&self, request: &Request) -> Result<Response> {
        let config = self.config.merged(request.options());

        if request.options().simulate {
            info!(method = %request.method(), url = request.url(), "simulated HTTP request");
            return Ok(Response::new(200, ""));
        }

        let prepared = prepare(request, &config)?;
        let agent = build_agent(&config)?;

        debug!(method = %request.method(), url = request.url(), "HTTP request");

        let mut attempt = 0;
        let response = loop {
            match perform(&agent, request, &prepared, config.max_response_size) {
                Ok(response) => break response,
                Err(err) if err.is_retryable() && attempt < config.retries => {
                    let delay = config.retry_backoff(attempt);
                    warn!(
                        "Request failed (attempt {}/{}), retrying in {:?}: {}",
                        attempt + 1,
                        config.retries + 1,
                        delay,
                        err
                    );
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        };

        debug!(status = response.status(), bytes = response.body().len(), "HTTP response");

        if !config.accepts(response.status()) {
            return Err(HttpError::UnexpectedStatus {
                status: response.status(),
                body: response.body().to_string(),
            });
        }
        Ok(response)
    }

    /// Execute `request`, on a background thread when it was built with
    /// `RequestBuilder::asynchronous`, inline otherwise.
    pub fn dispatch(&self, request: Request) -> PendingResponse {
        if !request.options().asynchronous {
            return PendingResponse {
                state: Pending::Ready(self.send(&request)),
            };
        }
        let client = self.clone();
        let handle = std::thread::spawn(move || client.send(&request));
        PendingResponse {
            state: Pending::Running(handle),
        }
    }
}

/// Outcome of `HttpClient::dispatch`.
#[derive(Debug)]
pub struct PendingResponse {
    state: Pending,
}

#[derive(Debug)]
enum Pending {
    Ready(Result<Response>),
    Running(JoinHandle<Result<Response>>),
}

impl PendingResponse {
    pub fn is_finished(&self) -> bool {
        match &self.state {
            Pending::Ready(_) => true,
            Pending::Running(handle) => handle.is_finished(),
        }
    }

    /// Block until the response is available.
    pub fn wait(self) -> Result<Response> {
        match self.state {
            Pending::Ready(result) => result,
            Pending::Running(handle) => handle.join().map_err(|_| HttpError::Dispatch)?,
        }
    }
}

/// Headers and payload exactly as they go on the wire.
#[derive(Debug)]
struct Prepared {
    headers: Vec<(String, String)>,
    payload: Option<Vec<u8>>,
}

fn prepare(request: &Request, config: &ClientConfig) -> Result<Prepared> {
    let mut headers = request.headers().to_vec();

    if find_ignore_case(&headers, "User-Agent").is_none() {
        headers.push(("User-Agent".to_string(), config.user_agent.clone()));
    }

    if *request.method() == HttpMethod::Get {
        return Ok(Prepared {
            headers,
            payload: None,
        });
    }

    let payload = match request.body() {
        Body::Raw(text) => {
            trace!("sending raw body");
            Some(text.clone().into_bytes())
        }
        Body::Fields(fields) if fields.is_empty() => None,
        Body::Fields(fields) => match content_type(&headers) {
            Some(ct) if is_json(ct) => {
                trace!("sending field body as JSON");
                Some(to_json_text(fields)?.into_bytes())
            }
            Some(_) => {
                trace!("sending field body as form data");
                Some(encode_form(fields).into_bytes())
            }
            None => {
                trace!("sending field body as form data");
                headers.push(("Content-Type".to_string(), encoding::FORM.to_string()));
                Some(encode_form(fields).into_bytes())
            }
        },
        Body::Multipart(form) => {
            let boundary = multipart_boundary();
            trace!(files = form.files.len(), "sending multipart body");
            let payload = encode_multipart(form, &boundary)?;
            replace_content_type(
                &mut headers,
                format!("{}; boundary={boundary}", encoding::MULTIPART),
            );
            Some(payload)
        }
    };

    Ok(Prepared { headers, payload })
}

fn build_agent(config: &ClientConfig) -> Result<Agent> {
    let proxy = match &config.proxy {
        Some(address) => Some(
            ureq::Proxy::new(address).map_err(|e| HttpError::InvalidProxy(format!("{address}: {e}")))?,
        ),
        None => None,
    };

    let agent = Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(config.timeout)
        .max_redirects(if config.follow_redirects { REDIRECT_LIMIT } else { 0 })
        .max_redirects_will_error(config.follow_redirects)
        .proxy(proxy)
        .allow_non_standard_methods(true)
        .tls_config(
            TlsConfig::builder()
                .disable_verification(!config.verify_tls)
                .build(),
        )
        .build()
        .new_agent();
    Ok(agent)
}

fn perform(
    agent: &Agent,
    request: &Request,
    prepared: &Prepared,
    max_response_size: u64,
) -> Result<Response> {
    let url = request.url();
    let payload = prepared.payload.as_deref();

    let result = match request.method() {
        HttpMethod::Get => with_headers(agent.get(url), &prepared.headers).call(),
        HttpMethod::Head => with_headers(agent.head(url), &prepared.headers).call(),
        HttpMethod::Delete | HttpMethod::Options => {
            let builder = match request.method() {
                HttpMethod::Delete => agent.delete(url),
                _ => agent.options(url),
            };
            let builder = with_headers(builder, &prepared.headers);
            match payload {
                Some(bytes) => builder.force_send_body().send(bytes),
                None => builder.call(),
            }
        }
        HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch => {
            let builder = match request.method() {
                HttpMethod::Post => agent.post(url),
                HttpMethod::Put => agent.put(url),
                _ => agent.patch(url),
            };
            let builder = with_headers(builder, &prepared.headers);
            match payload {
                Some(bytes) => builder.send(bytes),
                None => builder.send_empty(),
            }
        }
        HttpMethod::Trace | HttpMethod::Connect | HttpMethod::Other(_) => {
            let mut builder = ureq::http::Request::builder()
                .method(request.method().as_str())
                .uri(url);
            for (name, value) in &prepared.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            let http_request = builder
                .body(payload.map(<[u8]>::to_vec).unwrap_or_default())
                .map_err(|e| HttpError::Transport(e.to_string()))?;
            agent.run(http_request)
        }
    };

    let mut response = result?;
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    let bytes = response
        .body_mut()
        .with_config()
        .limit(max_response_size)
        .read_to_vec()?;
    let body = String::from_utf8_lossy(&bytes).into_owned();

    Ok(Response::new(status, body).with_headers(headers))
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn find_ignore_case<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

fn content_type(headers: &[(String, String)]) -> Option<&str> {
    find_ignore_case(headers, "Content-Type")
}

fn replace_content_type(headers: &mut Vec<(String, String)>, value: String) {
    match headers
        .iter_mut()
        .find(|(k, _)| k.eq_ignore_ascii_case("Content-Type"))
    {
        Some(entry) => entry.1 = value,
        None => headers.push(("Content-Type".to_string(), value)),
    }
}

fn is_json(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|mime| mime.trim().eq_ignore_ascii_case(encoding::JSON))
        .unwrap_or(false)
}
