//! Transport invocation: headers, basic auth, one blocking round trip, JSON
//! decoding and last-error bookkeeping.
//!
//! # Design
//! A [`Transport`] only moves bytes. The [`Invoker`] owns everything the API
//! expects on every call (content type, credentials, body rules per method)
//! and turns whatever happened into an [`ApiResponse`]. Remote failures never
//! become `Err`: the outcome is reported in [`LastError`], both in the
//! returned response and in a per-instance slot readable afterwards.

use std::fmt;
use std::io::Read as _;
use std::sync::{Mutex, PoisonError};

use base64::Engine;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::{ClientConfig, Credentials};
use crate::error::{TransportError, TransportErrorKind};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes a fully prepared request.
///
/// Implementations must return `Ok` for every HTTP response, including 4xx
/// and 5xx; `Err` is reserved for requests that got no response at all.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Blocking [`Transport`] backed by a [`ureq::Agent`].
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(config: &ClientConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_connect(Some(config.connect_timeout))
            .timeout_global(Some(config.timeout))
            // Status codes are reported, not raised.
            .http_status_as_error(false)
            .allow_non_standard_methods(true)
            .build()
            .new_agent();
        Self { agent }
    }

    pub fn from_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = ureq::http::Method::from_bytes(request.method.as_str().as_bytes())
            .map_err(|e| TransportError::new(TransportErrorKind::InvalidRequest, e.to_string()))?;

        let mut builder = ureq::http::Request::builder()
            .method(method)
            .uri(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let result = match &request.body {
            Some(body) => {
                let req = builder
                    .body(body.clone().into_bytes())
                    .map_err(|e| TransportError::new(TransportErrorKind::InvalidRequest, e.to_string()))?;
                self.agent.run(req)
            }
            None => {
                let req = builder
                    .body(())
                    .map_err(|e| TransportError::new(TransportErrorKind::InvalidRequest, e.to_string()))?;
                self.agent.run(req)
            }
        };

        result.map_err(map_ureq_error).and_then(convert_response)
    }
}

fn map_ureq_error(err: ureq::Error) -> TransportError {
    let kind = match &err {
        ureq::Error::Timeout(_) => TransportErrorKind::Timeout,
        ureq::Error::HostNotFound | ureq::Error::ConnectionFailed => TransportErrorKind::Connection,
        ureq::Error::Io(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => {
            TransportErrorKind::Connection
        }
        ureq::Error::Io(_) => TransportErrorKind::Io,
        ureq::Error::BadUri(_) | ureq::Error::Http(_) => TransportErrorKind::InvalidRequest,
        _ => TransportErrorKind::Other,
    };
    TransportError::new(kind, err.to_string())
}

fn convert_response(
    response: ureq::http::Response<ureq::Body>,
) -> Result<HttpResponse, TransportError> {
    let (parts, body) = response.into_parts();

    let headers = parts
        .headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    let mut bytes = Vec::new();
    body.into_reader()
        .read_to_end(&mut bytes)
        .map_err(|e| TransportError::new(TransportErrorKind::Io, e.to_string()))?;

    Ok(HttpResponse {
        status: parts.status.as_u16(),
        headers,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    })
}

/// Outcome of the most recent transport call.
///
/// `code` is `0` with an empty `message` whenever an HTTP response was
/// received, whatever its status; `http_code` is `0` when none was.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LastError {
    pub code: i32,
    pub message: String,
    pub http_code: u16,
}

impl LastError {
    pub fn from_status(status: u16) -> Self {
        Self {
            code: 0,
            message: String::new(),
            http_code: status,
        }
    }

    pub fn from_transport(err: &TransportError) -> Self {
        Self {
            code: err.kind.code(),
            message: err.message.clone(),
            http_code: 0,
        }
    }

    /// The transport delivered a response.
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

impl fmt::Display for LastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ok() {
            write!(f, "HTTP {}", self.http_code)
        } else {
            write!(f, "transport error {}: {}", self.code, self.message)
        }
    }
}

/// Decoded body plus the transport outcome of a single call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// `None` when the body was empty or not JSON.
    pub body: Option<Value>,
    pub error: LastError,
}

impl ApiResponse {
    /// A response arrived and its status is 2xx.
    pub fn is_success(&self) -> bool {
        self.error.is_ok() && (200..300).contains(&self.error.http_code)
    }

    pub fn into_result(self) -> Result<Option<Value>, LastError> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(self.error)
        }
    }
}

/// `Authorization` header value for HTTP basic auth.
pub fn basic_auth(username: &str, password: &str) -> String {
    let credentials = format!("{username}:{password}");
    let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
    format!("Basic {encoded}")
}

/// Applies per-call conventions around a [`Transport`] and tracks the last
/// outcome.
#[derive(Debug)]
pub struct Invoker<T> {
    transport: T,
    authorization: String,
    debug: bool,
    last_error: Mutex<LastError>,
}

impl<T: Transport> Invoker<T> {
    pub fn new(transport: T, credentials: &Credentials, debug: bool) -> Self {
        Self {
            transport,
            authorization: basic_auth(credentials.app_id(), credentials.api_key()),
            debug,
            last_error: Mutex::new(LastError::default()),
        }
    }

    /// Add the headers every call carries and apply the body rules for the
    /// request's method.
    pub fn prepare(&self, mut request: HttpRequest) -> HttpRequest {
        if !request.method.sends_body() {
            request.body = None;
        }

        request
            .headers
            .push(("Content-Type".to_string(), "application/json".to_string()));
        if request.method == HttpMethod::Put {
            let length = request.body.as_ref().map_or(0, String::len);
            request
                .headers
                .push(("Content-Length".to_string(), length.to_string()));
        }
        request
            .headers
            .push(("Authorization".to_string(), self.authorization.clone()));
        request
    }

    /// Send `request` and decode the reply. Never fails: transport errors and
    /// HTTP error statuses are reported in the returned [`LastError`].
    pub fn invoke(&self, request: HttpRequest) -> ApiResponse {
        let request = self.prepare(request);
        if self.debug {
            debug!(
                method = %request.method,
                url = %request.url,
                headers = ?redacted_headers(&request.headers),
                body = request.body.as_deref().unwrap_or(""),
                "sending request"
            );
        }

        let response = match self.transport.execute(&request) {
            Ok(response) => {
                if self.debug {
                    debug!(
                        status = response.status,
                        headers = ?response.headers,
                        body = %response.body,
                        "received response"
                    );
                }
                ApiResponse {
                    body: decode_body(&response.body),
                    error: LastError::from_status(response.status),
                }
            }
            Err(err) => {
                if self.debug {
                    debug!(error = %err, url = %request.url, "transport failure");
                }
                ApiResponse {
                    body: None,
                    error: LastError::from_transport(&err),
                }
            }
        };

        *self.lock_last_error() = response.error.clone();
        response
    }

    pub fn last_error(&self) -> LastError {
        self.lock_last_error().clone()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn lock_last_error(&self) -> std::sync::MutexGuard<'_, LastError> {
        self.last_error.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn decode_body(body: &str) -> Option<Value> {
    if body.trim().is_empty() {
        return None;
    }
    match serde_json::from_str(body) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(error = %e, "response body is not JSON");
            None
        }
    }
}

fn redacted_headers(headers: &[(String, String)]) -> Vec<(&str, &str)> {
    headers
        .iter()
        .map(|(name, value)| {
            if name.eq_ignore_ascii_case("authorization") {
                (name.as_str(), "<redacted>")
            } else {
                (name.as_str(), value.as_str())
            }
        })
        .collect()
}
