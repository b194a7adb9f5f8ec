//! Blocking client for the Intercom customer-messaging REST API.
//!
//! # Overview
//! `IntercomClient` exposes users, message threads, impressions, events and
//! tags as typed method calls. Each call builds an `HttpRequest`, sends it
//! with basic auth over a pluggable `Transport` (ureq by default) and decodes
//! the JSON reply.
//!
//! # Design
//! - Builders (`build_*`) are pure and return plain-data requests.
//! - Only whitelisted properties are sent when creating or updating users.
//! - Remote failures never surface as `Err`. Every call returns an
//!   `ApiResponse` carrying the decoded body and a `LastError`; the most
//!   recent one is also readable through `IntercomClient::last_error`.
//! - `Err(ApiError)` means the request could not be built at all.

pub mod client;
pub mod config;
pub mod error;
pub mod fields;
pub mod http;
pub mod identifier;
pub mod transport;
pub mod types;

pub use client::IntercomClient;
pub use config::{ClientConfig, Credentials};
pub use error::{ApiError, TransportError, TransportErrorKind};
pub use fields::{filter_fields, filter_fields_by_name, Resource};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use identifier::UserKey;
pub use transport::{ApiResponse, LastError, Transport, UreqTransport};
pub use types::{NewEvent, NewImpression, NewThread, TagAction, TagChange};
