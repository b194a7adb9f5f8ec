//! Request builders and the client facade for the Intercom API.
//!
//! # Design
//! Every operation is split in two: a `build_*` method that turns typed
//! arguments into an `HttpRequest` without any I/O, and a facade method that
//! hands the request to the [`Invoker`]. Builders are public so callers can
//! inspect or execute requests themselves.

use chrono::Utc;
use serde_json::{Map, Value};
use url::Url;

use crate::config::{ClientConfig, Credentials};
use crate::error::ApiError;
use crate::fields::{filter_fields, Resource};
use crate::http::{HttpMethod, HttpRequest};
use crate::identifier::UserKey;
use crate::transport::{ApiResponse, Invoker, LastError, Transport, UreqTransport};
use crate::types::{NewEvent, NewImpression, NewThread, TagChange};

const USERS_PATH: &str = "users/";
const USERS_WRITE_PATH: &str = "users";
const THREADS_PATH: &str = "users/message_threads";
const IMPRESSIONS_PATH: &str = "users/impressions";
const TAGS_PATH: &str = "tags/";
const TAGS_WRITE_PATH: &str = "tags";
/// Events are not versioned; resolved one segment above the base URL.
const EVENTS_PATH: &str = "../events/";

/// Blocking client for the Intercom API.
///
/// Each public operation performs exactly one HTTP round trip. `Err` is
/// returned only for local failures; remote outcomes are reported in the
/// returned [`ApiResponse`] and mirrored by [`last_error`](Self::last_error).
#[derive(Debug)]
pub struct IntercomClient<T = UreqTransport> {
    base_url: Url,
    config: ClientConfig,
    invoker: Invoker<T>,
}

impl IntercomClient<UreqTransport> {
    /// Client for the production API with default timeouts.
    pub fn new(
        app_id: impl Into<String>,
        api_key: impl Into<String>,
        debug: bool,
    ) -> Result<Self, ApiError> {
        Self::with_config(
            Credentials::new(app_id, api_key),
            ClientConfig::default().debug(debug),
        )
    }

    pub fn with_config(credentials: Credentials, config: ClientConfig) -> Result<Self, ApiError> {
        let transport = UreqTransport::new(&config);
        Self::with_transport(credentials, config, transport)
    }
}

impl<T: Transport> IntercomClient<T> {
    pub fn with_transport(
        credentials: Credentials,
        config: ClientConfig,
        transport: T,
    ) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| ApiError::InvalidUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl {
                url: config.base_url.clone(),
                reason: "not a hierarchical URL".to_string(),
            });
        }
        let invoker = Invoker::new(transport, &credentials, config.debug);
        Ok(Self {
            base_url,
            config,
            invoker,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        self.invoker.transport()
    }

    /// Outcome of the most recent call made through this client.
    pub fn last_error(&self) -> LastError {
        self.invoker.last_error()
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    pub fn get_all_users(&self, page: u32, per_page: u32) -> Result<ApiResponse, ApiError> {
        let req = self.build_get_all_users(page, per_page)?;
        Ok(self.invoker.invoke(req))
    }

    pub fn get_user(&self, id: &str) -> Result<ApiResponse, ApiError> {
        let req = self.build_get_user(id)?;
        Ok(self.invoker.invoke(req))
    }

    pub fn create_user(
        &self,
        id: &str,
        properties: &Map<String, Value>,
    ) -> Result<ApiResponse, ApiError> {
        let req = self.build_create_user(id, properties)?;
        Ok(self.invoker.invoke(req))
    }

    pub fn update_user(
        &self,
        id: &str,
        properties: &Map<String, Value>,
    ) -> Result<ApiResponse, ApiError> {
        let req = self.build_update_user(id, properties)?;
        Ok(self.invoker.invoke(req))
    }

    pub fn delete_user(&self, id: &str) -> Result<ApiResponse, ApiError> {
        let req = self.build_delete_user(id)?;
        Ok(self.invoker.invoke(req))
    }

    pub fn get_thread(&self, id: &str) -> Result<ApiResponse, ApiError> {
        let req = self.build_get_thread(id)?;
        Ok(self.invoker.invoke(req))
    }

    pub fn create_thread(&self, thread: &NewThread) -> Result<ApiResponse, ApiError> {
        let req = self.build_create_thread(thread)?;
        Ok(self.invoker.invoke(req))
    }

    pub fn create_impression(&self, impression: &NewImpression) -> Result<ApiResponse, ApiError> {
        let req = self.build_create_impression(impression)?;
        Ok(self.invoker.invoke(req))
    }

    pub fn create_event(&self, event: &NewEvent) -> Result<ApiResponse, ApiError> {
        let req = self.build_create_event(event)?;
        Ok(self.invoker.invoke(req))
    }

    pub fn get_tag(&self, name: &str) -> Result<ApiResponse, ApiError> {
        let req = self.build_get_tag(name)?;
        Ok(self.invoker.invoke(req))
    }

    pub fn create_tag(&self, change: &TagChange) -> Result<ApiResponse, ApiError> {
        let req = self.build_create_tag(change)?;
        Ok(self.invoker.invoke(req))
    }

    pub fn update_tag(&self, change: &TagChange) -> Result<ApiResponse, ApiError> {
        let req = self.build_update_tag(change)?;
        Ok(self.invoker.invoke(req))
    }

    // -----------------------------------------------------------------------
    // Request builders
    // -----------------------------------------------------------------------

    pub fn build_get_all_users(&self, page: u32, per_page: u32) -> Result<HttpRequest, ApiError> {
        let mut url = self.endpoint(USERS_PATH)?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("per_page", &per_page.to_string());
        Ok(HttpRequest::new(HttpMethod::Get, url))
    }

    pub fn build_get_user(&self, id: &str) -> Result<HttpRequest, ApiError> {
        let url = self.user_endpoint(USERS_PATH, id)?;
        Ok(HttpRequest::new(HttpMethod::Get, url))
    }

    pub fn build_create_user(
        &self,
        id: &str,
        properties: &Map<String, Value>,
    ) -> Result<HttpRequest, ApiError> {
        self.build_user_write(HttpMethod::Post, id, properties)
    }

    pub fn build_update_user(
        &self,
        id: &str,
        properties: &Map<String, Value>,
    ) -> Result<HttpRequest, ApiError> {
        self.build_user_write(HttpMethod::Put, id, properties)
    }

    pub fn build_delete_user(&self, id: &str) -> Result<HttpRequest, ApiError> {
        let url = self.user_endpoint(USERS_PATH, id)?;
        Ok(HttpRequest::new(HttpMethod::Delete, url))
    }

    pub fn build_get_thread(&self, id: &str) -> Result<HttpRequest, ApiError> {
        let url = self.user_endpoint(THREADS_PATH, id)?;
        Ok(HttpRequest::new(HttpMethod::Get, url))
    }

    pub fn build_create_thread(&self, thread: &NewThread) -> Result<HttpRequest, ApiError> {
        let url = self.endpoint(THREADS_PATH)?;
        let body = serde_json::to_string(thread)?;
        Ok(HttpRequest::new(HttpMethod::Post, url).with_body(body))
    }

    pub fn build_create_impression(
        &self,
        impression: &NewImpression,
    ) -> Result<HttpRequest, ApiError> {
        let url = self.endpoint(IMPRESSIONS_PATH)?;
        let body = serde_json::to_string(impression)?;
        Ok(HttpRequest::new(HttpMethod::Post, url).with_body(body))
    }

    /// Stamps `created` with the current epoch seconds when unset.
    pub fn build_create_event(&self, event: &NewEvent) -> Result<HttpRequest, ApiError> {
        let url = self.endpoint(EVENTS_PATH)?;
        let mut event = event.clone();
        event.created.get_or_insert_with(|| Utc::now().timestamp());
        let body = serde_json::to_string(&event)?;
        Ok(HttpRequest::new(HttpMethod::Post, url).with_body(body))
    }

    pub fn build_get_tag(&self, name: &str) -> Result<HttpRequest, ApiError> {
        let mut url = self.endpoint(TAGS_PATH)?;
        url.query_pairs_mut().append_pair("name", name);
        Ok(HttpRequest::new(HttpMethod::Get, url))
    }

    pub fn build_create_tag(&self, change: &TagChange) -> Result<HttpRequest, ApiError> {
        self.build_tag_write(HttpMethod::Post, change)
    }

    pub fn build_update_tag(&self, change: &TagChange) -> Result<HttpRequest, ApiError> {
        self.build_tag_write(HttpMethod::Put, change)
    }

    fn build_tag_write(&self, method: HttpMethod, change: &TagChange) -> Result<HttpRequest, ApiError> {
        let url = self.endpoint(TAGS_WRITE_PATH)?;
        let body = serde_json::to_string(change)?;
        Ok(HttpRequest::new(method, url).with_body(body))
    }

    /// Whitelisted `properties` plus the identifier, stored under `email` or
    /// `user_id` depending on its shape. The identifier wins over a
    /// conflicting property.
    fn build_user_write(
        &self,
        method: HttpMethod,
        id: &str,
        properties: &Map<String, Value>,
    ) -> Result<HttpRequest, ApiError> {
        let url = self.endpoint(USERS_WRITE_PATH)?;
        let mut body = filter_fields(Resource::User, properties);
        if !id.is_empty() {
            let key = UserKey::classify(id);
            body.insert(key.param().to_string(), Value::String(key.value().to_string()));
        }
        let body = serde_json::to_string(&body)?;
        Ok(HttpRequest::new(method, url).with_body(body))
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url.join(path).map_err(|e| ApiError::InvalidUrl {
            url: format!("{}{path}", self.base_url),
            reason: e.to_string(),
        })
    }

    fn user_endpoint(&self, path: &str, id: &str) -> Result<Url, ApiError> {
        let key = UserKey::classify(id);
        let mut url = self.endpoint(path)?;
        url.query_pairs_mut().append_pair(key.param(), key.value());
        Ok(url)
    }
}
