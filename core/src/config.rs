//! Client credentials and configuration.

use std::env;
use std::fmt;
use std::time::Duration;

/// Versioned API root. Events live one segment above it.
pub const DEFAULT_BASE_URL: &str = "https://api.intercom.io/v1/";
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Application id and API key used for basic auth on every request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    app_id: String,
    api_key: String,
}

impl Credentials {
    pub fn new(app_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            api_key: api_key.into(),
        }
    }

    /// Read `INTERCOM_APP_ID` and `INTERCOM_API_KEY`. Returns `None` if either
    /// is unset.
    pub fn from_env() -> Option<Self> {
        let app_id = env::var("INTERCOM_APP_ID").ok()?;
        let api_key = env::var("INTERCOM_API_KEY").ok()?;
        Some(Self::new(app_id, api_key))
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Endpoint and transport settings, fixed once the client is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Trace every request and response through `tracing` at debug level.
    pub debug: bool,
    pub connect_timeout: Duration,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            debug: false,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `INTERCOM_BASE_URL` and `INTERCOM_DEBUG`
    /// (`1`, `true`, `yes` or `on`).
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = env::var("INTERCOM_BASE_URL") {
            config = config.base_url(url);
        }
        if let Ok(flag) = env::var("INTERCOM_DEBUG") {
            config.debug = parse_flag(&flag);
        }
        config
    }

    /// Set the versioned API root. A trailing slash is added when missing so
    /// relative endpoint paths resolve beneath it.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        let mut url = url.into();
        if !url.ends_with('/') {
            url.push('/');
        }
        self.base_url = url;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
