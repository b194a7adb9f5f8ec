//! Request payloads for the Intercom API.
//!
//! # Design
//! Optional fields are `Option`s (or empty collections) that are skipped
//! during serialization, so an omitted argument never shows up on the wire
//! as `null`. Empty strings count as omitted too.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

fn non_empty(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    (!value.is_empty()).then_some(value)
}

/// A new message thread started on behalf of a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewThread {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub current_url: Option<String>,
}

impl NewThread {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = non_empty(email);
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = non_empty(body);
        self
    }

    pub fn current_url(mut self, url: impl Into<String>) -> Self {
        self.current_url = non_empty(url);
        self
    }
}

/// A page view recorded for a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewImpression {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub user_ip: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub current_url: Option<String>,
}

impl NewImpression {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = non_empty(email);
        self
    }

    pub fn user_ip(mut self, ip: impl Into<String>) -> Self {
        self.user_ip = non_empty(ip);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = non_empty(agent);
        self
    }

    pub fn current_url(mut self, url: impl Into<String>) -> Self {
        self.current_url = non_empty(url);
        self
    }
}

/// A named event attributed to a user.
///
/// When `created` is `None` the builder stamps the current time in epoch
/// seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub user_id: String,
    pub event_name: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,
}

impl NewEvent {
    pub fn new(user_id: impl Into<String>, event_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            event_name: event_name.into(),
            ..Self::default()
        }
    }

    pub fn metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = non_empty(email);
        self
    }

    pub fn created(mut self, epoch_seconds: i64) -> Self {
        self.created = Some(epoch_seconds);
        self
    }
}

/// Whether a tag change attaches or detaches the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagAction {
    Tag,
    Untag,
}

/// Create or update a tag, optionally (un)tagging users with it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagChange {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emails: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub user_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub color: Option<String>,
    #[serde(
        default,
        rename = "tag_or_untag",
        skip_serializing_if = "Option::is_none"
    )]
    pub action: Option<TagAction>,
}

impl TagChange {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn emails<I, S>(mut self, emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.emails = emails.into_iter().map(Into::into).collect();
        self
    }

    pub fn user_ids<I, S>(mut self, user_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.user_ids = user_ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = non_empty(color);
        self
    }

    pub fn action(mut self, action: TagAction) -> Self {
        self.action = Some(action);
        self
    }
}
