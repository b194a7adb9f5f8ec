//! Per-resource field whitelists.
//!
//! Only properties listed for a resource are ever transmitted in a create or
//! update payload. Unknown keys are dropped silently.

use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::ApiError;

const USER_FIELDS: &[&str] = &[
    "user_id",
    "email",
    "name",
    "created_at",
    "custom_data",
    "last_seen_ip",
    "last_seen_user_agent",
    "last_request_at",
    "unsubscribed_from_emails",
    "companies",
];

/// A remote resource type that accepts whitelisted properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    User,
}

impl Resource {
    pub fn name(self) -> &'static str {
        match self {
            Resource::User => "user",
        }
    }

    /// Permitted property names.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            Resource::User => USER_FIELDS,
        }
    }

    pub fn allows(self, field: &str) -> bool {
        self.fields().contains(&field)
    }
}

impl FromStr for Resource {
    type Err = ApiError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "user" => Ok(Resource::User),
            other => Err(ApiError::UnknownResource(other.to_string())),
        }
    }
}

/// Copy the whitelisted subset of `properties` for `resource`.
///
/// A field is copied only when present and not `null`; missing fields stay
/// absent in the result. Values are passed through untouched.
pub fn filter_fields(resource: Resource, properties: &Map<String, Value>) -> Map<String, Value> {
    resource
        .fields()
        .iter()
        .filter_map(|&field| match properties.get(field) {
            Some(Value::Null) | None => None,
            Some(value) => Some((field.to_string(), value.clone())),
        })
        .collect()
}

/// String-keyed variant of [`filter_fields`] for callers that carry the
/// resource type as a name.
pub fn filter_fields_by_name(
    resource: &str,
    properties: &Map<String, Value>,
) -> Result<Map<String, Value>, ApiError> {
    let resource: Resource = resource.parse()?;
    Ok(filter_fields(resource, properties))
}
