//! User identifier routing.
//!
//! Endpoints keyed by a single user identifier accept either an email
//! address or the application's own user id. Which query parameter is used
//! depends only on whether the string looks like an email address.

use std::sync::LazyLock;

use regex::Regex;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .expect("Invalid email regex")
});

/// Whether `value` is syntactically an email address.
pub fn is_email(value: &str) -> bool {
    EMAIL_REGEX.is_match(value)
}

/// A user identifier classified by shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserKey<'a> {
    Email(&'a str),
    UserId(&'a str),
}

impl<'a> UserKey<'a> {
    pub fn classify(id: &'a str) -> Self {
        if is_email(id) {
            UserKey::Email(id)
        } else {
            UserKey::UserId(id)
        }
    }

    /// Query parameter name used to address the user.
    pub fn param(&self) -> &'static str {
        match self {
            UserKey::Email(_) => "email",
            UserKey::UserId(_) => "user_id",
        }
    }

    pub fn value(&self) -> &'a str {
        match self {
            UserKey::Email(v) | UserKey::UserId(v) => *v,
        }
    }
}
