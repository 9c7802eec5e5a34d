//! Credential, bearer token, and session state primitives.
//!
//! # Design
//! - Keep secrets out of `Debug` output so they never reach logs.
//! - Treat blank tokens as absent; the state is derived, never stored.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Username/password pair submitted once during login.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    /// Account name.
    pub username: String,
    /// Account password.
    pub password: String,
}

impl Credential {
    /// Build a credential pair.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Opaque bearer token issued by the login endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a raw token value exactly as received.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw token value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the token carries no usable characters.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Value for the `authorization` header.
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("SessionToken(<redacted>)")
    }
}

/// Token lifecycle state for a single storage scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// No token stored.
    Unauthenticated,
    /// A token is stored.
    Authenticated,
}

impl SessionState {
    /// Derive the state from the stored token, if any.
    #[must_use]
    pub fn from_token(token: Option<&SessionToken>) -> Self {
        match token {
            Some(token) if !token.is_blank() => Self::Authenticated,
            _ => Self::Unauthenticated,
        }
    }

    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticated => "authenticated",
        }
    }
}
