//! Error types for the session gatekeeper.

use reqwest::StatusCode;
use thiserror::Error;

/// Fallback shown when a rejection carries no message.
pub const GENERIC_ERROR_MESSAGE: &str = "an error occurred";
/// Shown for transport and malformed-response failures.
pub const CONNECTION_ERROR_MESSAGE: &str = "could not connect to the server; please try again";

/// Primary error type for gatekeeper operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The login endpoint answered with a non-success status.
    #[error("login rejected")]
    Rejected {
        /// Status returned by the server.
        status: StatusCode,
        /// Message taken from the response body.
        message: String,
    },
    /// A protected call was answered with 401; the token has been cleared.
    #[error("session expired")]
    SessionExpired,
    /// A protected surface was entered without a stored token.
    #[error("no active session")]
    Unauthenticated,
    /// The request never produced a response.
    #[error("request failed")]
    Transport {
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },
    /// The response body could not be interpreted.
    #[error("malformed response")]
    MalformedResponse {
        /// Decoder diagnostic.
        detail: String,
    },
    /// The request target could not be resolved against the base URL.
    #[error("invalid request URL")]
    InvalidUrl {
        /// Target supplied by the caller.
        value: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },
    /// A header value could not be encoded.
    #[error("invalid header value")]
    InvalidHeader {
        /// Header name.
        name: String,
    },
    /// The request body could not be serialised.
    #[error("failed to encode request body")]
    Encode {
        /// Serializer error.
        #[source]
        source: serde_json::Error,
    },
}

impl SessionError {
    /// Message suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            Self::SessionExpired => "session expired; please log in again".to_string(),
            Self::Unauthenticated => "not logged in; please log in first".to_string(),
            Self::Transport { .. } | Self::MalformedResponse { .. } => {
                CONNECTION_ERROR_MESSAGE.to_string()
            }
            Self::InvalidUrl { value, source } => format!("invalid URL '{value}': {source}"),
            Self::InvalidHeader { name } => format!("invalid value for header '{name}'"),
            Self::Encode { source } => format!("failed to encode request body: {source}"),
        }
    }

    /// Whether the error requires the user to authenticate again.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        matches!(self, Self::SessionExpired | Self::Unauthenticated)
    }

    pub(crate) fn transport(source: reqwest::Error) -> Self {
        Self::Transport { source }
    }

    pub(crate) fn malformed(detail: impl ToString) -> Self {
        Self::MalformedResponse {
            detail: detail.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_surfaces_server_message() {
        let err = SessionError::Rejected {
            status: StatusCode::BAD_REQUEST,
            message: "invalid credentials".into(),
        };
        assert_eq!(err.user_message(), "invalid credentials");
        assert!(!err.requires_login());
    }

    #[test]
    fn malformed_response_reads_as_connection_error() {
        let err = SessionError::malformed("expected value at line 1");
        assert_eq!(err.user_message(), CONNECTION_ERROR_MESSAGE);
    }

    #[test]
    fn expiry_and_missing_session_require_login() {
        assert!(SessionError::SessionExpired.requires_login());
        assert!(SessionError::Unauthenticated.requires_login());
    }
}
