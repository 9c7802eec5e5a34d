//! Protected request descriptors and header merging.

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;

use crate::error::SessionError;
use crate::token::SessionToken;

/// Caller-supplied overrides for a protected request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// HTTP method; `GET` when not overridden.
    pub method: Method,
    /// Extra headers; these win over the JSON content-type default.
    pub headers: HeaderMap,
    /// Raw request body.
    pub body: Option<String>,
}

impl RequestOptions {
    /// Plain `GET` without body.
    #[must_use]
    pub fn get() -> Self {
        Self::default()
    }

    /// `POST` without body.
    #[must_use]
    pub fn post() -> Self {
        Self {
            method: Method::POST,
            ..Self::default()
        }
    }

    /// Serialise `payload` as the JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Encode`] when `payload` cannot be serialised.
    pub fn json<T: Serialize + ?Sized>(mut self, payload: &T) -> Result<Self, SessionError> {
        let body =
            serde_json::to_string(payload).map_err(|source| SessionError::Encode { source })?;
        self.body = Some(body);
        Ok(self)
    }

    /// Add or replace a header.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Build the header set for a protected request.
///
/// The result starts from `content-type: application/json`, applies the
/// caller's headers on top, then sets `authorization` from the live token.
/// Without a token, no `authorization` header survives, whatever the caller
/// supplied.
///
/// # Errors
///
/// Returns [`SessionError::InvalidHeader`] when the token contains characters
/// that are not valid in a header value.
pub fn merge_headers(
    overrides: HeaderMap,
    token: Option<&SessionToken>,
) -> Result<HeaderMap, SessionError> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.extend(overrides);

    match token {
        Some(token) => {
            let mut value =
                HeaderValue::from_str(&token.bearer()).map_err(|_| SessionError::InvalidHeader {
                    name: AUTHORIZATION.as_str().to_string(),
                })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        None => {
            headers.remove(AUTHORIZATION);
        }
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::ACCEPT;
    use serde_json::json;

    #[test]
    fn defaults_to_json_without_authorization() -> Result<(), SessionError> {
        let headers = merge_headers(HeaderMap::new(), None)?;
        assert_eq!(headers.get(CONTENT_TYPE).map(HeaderValue::as_bytes), Some(&b"application/json"[..]));
        assert!(headers.get(AUTHORIZATION).is_none());
        assert_eq!(headers.len(), 1);
        Ok(())
    }

    #[test]
    fn caller_headers_override_defaults() -> Result<(), SessionError> {
        let mut overrides = HeaderMap::new();
        overrides.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        overrides.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let headers = merge_headers(overrides, Some(&SessionToken::new("T1")))?;
        assert_eq!(headers.get(CONTENT_TYPE).map(HeaderValue::as_bytes), Some(&b"text/plain"[..]));
        assert_eq!(headers.get(ACCEPT).map(HeaderValue::as_bytes), Some(&b"application/json"[..]));
        Ok(())
    }

    #[test]
    fn live_token_replaces_caller_authorization() -> Result<(), SessionError> {
        let mut overrides = HeaderMap::new();
        overrides.insert(AUTHORIZATION, HeaderValue::from_static("Bearer forged"));
        let headers = merge_headers(overrides, Some(&SessionToken::new("T1")))?;
        let values: Vec<_> = headers.get_all(AUTHORIZATION).iter().collect();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].as_bytes(), b"Bearer T1");
        assert!(values[0].is_sensitive());
        Ok(())
    }

    #[test]
    fn caller_authorization_dropped_without_token() -> Result<(), SessionError> {
        let mut overrides = HeaderMap::new();
        overrides.insert(AUTHORIZATION, HeaderValue::from_static("Bearer forged"));
        let headers = merge_headers(overrides, None)?;
        assert!(headers.get(AUTHORIZATION).is_none());
        Ok(())
    }

    #[test]
    fn token_with_control_characters_is_rejected() {
        let err = merge_headers(HeaderMap::new(), Some(&SessionToken::new("bad\ntoken")))
            .expect_err("newline must not reach the wire");
        assert!(matches!(err, SessionError::InvalidHeader { .. }));
    }

    #[test]
    fn builders_set_method_and_body() -> Result<(), SessionError> {
        let options = RequestOptions::post().json(&json!({"question": "x"}))?;
        assert_eq!(options.method, Method::POST);
        assert_eq!(options.body.as_deref(), Some(r#"{"question":"x"}"#));
        assert_eq!(RequestOptions::get().method, Method::GET);
        Ok(())
    }
}
