//! Login exchange and authenticated fetch wrapper.
//!
//! # Design
//! - Every protected call reads the token at its own dispatch time; concurrent
//!   calls are not serialised and the last write to the store wins.
//! - At most one attempt per call: no retries, no timeout of its own (the
//!   injected client decides).
//! - A 401 always clears the token before navigation and before the error is
//!   returned, so no caller observes a stale token after a redirect.

use std::sync::Arc;

use reqwest::{Client, Response, StatusCode, Url};
use tracing::{debug, info, warn};
use wikiq_api_models::{ErrorBody, LOGIN_PATH, LoginRequest, LoginResponse};

use crate::error::{GENERIC_ERROR_MESSAGE, SessionError};
use crate::navigator::{Destination, Navigator};
use crate::request::{RequestOptions, merge_headers};
use crate::store::SessionStore;
use crate::token::{Credential, SessionState, SessionToken};

/// Mediates every authenticated call against one API origin.
#[derive(Clone)]
pub struct Gatekeeper {
    client: Client,
    base_url: Url,
    store: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl Gatekeeper {
    /// Assemble a gatekeeper from its collaborators.
    #[must_use]
    pub fn new(
        client: Client,
        base_url: Url,
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            client,
            base_url,
            store,
            navigator,
        }
    }

    /// Base URL every relative target is resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Current token lifecycle state.
    #[must_use]
    pub fn session_state(&self) -> SessionState {
        SessionState::from_token(self.store.get().as_ref())
    }

    /// Exchange `credential` for a session token and persist it.
    ///
    /// Empty usernames or passwords are sent as-is; validating them is the
    /// caller's concern. On success the user is sent to the landing surface.
    /// Any failure leaves a previously stored token untouched.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Rejected`] for non-success statuses, carrying the
    ///   body's `message` or [`GENERIC_ERROR_MESSAGE`].
    /// - [`SessionError::Transport`] when no response arrives.
    /// - [`SessionError::MalformedResponse`] when the body is not the expected
    ///   JSON document or the token is blank.
    pub async fn login(&self, credential: &Credential) -> Result<SessionToken, SessionError> {
        let url = self.resolve(LOGIN_PATH)?;
        let payload = LoginRequest {
            username: credential.username.clone(),
            password: credential.password.clone(),
        };

        debug!(username = %credential.username, "submitting login");
        let response = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(SessionError::transport)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(SessionError::transport)?;

        if !status.is_success() {
            let body: ErrorBody = serde_json::from_slice(&bytes).map_err(SessionError::malformed)?;
            let message = body
                .message
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string());
            info!(status = status.as_u16(), "login rejected");
            return Err(SessionError::Rejected { status, message });
        }

        let body: LoginResponse = serde_json::from_slice(&bytes).map_err(SessionError::malformed)?;
        let token = SessionToken::new(body.access_token);
        if token.is_blank() {
            return Err(SessionError::malformed("login response carried a blank access_token"));
        }

        self.store.set(token.clone());
        info!("session established");
        self.navigator.navigate(Destination::Landing);
        Ok(token)
    }

    /// Dispatch one protected request with the live token attached.
    ///
    /// `target` is either absolute or resolved against the base URL. Any
    /// response other than 401 is returned untouched, including other error
    /// statuses, which leave the token in place.
    ///
    /// # Errors
    ///
    /// - [`SessionError::SessionExpired`] on 401, after the token has been
    ///   cleared and the user sent to the login surface.
    /// - [`SessionError::Transport`] when no response arrives.
    /// - [`SessionError::InvalidUrl`] / [`SessionError::InvalidHeader`] when the
    ///   request cannot be built; nothing is sent.
    pub async fn authenticated_fetch(
        &self,
        target: &str,
        options: RequestOptions,
    ) -> Result<Response, SessionError> {
        let url = self.resolve(target)?;
        let token = self.store.get();
        let headers = merge_headers(options.headers, token.as_ref())?;

        debug!(
            method = %options.method,
            url = %url,
            authenticated = token.is_some(),
            "dispatching protected request"
        );
        let mut request = self.client.request(options.method, url).headers(headers);
        if let Some(body) = options.body {
            request = request.body(body);
        }

        let response = request.send().await.map_err(SessionError::transport)?;

        if response.status() == StatusCode::UNAUTHORIZED {
            self.store.clear();
            warn!(path = target, "protected request unauthorized; session cleared");
            self.navigator.navigate(Destination::Login);
            return Err(SessionError::SessionExpired);
        }

        Ok(response)
    }

    /// Guard for protected surfaces: return the stored token or send the user
    /// to the login surface.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Unauthenticated`] when no token is stored.
    pub fn require_session(&self) -> Result<SessionToken, SessionError> {
        if let Some(token) = self.store.get() {
            return Ok(token);
        }
        debug!("no stored session; redirecting to login");
        self.navigator.navigate(Destination::Login);
        Err(SessionError::Unauthenticated)
    }

    fn resolve(&self, target: &str) -> Result<Url, SessionError> {
        self.base_url
            .join(target)
            .map_err(|source| SessionError::InvalidUrl {
                value: target.to_string(),
                source,
            })
    }
}
