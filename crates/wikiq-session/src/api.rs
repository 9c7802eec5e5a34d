//! Typed client for the protected wiki endpoints.
//!
//! Every call is routed through [`Gatekeeper::authenticated_fetch`], so token
//! attachment and expiry handling never leak into callers.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use wikiq_api_models::{
    ASK_PATH, AskRequest, AskResponse, DOCUMENTS_PATH, DocumentListResponse, EXTRACT_PATH,
    ErrorBody, ExtractRequest, ExtractResponse, ME_PATH, SEARCH_PATH, STATUS_PATH, SearchRequest,
    SearchResponse, StatusResponse, UserProfile,
};

use crate::error::SessionError;
use crate::gatekeeper::Gatekeeper;
use crate::request::RequestOptions;

/// Fallback when a failed call's body names no message or error.
pub const UNKNOWN_ERROR_MESSAGE: &str = "unknown error";

/// Errors surfaced by [`WikiApi`] calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Gatekeeper failure: expiry, transport, or request construction.
    #[error(transparent)]
    Session(#[from] SessionError),
    /// The server answered with a non-success status other than 401.
    #[error("server returned an error")]
    Server {
        /// Response status.
        status: StatusCode,
        /// Body `message`, else `error`, else [`UNKNOWN_ERROR_MESSAGE`].
        message: String,
    },
    /// A success response did not match the expected document.
    #[error("failed to decode response")]
    Decode {
        /// Decoder diagnostic.
        detail: String,
    },
}

impl ApiError {
    /// Message suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Session(err) => err.user_message(),
            Self::Server { status, message } => format!("{message} (status {status})"),
            Self::Decode { detail } => format!("unexpected response from server: {detail}"),
        }
    }

    /// Whether the call failed because the session is gone.
    #[must_use]
    pub const fn requires_login(&self) -> bool {
        match self {
            Self::Session(err) => err.requires_login(),
            Self::Server { .. } | Self::Decode { .. } => false,
        }
    }
}

/// Protected wiki endpoints.
#[derive(Clone)]
pub struct WikiApi {
    gatekeeper: Gatekeeper,
}

impl WikiApi {
    /// Wrap a gatekeeper.
    #[must_use]
    pub const fn new(gatekeeper: Gatekeeper) -> Self {
        Self { gatekeeper }
    }

    /// Underlying gatekeeper.
    #[must_use]
    pub const fn gatekeeper(&self) -> &Gatekeeper {
        &self.gatekeeper
    }

    /// Crawl `wiki_url` and rebuild the knowledge base.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn extract(&self, wiki_url: &str) -> Result<ExtractResponse, ApiError> {
        let options = RequestOptions::post().json(&ExtractRequest {
            wiki_url: wiki_url.to_string(),
        })?;
        self.call(EXTRACT_PATH, options).await
    }

    /// Knowledge-base status.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn status(&self) -> Result<StatusResponse, ApiError> {
        self.call(STATUS_PATH, RequestOptions::get()).await
    }

    /// Ask a question against the knowledge base.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn ask(&self, question: &str) -> Result<AskResponse, ApiError> {
        let options = RequestOptions::post().json(&AskRequest {
            question: question.to_string(),
        })?;
        self.call(ASK_PATH, options).await
    }

    /// Raw chunk search.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn search(&self, query: &str, limit: Option<u32>) -> Result<SearchResponse, ApiError> {
        let options = RequestOptions::post().json(&SearchRequest {
            query: query.to_string(),
            limit,
        })?;
        self.call(SEARCH_PATH, options).await
    }

    /// Every indexed document.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn documents(&self) -> Result<DocumentListResponse, ApiError> {
        self.call(DOCUMENTS_PATH, RequestOptions::get()).await
    }

    /// Profile of the authenticated user.
    ///
    /// # Errors
    ///
    /// See [`ApiError`].
    pub async fn me(&self) -> Result<UserProfile, ApiError> {
        self.call(ME_PATH, RequestOptions::get()).await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let response = self.gatekeeper.authenticated_fetch(path, options).await?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(SessionError::transport)?;

        if status.is_success() {
            return serde_json::from_slice(&bytes).map_err(|err| ApiError::Decode {
                detail: err.to_string(),
            });
        }

        let message = serde_json::from_slice::<ErrorBody>(&bytes)
            .ok()
            .and_then(|body| body.detail().map(str::to_string))
            .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string());
        debug!(path, status = status.as_u16(), "protected call failed");
        Err(ApiError::Server { status, message })
    }
}
