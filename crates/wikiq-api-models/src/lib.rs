#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
//! Shared HTTP DTOs for the wiki knowledge assistant API.
//!
//! The session crate and the CLI both encode requests and decode responses
//! through these types so the wire contract lives in one place. Response types
//! tolerate extra fields; the server attaches diagnostics the client ignores.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Path of the login endpoint.
pub const LOGIN_PATH: &str = "/api/user/login";
/// Path of the current-user endpoint.
pub const ME_PATH: &str = "/api/user/me";
/// Path of the wiki extraction endpoint.
pub const EXTRACT_PATH: &str = "/api/wiki/extract";
/// Path of the knowledge-base status endpoint.
pub const STATUS_PATH: &str = "/api/wiki/status";
/// Path of the question answering endpoint.
pub const ASK_PATH: &str = "/api/wiki/ask";
/// Path of the raw chunk search endpoint.
pub const SEARCH_PATH: &str = "/api/wiki/search";
/// Path of the document listing endpoint.
pub const DOCUMENTS_PATH: &str = "/api/wiki/documents";

/// Credential pair submitted to the login endpoint.
#[derive(Clone, Serialize, PartialEq, Eq)]
pub struct LoginRequest {
    /// Account name.
    pub username: String,
    /// Account password, sent once and never persisted.
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful login payload.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    /// Opaque bearer token for subsequent protected calls.
    pub access_token: String,
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("LoginResponse")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Error document returned by the server on non-success statuses.
///
/// Login failures carry `message`; wiki endpoints mostly carry `error`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Human-readable message.
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Human-readable error description.
    pub error: Option<String>,
}

impl ErrorBody {
    /// First non-blank of `message` then `error`.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        [self.message.as_deref(), self.error.as_deref()]
            .into_iter()
            .flatten()
            .find(|value| !value.trim().is_empty())
    }
}

/// Request body for `POST /api/wiki/extract`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractRequest {
    /// Base URL of the MediaWiki instance to crawl.
    pub wiki_url: String,
}

/// Summary returned once extraction and indexing finish.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtractResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Server-side completion message.
    pub message: Option<String>,
    /// Pages stored as documents.
    pub documents_processed: u64,
    /// Text chunks written to the index.
    pub total_chunks_created: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Pages discovered on the wiki, including skipped ones.
    pub total_pages_found: Option<u64>,
}

/// Knowledge-base status snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusResponse {
    /// `ready` when at least one document is indexed, `empty` otherwise.
    pub status: String,
    /// Number of indexed documents.
    pub documents: u64,
    /// Number of indexed chunks.
    pub chunks: u64,
}

impl StatusResponse {
    /// Whether the knowledge base reports itself as ready.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.status == "ready"
    }
}

/// Request body for `POST /api/wiki/ask`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AskRequest {
    /// Natural-language question.
    pub question: String,
}

/// A document cited as the source of an answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceRef {
    /// Wiki page title.
    pub title: String,
    /// Page URL, `#` when the server could not resolve it.
    pub url: String,
}

/// Answer produced by the knowledge assistant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AskResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Echo of the question.
    pub question: Option<String>,
    /// Markdown answer text, possibly containing `<WIKI_IMAGE>` tags.
    pub answer: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Number of chunks consulted to build the answer.
    pub context_chunks_used: u32,
    #[serde(default)]
    /// Cited documents, most relevant first.
    pub sources: Vec<SourceRef>,
}

/// Request body for `POST /api/wiki/search`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchRequest {
    /// Free-text query.
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Maximum number of hits the caller wants.
    pub limit: Option<u32>,
}

/// Metadata attached to an indexed chunk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChunkMetadata {
    #[serde(default)]
    /// Title of the owning document.
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Identifier of the owning document.
    pub document_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Position of the chunk within its document.
    pub chunk_index: Option<u32>,
}

/// One chunk returned by a search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    /// Chunk text.
    pub content: String,
    #[serde(default)]
    /// Chunk provenance.
    pub metadata: ChunkMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Similarity to the query when the search was semantic.
    pub similarity_score: Option<f64>,
}

/// Search results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResponse {
    /// Echo of the query.
    pub query: String,
    #[serde(default)]
    /// Matching chunks, best first.
    pub results: Vec<SearchHit>,
}

/// Indexed wiki document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Database identifier.
    pub id: Option<i64>,
    /// Page title.
    pub title: String,
    /// Page URL.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Indexing timestamp as reported by the server.
    pub created_at: Option<String>,
}

/// Listing of every indexed document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentListResponse {
    #[serde(default)]
    /// Indexed documents.
    pub documents: Vec<DocumentSummary>,
}

/// Profile of the authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    /// User identifier.
    pub id: i64,
    /// Account name.
    pub username: String,
    /// Role label.
    pub role: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_body_prefers_message_over_error() {
        let body: ErrorBody =
            serde_json::from_value(json!({"message": "invalid credentials", "error": "x"}))
                .expect("error body");
        assert_eq!(body.detail(), Some("invalid credentials"));

        let body: ErrorBody = serde_json::from_value(json!({"message": "  ", "error": "boom"}))
            .expect("error body");
        assert_eq!(body.detail(), Some("boom"));

        assert_eq!(ErrorBody::default().detail(), None);
    }

    #[test]
    fn login_response_ignores_extra_fields_and_redacts_debug() {
        let body: LoginResponse = serde_json::from_value(json!({
            "access_token": "T1",
            "status": "success",
            "user": {"id": 1}
        }))
        .expect("login response");
        assert_eq!(body.access_token, "T1");
        assert!(!format!("{body:?}").contains("T1"));
    }

    #[test]
    fn login_request_debug_hides_password() {
        let request = LoginRequest {
            username: "a".into(),
            password: "hunter2".into(),
        };
        let rendered = format!("{request:?}");
        assert!(rendered.contains("\"a\""));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn ask_response_defaults_missing_sources() {
        let body: AskResponse = serde_json::from_value(json!({
            "answer": "y",
            "confidence": 0.8,
            "context_chunks_used": 3
        }))
        .expect("ask response");
        assert!(body.sources.is_empty());
        assert!(body.question.is_none());
    }

    #[test]
    fn status_ready_flag() {
        let ready = StatusResponse {
            status: "ready".into(),
            documents: 2,
            chunks: 9,
        };
        assert!(ready.is_ready());
        let empty = StatusResponse {
            status: "empty".into(),
            ..ready
        };
        assert!(!empty.is_ready());
    }

    #[test]
    fn search_request_omits_absent_limit() {
        let value = serde_json::to_value(SearchRequest {
            query: "vpn".into(),
            limit: None,
        })
        .expect("serialize");
        assert_eq!(value, json!({"query": "vpn"}));
    }
}
