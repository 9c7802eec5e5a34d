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
#![allow(clippy::module_name_repetitions)]

//! Session gatekeeper for the wiki knowledge assistant API.
//!
//! Layout:
//! - `token.rs`: credential, bearer token, and session state types
//! - `store.rs`: the `SessionStore` seam plus in-memory and file-backed stores
//! - `navigator.rs`: the `Navigator` capability invoked on login and expiry
//! - `request.rs`: protected request descriptors and header merging
//! - `gatekeeper.rs`: login exchange and the authenticated fetch wrapper
//! - `api.rs`: typed client for the protected wiki endpoints
//! - `error.rs`: error taxonomy and user-facing messages

pub mod api;
pub mod error;
pub mod gatekeeper;
pub mod navigator;
pub mod request;
pub mod store;
pub mod token;

pub use api::{ApiError, WikiApi};
pub use error::{CONNECTION_ERROR_MESSAGE, GENERIC_ERROR_MESSAGE, SessionError};
pub use gatekeeper::Gatekeeper;
pub use navigator::{Destination, Navigator, RecordingNavigator};
pub use request::{RequestOptions, merge_headers};
pub use store::{ACCESS_TOKEN_KEY, FileSessionStore, MemorySessionStore, SessionStore, origin_key};
pub use token::{Credential, SessionState, SessionToken};
