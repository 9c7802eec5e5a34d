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

//! Logging and tracing primitives shared across the wikiq workspace.
//!
//! Layout: `init.rs` (subscriber installation, log format, build identifier),
//! `context.rs` (per-invocation span carrying the command and trace id).

pub mod context;
pub mod init;

pub use context::{command_span, record_outcome};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging};
