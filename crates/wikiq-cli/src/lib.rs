#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::redundant_pub_crate)]

//! Command-line client for the wiki knowledge assistant.
//!
//! Layout:
//! - `cli.rs`: argument parsing and command dispatch
//! - `commands/`: command handlers grouped by concern
//! - `client.rs`: shared HTTP client, errors, navigation, and telemetry helpers
//! - `output.rs`: renderers and formatting helpers
//! - `render.rs`: answer text rewriting
//! - `main.rs`: thin entrypoint delegating to `run()`

pub(crate) mod cli;
pub(crate) mod client;
pub(crate) mod commands;
pub(crate) mod output;
pub(crate) mod render;

pub use cli::run;
