//! Span helpers carrying per-invocation context.
//!
//! # Design
//! - One root span per CLI invocation with the command label, trace id, and
//!   build identifier; callers attach it with `Instrument` so it follows the
//!   future across runtime threads.

use tracing::Span;

use crate::init::build_sha;

/// Root span for a single command invocation.
#[must_use]
pub fn command_span(command: &str, trace_id: &str) -> Span {
    tracing::info_span!(
        "command",
        command = %command,
        trace_id = %trace_id,
        build_sha = %build_sha(),
        outcome = tracing::field::Empty,
        exit_code = tracing::field::Empty
    )
}

/// Record the outcome of the invocation on `span`.
pub fn record_outcome(span: &Span, outcome: &str, exit_code: i32) {
    span.record("outcome", tracing::field::display(outcome));
    span.record("exit_code", exit_code);
}
