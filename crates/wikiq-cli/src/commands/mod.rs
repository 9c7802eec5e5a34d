//! Command handlers grouped by concern.

pub(crate) mod session;
pub(crate) mod wiki;
