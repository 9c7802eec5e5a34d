//! Navigation capability invoked by the gatekeeper.
//!
//! The gatekeeper never decides how a user reaches the login surface; it only
//! says where they must go. Embedders map [`Destination`] to a page change, a
//! terminal hint, or a test assertion.

use std::sync::{Mutex, PoisonError};

/// Surfaces the gatekeeper can send the user to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Destination {
    /// Where credentials are collected.
    Login,
    /// Application root, reached after a successful login.
    Landing,
}

/// Receives navigation requests from the gatekeeper.
pub trait Navigator: Send + Sync {
    /// Move the user to `destination`.
    fn navigate(&self, destination: Destination);
}

impl<F> Navigator for F
where
    F: Fn(Destination) + Send + Sync,
{
    fn navigate(&self, destination: Destination) {
        self(destination);
    }
}

/// Navigator that remembers every request in order.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visited: Mutex<Vec<Destination>>,
}

impl RecordingNavigator {
    /// Destinations requested so far.
    #[must_use]
    pub fn destinations(&self) -> Vec<Destination> {
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Most recent destination.
    #[must_use]
    pub fn last(&self) -> Option<Destination> {
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .copied()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, destination: Destination) {
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(destination);
    }
}
