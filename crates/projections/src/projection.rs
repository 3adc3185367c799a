//! Core projection trait and position tracking.

use async_trait::async_trait;
use document_store::{Notification, WatchTarget};

use crate::Result;

/// Tracks how much work a projection has done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionPosition {
    /// Number of change notifications handled.
    pub notifications_processed: u64,
    /// Number of full re-renders from the store.
    pub rebuilds: u64,
}

impl ProjectionPosition {
    /// Creates a new position at zero.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Advances the position by one notification.
    pub fn advance(&self) -> Self {
        Self {
            notifications_processed: self.notifications_processed + 1,
            ..*self
        }
    }

    /// Records one full re-render.
    pub fn rebuilt(&self) -> Self {
        Self {
            rebuilds: self.rebuilds + 1,
            ..*self
        }
    }
}

impl std::fmt::Display for ProjectionPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "position({}, rebuilds={})",
            self.notifications_processed, self.rebuilds
        )
    }
}

/// A view kept live by document store change notifications.
///
/// `handle` must be idempotent: it re-reads current store state for whatever
/// the notification touched instead of applying the change as a delta.
#[async_trait]
pub trait Projection: Send + Sync {
    /// Returns the name of this projection.
    fn name(&self) -> &'static str;

    /// The parts of the store this projection observes.
    fn targets(&self) -> Vec<WatchTarget>;

    /// Re-renders the whole view from the store.
    async fn rebuild(&self) -> Result<()>;

    /// Handles a single notification.
    async fn handle(&self, notification: &Notification) -> Result<()>;

    /// Returns the current position of this projection.
    async fn position(&self) -> ProjectionPosition;

    /// Resets the projection to its initial state.
    async fn reset(&self) -> Result<()>;
}
