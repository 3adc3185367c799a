//! Change subscriptions.
//!
//! A [`Subscription`] is a stream of [`Notification`]s for one
//! [`WatchTarget`]. [`watch`] drives a subscription on a background task and
//! returns a [`WatchHandle`] that cancels it.

use std::future::Future;
use std::pin::Pin;

use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::{CollectionPath, DocumentPath};

/// What a subscription observes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchTarget {
    /// Every document directly inside one collection.
    Collection(CollectionPath),
    /// A single document.
    Document(DocumentPath),
    /// Every collection with this id, at any depth (e.g. all `orderShipped`).
    CollectionGroup(String),
}

impl WatchTarget {
    /// Checks whether a change to `path` is visible to this target.
    pub fn matches(&self, path: &DocumentPath) -> bool {
        match self {
            WatchTarget::Collection(collection) => path.parent() == collection,
            WatchTarget::Document(document) => path == document,
            WatchTarget::CollectionGroup(id) => path.parent().id() == id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// A single document change.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub path: DocumentPath,
    /// New field map, when the backend delivers it. Always None for removals.
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Changed(ChangeEvent),
    /// The subscriber fell behind and `skipped` changes were dropped.
    Lagged { skipped: u64 },
}

/// A stream of notifications.
pub type NotificationStream = Pin<Box<dyn Stream<Item = Notification> + Send>>;

/// An open change subscription. Ends when the store side closes.
pub struct Subscription {
    target: WatchTarget,
    stream: NotificationStream,
}

impl Subscription {
    pub fn new(target: WatchTarget, stream: NotificationStream) -> Self {
        Self { target, stream }
    }

    pub fn target(&self) -> &WatchTarget {
        &self.target
    }

    /// Waits for the next notification.
    pub async fn next(&mut self) -> Option<Notification> {
        self.stream.next().await
    }

    pub fn into_stream(self) -> NotificationStream {
        self.stream
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// Cancels a running watch when unsubscribed or dropped.
#[derive(Debug)]
pub struct WatchHandle {
    task: JoinHandle<()>,
}

impl WatchHandle {
    /// Stops delivering notifications.
    pub fn unsubscribe(self) {
        self.task.abort();
    }

    /// Returns true once the subscription has ended or been cancelled.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Delivers every notification of `subscription` to `handler`, one at a
/// time, in arrival order.
pub fn watch<F, Fut>(mut subscription: Subscription, mut handler: F) -> WatchHandle
where
    F: FnMut(Notification) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let task = tokio::spawn(async move {
        while let Some(notification) = subscription.next().await {
            handler(notification).await;
        }
        tracing::debug!(watch_target = ?subscription.target(), "Subscription closed");
    });

    WatchHandle { task }
}
