//! Projection processor keeping views live.

use std::sync::Arc;

use document_store::{DocumentStore, Notification, WatchHandle, watch};

use crate::Result;
use crate::projection::Projection;

/// Subscribes projections to a document store and feeds them notifications.
///
/// The processor supports:
/// - Catch-up: re-renders every projection from current store state
/// - Single notification delivery, to the projections whose targets match
/// - Live mode: one watch per projection target, cancelled through the handles
pub struct ProjectionProcessor<S: DocumentStore> {
    store: S,
    projections: Vec<Arc<dyn Projection>>,
}

impl<S: DocumentStore> ProjectionProcessor<S> {
    /// Creates a new processor with the given document store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            projections: Vec::new(),
        }
    }

    /// Registers a projection with this processor.
    pub fn register(&mut self, projection: Arc<dyn Projection>) {
        self.projections.push(projection);
    }

    /// Returns the number of registered projections.
    pub fn projection_count(&self) -> usize {
        self.projections.len()
    }

    /// Re-renders every projection from the store.
    #[tracing::instrument(skip(self))]
    pub async fn run_catch_up(&self) -> Result<()> {
        for projection in &self.projections {
            projection.rebuild().await?;
            metrics::counter!("projections_rebuilds_total", "projection" => projection.name())
                .increment(1);
        }

        tracing::info!(projections = self.projections.len(), "catch-up complete");
        Ok(())
    }

    /// Delivers a single notification to every projection observing it.
    pub async fn process_notification(&self, notification: &Notification) -> Result<()> {
        for projection in &self.projections {
            if observes(projection.as_ref(), notification) {
                projection.handle(notification).await?;
            }
        }
        Ok(())
    }

    /// Resets all projections and re-renders them from the store.
    #[tracing::instrument(skip(self))]
    pub async fn rebuild_all(&self) -> Result<()> {
        for projection in &self.projections {
            projection.reset().await?;
        }
        self.run_catch_up().await
    }

    /// Subscribes every projection target, catches up, then keeps the views
    /// live until the returned handles are dropped.
    ///
    /// Subscriptions are opened before the catch-up so no change between the
    /// two is lost.
    #[tracing::instrument(skip(self))]
    pub async fn start(&self) -> Result<Vec<WatchHandle>> {
        let mut subscriptions = Vec::new();
        for projection in &self.projections {
            for target in projection.targets() {
                let subscription = self.store.subscribe(target).await?;
                subscriptions.push((Arc::clone(projection), subscription));
            }
        }

        self.run_catch_up().await?;

        let handles: Vec<WatchHandle> = subscriptions
            .into_iter()
            .map(|(projection, subscription)| {
                watch(subscription, move |notification| {
                    let projection = Arc::clone(&projection);
                    async move { deliver(projection.as_ref(), &notification).await }
                })
            })
            .collect();

        tracing::info!(watches = handles.len(), "projections live");
        Ok(handles)
    }
}

fn observes(projection: &dyn Projection, notification: &Notification) -> bool {
    match notification {
        Notification::Changed(event) => projection
            .targets()
            .iter()
            .any(|target| target.matches(&event.path)),
        Notification::Lagged { .. } => true,
    }
}

async fn deliver(projection: &dyn Projection, notification: &Notification) {
    match projection.handle(notification).await {
        Ok(()) => {
            metrics::counter!("projections_notifications_processed", "projection" => projection.name())
                .increment(1);
        }
        Err(e) => {
            metrics::counter!("projections_failures_total", "projection" => projection.name())
                .increment(1);
            tracing::warn!(projection = projection.name(), error = %e, "projection update failed");
        }
    }
}
