//! Fulfillment state machine over the document store.

use std::time::Instant;

use common::{CustomerId, Money};
use document_store::{DocumentStore, WriteBatch};
use domain::{FulfillmentStage, OrderAggregator, SaleTransaction, StageRecord, paths};
use futures_util::{StreamExt, stream};

use crate::error::Result;
use crate::locks::CustomerLocks;
use crate::outcome::{AdvanceOutcome, BulkReport, CustomerFailure, CustomerOverview, LedgerWrite};

/// Default number of customers advanced concurrently by a bulk transition.
pub const DEFAULT_BULK_CONCURRENCY: usize = 8;

/// Drives customers through the fulfillment stages.
///
/// A transition reads every document at the source stage, writes one
/// destination record keyed by the customer id, and deletes the source
/// documents in the same batch. Placed orders are the exception: they stay in
/// place when a customer ships, so re-running Placed → Shipped rebuilds the
/// same Shipped record.
pub struct FulfillmentPipeline<S: DocumentStore> {
    aggregator: OrderAggregator<S>,
    locks: CustomerLocks,
    bulk_concurrency: usize,
}

impl<S: DocumentStore> FulfillmentPipeline<S> {
    /// Creates a pipeline over the given store.
    pub fn new(store: S) -> Self {
        Self {
            aggregator: OrderAggregator::new(store),
            locks: CustomerLocks::new(),
            bulk_concurrency: DEFAULT_BULK_CONCURRENCY,
        }
    }

    /// Sets how many customers a bulk transition advances at once.
    pub fn with_bulk_concurrency(mut self, limit: usize) -> Self {
        self.bulk_concurrency = limit.max(1);
        self
    }

    pub fn aggregator(&self) -> &OrderAggregator<S> {
        &self.aggregator
    }

    pub fn store(&self) -> &S {
        self.aggregator.store()
    }

    /// Moves one customer from `from` to `to`.
    ///
    /// Illegal edges are rejected before anything is read. A source stage
    /// with no documents yields `NothingToAdvance` and writes nothing.
    #[tracing::instrument(skip_all, fields(customer_id = %customer_id, from = %from, to = %to))]
    pub async fn advance(
        &self,
        customer_id: &CustomerId,
        from: FulfillmentStage,
        to: FulfillmentStage,
    ) -> Result<AdvanceOutcome> {
        FulfillmentStage::ensure_edge(from, to)?;

        let _guard = self.locks.acquire(customer_id).await;

        let source = self.aggregator.collect_source(customer_id, from).await?;
        if source.is_empty() {
            tracing::info!("nothing to advance");
            return Ok(AdvanceOutcome::NothingToAdvance {
                customer_id: customer_id.clone(),
                from,
                to,
            });
        }

        let line_items = source.items.len();
        let record = StageRecord::new(to, source.items);
        let total_price = record.total_price;

        let mut batch =
            WriteBatch::new().set(paths::stage_record(customer_id, to), record.to_value()?);
        let removed = if from.keeps_source_records() {
            0
        } else {
            let removed = source.paths.len();
            for path in source.paths {
                batch = batch.delete(path);
            }
            removed
        };

        if let Err(e) = self.store().commit(batch).await {
            metrics::counter!(
                "fulfillment_advance_failures_total",
                "from" => from.as_str(),
                "to" => to.as_str()
            )
            .increment(1);
            tracing::error!(error = %e, "stage commit failed");
            return Err(e.into());
        }

        metrics::counter!(
            "fulfillment_advances_total",
            "from" => from.as_str(),
            "to" => to.as_str()
        )
        .increment(1);
        tracing::info!(%total_price, line_items, removed, "customer advanced");

        let ledger = if to.is_terminal() {
            Some(self.record_revenue(customer_id, total_price).await)
        } else {
            None
        };

        Ok(AdvanceOutcome::Advanced {
            customer_id: customer_id.clone(),
            from,
            to,
            total_price,
            line_items,
            removed,
            ledger,
        })
    }

    /// Writes the revenue ledger entry of a delivered customer.
    ///
    /// Failures are reported, never propagated: the stage write already landed.
    async fn record_revenue(&self, customer_id: &CustomerId, total: Money) -> LedgerWrite {
        let entry = match SaleTransaction::new(total).to_value() {
            Ok(entry) => entry,
            Err(e) => {
                return LedgerWrite::Failed {
                    reason: e.to_string(),
                };
            }
        };

        match self
            .store()
            .commit(WriteBatch::new().set(paths::ledger_entry(customer_id), entry))
            .await
        {
            Ok(()) => LedgerWrite::Written,
            Err(e) => {
                metrics::counter!("fulfillment_ledger_failures_total").increment(1);
                tracing::warn!(error = %e, "revenue ledger write failed");
                LedgerWrite::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Moves every customer from `from` to `to`.
    ///
    /// Customers are advanced concurrently up to the configured limit. A
    /// failing customer is logged and reported without stopping the others.
    #[tracing::instrument(skip(self))]
    pub async fn advance_all(
        &self,
        from: FulfillmentStage,
        to: FulfillmentStage,
    ) -> Result<BulkReport> {
        FulfillmentStage::ensure_edge(from, to)?;
        let started = Instant::now();

        let customers = self.aggregator.customer_ids().await?;
        tracing::info!(customers = customers.len(), "bulk advance started");

        let tasks: Vec<_> = customers
            .into_iter()
            .map(|customer_id| async move {
                let result = self.advance(&customer_id, from, to).await;
                (customer_id, result)
            })
            .collect();

        let results: Vec<_> = stream::iter(tasks)
            .buffer_unordered(self.bulk_concurrency)
            .collect()
            .await;

        let mut report = BulkReport::new(from, to);
        for (customer_id, result) in results {
            match result {
                Ok(outcome) if outcome.ledger_failed() => {
                    report.ledger_failures.push(customer_id.clone());
                    report.advanced.push(customer_id);
                }
                Ok(AdvanceOutcome::Advanced { .. }) => report.advanced.push(customer_id),
                Ok(AdvanceOutcome::NothingToAdvance { .. }) => {
                    report.nothing_to_advance.push(customer_id)
                }
                Err(e) => {
                    tracing::warn!(%customer_id, error = %e, "customer failed during bulk advance");
                    report.failed.push(CustomerFailure {
                        customer_id,
                        error: e.to_string(),
                    });
                }
            }
        }
        report.sort();

        let duration = started.elapsed().as_secs_f64();
        metrics::histogram!("fulfillment_bulk_duration_seconds").record(duration);
        tracing::info!(
            advanced = report.advanced.len(),
            skipped = report.nothing_to_advance.len(),
            failed = report.failed.len(),
            duration,
            "bulk advance finished"
        );

        Ok(report)
    }

    /// Deletes every order and stage record of a customer in one batch.
    ///
    /// Returns the number of documents deleted. The customer document, its
    /// profile and any ledger entry are kept.
    #[tracing::instrument(skip_all, fields(customer_id = %customer_id))]
    pub async fn purge_customer(&self, customer_id: &CustomerId) -> Result<usize> {
        let _guard = self.locks.acquire(customer_id).await;

        let mut batch = WriteBatch::new();
        for stage in [
            FulfillmentStage::Placed,
            FulfillmentStage::Shipped,
            FulfillmentStage::Delivering,
            FulfillmentStage::Delivered,
        ] {
            let docs = self
                .store()
                .list(&paths::stage_collection(customer_id, stage))
                .await?;
            for doc in docs {
                batch = batch.delete(doc.path);
            }
        }

        let deleted = batch.len();
        if deleted > 0 {
            self.store().commit(batch).await?;
        }

        tracing::info!(deleted, "customer orders purged");
        Ok(deleted)
    }

    /// Placed totals plus every stage summary of one customer.
    #[tracing::instrument(skip_all, fields(customer_id = %customer_id))]
    pub async fn customer_overview(&self, customer_id: &CustomerId) -> Result<CustomerOverview> {
        let profile = self.aggregator.profile(customer_id).await?;
        let placed = self.aggregator.placed_totals(customer_id).await?;

        Ok(CustomerOverview {
            customer_id: customer_id.clone(),
            profile,
            placed,
            order_shipped: self
                .aggregator
                .stage_summary(customer_id, FulfillmentStage::Shipped)
                .await?,
            order_delivering: self
                .aggregator
                .stage_summary(customer_id, FulfillmentStage::Delivering)
                .await?,
            order_delivered: self
                .aggregator
                .stage_summary(customer_id, FulfillmentStage::Delivered)
                .await?,
        })
    }
}
