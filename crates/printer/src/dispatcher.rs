//! Print dispatcher: formats receipts and sends them to the first printer.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::device::DeviceEnumerator;
use crate::escpos::EscPosBuilder;
use crate::{PrintError, ReceiptFormatter, ReceiptRequest, Result};

/// Sends receipts to the first connected printer.
///
/// Devices are enumerated per request and the chosen device is opened,
/// written and closed while the dispatcher's lock is held, so two jobs never
/// interleave on the paper. There are no retries.
pub struct PrintDispatcher {
    devices: Arc<dyn DeviceEnumerator>,
    formatter: ReceiptFormatter,
    printer_lock: Mutex<()>,
}

impl PrintDispatcher {
    pub fn new(devices: Arc<dyn DeviceEnumerator>, formatter: ReceiptFormatter) -> Self {
        Self {
            devices,
            formatter,
            printer_lock: Mutex::new(()),
        }
    }

    pub fn formatter(&self) -> &ReceiptFormatter {
        &self.formatter
    }

    /// Formats and prints one receipt. Returns the device it was printed on.
    #[tracing::instrument(skip_all, fields(items = receipt.items.len()))]
    pub async fn print_receipt(&self, receipt: &ReceiptRequest) -> Result<String> {
        let text = self.formatter.format(receipt);
        self.dispatch(&text).await
    }

    /// Prints `text` as one ESC/POS job: init, text, feed, full cut.
    pub async fn dispatch(&self, text: &str) -> Result<String> {
        let devices = self.devices.find().await?;
        let Some(device) = devices.into_iter().next() else {
            tracing::error!("No printers found");
            metrics::counter!("print_failures_total", "reason" => "no_printers").increment(1);
            return Err(PrintError::NoPrinters);
        };

        let job = EscPosBuilder::receipt_job(text);
        let name = device.describe();

        let _printer = self.printer_lock.lock().await;
        match device.print(&job).await {
            Ok(()) => {
                metrics::counter!("print_jobs_total").increment(1);
                tracing::info!(device = %name, bytes = job.len(), "Receipt printed");
                Ok(name)
            }
            Err(e) => {
                metrics::counter!("print_failures_total", "reason" => "device").increment(1);
                tracing::error!(device = %name, error = %e, "Printing failed");
                if let Some(hint) = e.hint() {
                    tracing::error!(device = %name, "{hint}");
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryEnumerator, MemoryPrinter, ReceiptItem};
    use common::Money;

    async fn dispatcher_with(printers: &[&MemoryPrinter]) -> PrintDispatcher {
        let enumerator = MemoryEnumerator::new();
        for printer in printers {
            enumerator.connect((*printer).clone()).await;
        }
        PrintDispatcher::new(Arc::new(enumerator), ReceiptFormatter::default())
    }

    fn receipt() -> ReceiptRequest {
        ReceiptRequest::new(vec![ReceiptItem::new("Kibble", Money::from_major(150))])
            .with_amounts(Money::from_major(150), Money::zero(), Money::zero())
    }

    #[tokio::test]
    async fn no_printers_is_reported() {
        let dispatcher = dispatcher_with(&[]).await;
        let err = dispatcher.print_receipt(&receipt()).await.unwrap_err();
        assert!(matches!(err, PrintError::NoPrinters));
        assert_eq!(err.to_string(), "No printers connected.");
    }

    #[tokio::test]
    async fn prints_on_first_device_only() {
        let first = MemoryPrinter::new("first");
        let second = MemoryPrinter::new("second");
        let dispatcher = dispatcher_with(&[&first, &second]).await;

        let device = dispatcher.print_receipt(&receipt()).await.unwrap();

        assert_eq!(device, "memory://first");
        let jobs = first.jobs().await;
        assert_eq!(jobs.len(), 1);
        assert!(jobs[0].starts_with(&[0x1B, 0x40]));
        assert!(jobs[0].ends_with(&[0x1D, 0x56, 0x00]));
        let text = String::from_utf8_lossy(&jobs[0]);
        assert!(text.contains("Kibble - PHP 150.00"));
        assert!(second.jobs().await.is_empty());
    }

    #[tokio::test]
    async fn device_failure_is_returned() {
        let printer = MemoryPrinter::new("front");
        printer
            .set_fail_with(Some(std::io::ErrorKind::BrokenPipe))
            .await;
        let dispatcher = dispatcher_with(&[&printer]).await;

        let err = dispatcher.dispatch("hello").await.unwrap_err();
        assert!(matches!(err, PrintError::Device { .. }));
    }

    #[tokio::test]
    async fn concurrent_jobs_do_not_interleave() {
        let printer = MemoryPrinter::new("front");
        let dispatcher = Arc::new(dispatcher_with(&[&printer]).await);

        let a = tokio::spawn({
            let dispatcher = Arc::clone(&dispatcher);
            async move { dispatcher.dispatch("first receipt").await }
        });
        let b = tokio::spawn({
            let dispatcher = Arc::clone(&dispatcher);
            async move { dispatcher.dispatch("second receipt").await }
        });
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let jobs = printer.jobs().await;
        assert_eq!(jobs.len(), 2);
        for job in jobs {
            assert_eq!(job.iter().filter(|b| **b == 0x40).count(), 1);
        }
    }
}
