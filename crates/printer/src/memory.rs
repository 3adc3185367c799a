//! In-memory printer for tests and dry runs.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::device::{DeviceEnumerator, PrinterDevice};
use crate::{PrintError, Result};

#[derive(Debug, Default)]
struct MemoryPrinterState {
    jobs: Vec<Vec<u8>>,
    fail_with: Option<std::io::ErrorKind>,
}

/// Records every job instead of printing it.
#[derive(Debug, Clone)]
pub struct MemoryPrinter {
    name: String,
    state: Arc<RwLock<MemoryPrinterState>>,
}

impl MemoryPrinter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(RwLock::new(MemoryPrinterState::default())),
        }
    }

    /// Returns every job received so far.
    pub async fn jobs(&self) -> Vec<Vec<u8>> {
        self.state.read().await.jobs.clone()
    }

    /// Makes every print fail with an IO error of `kind`, or succeed again on `None`.
    pub async fn set_fail_with(&self, kind: Option<std::io::ErrorKind>) {
        self.state.write().await.fail_with = kind;
    }
}

#[async_trait]
impl PrinterDevice for MemoryPrinter {
    fn describe(&self) -> String {
        format!("memory://{}", self.name)
    }

    async fn print(&self, data: &[u8]) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(kind) = state.fail_with {
            return Err(PrintError::Device {
                device: self.describe(),
                source: std::io::Error::from(kind),
            });
        }
        state.jobs.push(data.to_vec());
        Ok(())
    }
}

/// Reports a fixed, switchable set of in-memory printers.
#[derive(Debug, Clone, Default)]
pub struct MemoryEnumerator {
    printers: Arc<RwLock<Vec<MemoryPrinter>>>,
}

impl MemoryEnumerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn connect(&self, printer: MemoryPrinter) {
        self.printers.write().await.push(printer);
    }

    pub async fn disconnect_all(&self) {
        self.printers.write().await.clear();
    }
}

#[async_trait]
impl DeviceEnumerator for MemoryEnumerator {
    async fn find(&self) -> Result<Vec<Arc<dyn PrinterDevice>>> {
        Ok(self
            .printers
            .read()
            .await
            .iter()
            .map(|printer| Arc::new(printer.clone()) as Arc<dyn PrinterDevice>)
            .collect())
    }
}
