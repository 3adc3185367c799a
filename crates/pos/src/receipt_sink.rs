//! Where receipts go: the local print service over HTTP, or a dispatcher
//! running in the same process.

use std::time::Duration;

use async_trait::async_trait;
use printer::{PrintDispatcher, ReceiptRequest};

use crate::{PosError, Result};

#[async_trait]
pub trait ReceiptSink: Send + Sync {
    /// Sends one receipt to be printed.
    async fn send(&self, receipt: &ReceiptRequest) -> Result<()>;
}

/// Client for the print service's `POST /print-receipt` endpoint.
pub struct HttpReceiptClient {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpReceiptClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: format!("{}/print-receipt", base_url.trim_end_matches('/')),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ReceiptSink for HttpReceiptClient {
    #[tracing::instrument(skip_all, fields(endpoint = %self.endpoint, items = receipt.items.len()))]
    async fn send(&self, receipt: &ReceiptRequest) -> Result<()> {
        let response = self.client.post(&self.endpoint).json(receipt).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), %message, "print service rejected receipt");
            return Err(PosError::PrintService {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ReceiptSink for PrintDispatcher {
    async fn send(&self, receipt: &ReceiptRequest) -> Result<()> {
        self.print_receipt(receipt).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_url() {
        let client = HttpReceiptClient::new("http://localhost:5174/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:5174/print-receipt");
    }
}
