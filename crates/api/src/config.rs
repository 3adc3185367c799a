//! Application configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use fulfillment::DEFAULT_BULK_CONCURRENCY;
use printer::DEFAULT_CURRENCY;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `5174`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT` — `text` or `json` (default: `text`)
/// - `DATABASE_URL` — PostgreSQL URL; unset keeps documents in memory
/// - `STORE_TIMEOUT_MS` — deadline for each store operation (default: `10000`)
/// - `BULK_CONCURRENCY` — customers advanced at once by bulk transitions (default: `8`)
/// - `PRINTER_USB_DIR` — directory scanned for `lp*` devices (default: `"/dev/usb"`)
/// - `PRINTER_ADDRS` — comma-separated `host[:port]` network printers
/// - `RECEIPT_CURRENCY` — currency label on receipts (default: `"PHP"`)
/// - `CORS_ORIGIN` — allowed browser origin (default: any)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub store_timeout: Duration,
    pub bulk_concurrency: usize,
    pub printer_usb_dir: PathBuf,
    pub printer_addrs: Option<String>,
    pub receipt_currency: String,
    pub cors_origin: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let non_empty = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: std::env::var("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or(defaults.log_format),
            database_url: non_empty("DATABASE_URL"),
            store_timeout: std::env::var("STORE_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.store_timeout),
            bulk_concurrency: std::env::var("BULK_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.bulk_concurrency),
            printer_usb_dir: std::env::var("PRINTER_USB_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.printer_usb_dir),
            printer_addrs: non_empty("PRINTER_ADDRS"),
            receipt_currency: std::env::var("RECEIPT_CURRENCY")
                .unwrap_or(defaults.receipt_currency),
            cors_origin: non_empty("CORS_ORIGIN"),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5174,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            store_timeout: Duration::from_secs(10),
            bulk_concurrency: DEFAULT_BULK_CONCURRENCY,
            printer_usb_dir: PathBuf::from("/dev/usb"),
            printer_addrs: None,
            receipt_currency: DEFAULT_CURRENCY.to_string(),
            cors_origin: None,
        }
    }
}
