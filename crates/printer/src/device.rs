//! Printer devices and their discovery.
//!
//! Supports:
//! - USB line printers exposed as character devices (`/dev/usb/lp*`)
//! - Network printers (raw TCP, port 9100)

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{info, instrument, warn};

use crate::{PrintError, Result};

pub const DEFAULT_USB_DIR: &str = "/dev/usb";
pub const DEFAULT_NETWORK_PORT: u16 = 9100;

/// A printer that accepts raw ESC/POS bytes.
///
/// Each `print` opens the device, writes the whole job and closes it again.
#[async_trait]
pub trait PrinterDevice: Send + Sync {
    /// Human-readable device name for logs.
    fn describe(&self) -> String;

    async fn print(&self, data: &[u8]) -> Result<()>;
}

/// Finds connected printers.
#[async_trait]
pub trait DeviceEnumerator: Send + Sync {
    async fn find(&self) -> Result<Vec<Arc<dyn PrinterDevice>>>;
}

/// USB line printer character device.
#[derive(Debug, Clone)]
pub struct UsbLinePrinter {
    path: PathBuf,
}

impl UsbLinePrinter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PrinterDevice for UsbLinePrinter {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    #[instrument(skip_all, fields(device = %self.path.display(), data_len = data.len()))]
    async fn print(&self, data: &[u8]) -> Result<()> {
        let device_error = |source: std::io::Error| PrintError::Device {
            device: self.describe(),
            source,
        };

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .open(&self.path)
            .await
            .map_err(device_error)?;
        file.write_all(data).await.map_err(device_error)?;
        file.flush().await.map_err(device_error)?;

        info!("Print job written");
        Ok(())
    }
}

/// Lists `lp*` devices in a directory, sorted by name.
#[derive(Debug, Clone)]
pub struct UsbEnumerator {
    dir: PathBuf,
}

impl Default for UsbEnumerator {
    fn default() -> Self {
        Self::new(DEFAULT_USB_DIR)
    }
}

impl UsbEnumerator {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl DeviceEnumerator for UsbEnumerator {
    async fn find(&self) -> Result<Vec<Arc<dyn PrinterDevice>>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            // No USB subsystem directory means no USB printers.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_name().to_string_lossy().starts_with("lp") {
                paths.push(entry.path());
            }
        }
        paths.sort();

        Ok(paths
            .into_iter()
            .map(|path| Arc::new(UsbLinePrinter::new(path)) as Arc<dyn PrinterDevice>)
            .collect())
    }
}

/// Network printer (TCP port 9100)
///
/// Most thermal printers support raw TCP printing on port 9100.
#[derive(Debug, Clone)]
pub struct NetworkPrinter {
    addr: String,
    timeout: Duration,
}

impl NetworkPrinter {
    /// Creates a printer from `host` or `host:port`; the port defaults to 9100.
    pub fn new(addr: &str) -> Result<Self> {
        let addr = addr.trim();
        if addr.is_empty() {
            return Err(PrintError::InvalidConfig("empty printer address".to_string()));
        }
        let addr = match addr.rsplit_once(':') {
            Some((host, port)) => {
                port.parse::<u16>().map_err(|_| {
                    PrintError::InvalidConfig(format!("Invalid address: {addr}"))
                })?;
                if host.is_empty() {
                    return Err(PrintError::InvalidConfig(format!("Invalid address: {addr}")));
                }
                addr.to_string()
            }
            None => format!("{addr}:{DEFAULT_NETWORK_PORT}"),
        };

        Ok(Self {
            addr,
            timeout: Duration::from_secs(5),
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    async fn connect(&self, timeout: Duration) -> Result<TcpStream> {
        tokio::time::timeout(timeout, TcpStream::connect(&self.addr))
            .await
            .map_err(|_| PrintError::Timeout(format!("Connection timeout: {}", self.addr)))?
            .map_err(|e| PrintError::Connection(format!("{}: {}", self.addr, e)))
    }

    /// Check if the printer accepts connections
    #[instrument(skip(self), fields(addr = %self.addr))]
    pub async fn is_online(&self) -> bool {
        match self.connect(Duration::from_millis(500)).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Printer offline");
                false
            }
        }
    }
}

#[async_trait]
impl PrinterDevice for NetworkPrinter {
    fn describe(&self) -> String {
        format!("tcp://{}", self.addr)
    }

    #[instrument(skip_all, fields(addr = %self.addr, data_len = data.len()))]
    async fn print(&self, data: &[u8]) -> Result<()> {
        let mut stream = self.connect(self.timeout).await?;

        let device_error = |source: std::io::Error| PrintError::Device {
            device: self.describe(),
            source,
        };
        stream.write_all(data).await.map_err(device_error)?;
        stream.flush().await.map_err(device_error)?;
        stream.shutdown().await.map_err(device_error)?;

        info!("Print job sent successfully");
        Ok(())
    }
}

/// Configured network printers, reported only while reachable.
#[derive(Debug, Clone, Default)]
pub struct NetworkEnumerator {
    printers: Vec<NetworkPrinter>,
}

impl NetworkEnumerator {
    pub fn new(printers: Vec<NetworkPrinter>) -> Self {
        Self { printers }
    }

    /// Parses a comma-separated `host[:port]` list.
    pub fn from_list(list: &str) -> Result<Self> {
        let printers = list
            .split(',')
            .map(str::trim)
            .filter(|addr| !addr.is_empty())
            .map(NetworkPrinter::new)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(printers))
    }
}

#[async_trait]
impl DeviceEnumerator for NetworkEnumerator {
    async fn find(&self) -> Result<Vec<Arc<dyn PrinterDevice>>> {
        let mut online: Vec<Arc<dyn PrinterDevice>> = Vec::new();
        for printer in &self.printers {
            if printer.is_online().await {
                online.push(Arc::new(printer.clone()));
            }
        }
        Ok(online)
    }
}

/// Every configured enumerator, queried in order.
///
/// A failing enumerator is logged and skipped so one broken backend does not
/// hide printers found by the others.
#[derive(Clone, Default)]
pub struct PrinterDiscovery {
    enumerators: Vec<Arc<dyn DeviceEnumerator>>,
}

impl PrinterDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, enumerator: impl DeviceEnumerator + 'static) -> Self {
        self.enumerators.push(Arc::new(enumerator));
        self
    }
}

#[async_trait]
impl DeviceEnumerator for PrinterDiscovery {
    async fn find(&self) -> Result<Vec<Arc<dyn PrinterDevice>>> {
        let mut devices = Vec::new();
        for enumerator in &self.enumerators {
            match enumerator.find().await {
                Ok(found) => devices.extend(found),
                Err(e) => warn!(error = %e, "printer enumeration failed"),
            }
        }
        Ok(devices)
    }
}
