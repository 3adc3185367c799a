//! Error types for receipt printing.

use std::io::ErrorKind;

use thiserror::Error;

/// Printer error types
#[derive(Debug, Error)]
pub enum PrintError {
    /// The receipt payload has no usable item list.
    #[error("Invalid items provided")]
    InvalidItems(String),

    /// Device enumeration found nothing to print on.
    #[error("No printers connected.")]
    NoPrinters,

    /// Network connection error
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Opening or writing a device failed.
    #[error("Device {device} failed: {source}")]
    Device {
        device: String,
        #[source]
        source: std::io::Error,
    },

    /// IO error while enumerating devices
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Timeout waiting for printer
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Invalid printer configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl PrintError {
    /// Operator hint for failures with a known cause.
    pub fn hint(&self) -> Option<&'static str> {
        let kind = match self {
            PrintError::Device { source, .. } => source.kind(),
            PrintError::Io(e) => e.kind(),
            _ => return None,
        };
        match kind {
            ErrorKind::PermissionDenied => Some(
                "The service user cannot write to the printer device. Add it to the `lp` group or adjust the device permissions.",
            ),
            ErrorKind::NotFound => Some(
                "The printer disappeared between discovery and printing. Check the USB cable and power.",
            ),
            ErrorKind::ResourceBusy => {
                Some("Another process holds the printer device. Stop other print spoolers.")
            }
            _ => None,
        }
    }
}

/// Result type for printer operations
pub type Result<T> = std::result::Result<T, PrintError>;
