//! Receipt printing for the point of sale.
//!
//! This crate handles:
//! - Receipt requests: validation and defaults for the print-service payload
//! - Receipt text formatting
//! - ESC/POS command building
//! - Printer devices: USB line printers, raw TCP network printers (port 9100), in-memory
//! - The print dispatcher, holding the printer exclusively for one job at a time

pub mod device;
pub mod dispatcher;
pub mod error;
pub mod escpos;
pub mod format;
pub mod memory;
pub mod receipt;

pub use device::{
    DeviceEnumerator, NetworkEnumerator, NetworkPrinter, PrinterDevice, PrinterDiscovery,
    UsbEnumerator, UsbLinePrinter,
};
pub use dispatcher::PrintDispatcher;
pub use error::{PrintError, Result};
pub use escpos::EscPosBuilder;
pub use format::{DEFAULT_CURRENCY, ReceiptFormatter};
pub use memory::{MemoryEnumerator, MemoryPrinter};
pub use receipt::{ReceiptItem, ReceiptRequest, StoreIdentity};
