//! End-to-end printing through discovery, the dispatcher and real device
//! backends: a USB line printer stand-in file and a raw TCP printer.

use std::sync::Arc;

use common::Money;
use printer::{
    NetworkEnumerator, PrintDispatcher, PrintError, PrinterDiscovery, ReceiptFormatter,
    ReceiptItem, ReceiptRequest, StoreIdentity, UsbEnumerator,
};
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;

fn receipt() -> ReceiptRequest {
    ReceiptRequest::new(vec![
        ReceiptItem::new("Kibble", Money::from_major(150)),
        ReceiptItem::new("Leash", Money::from_cents(8950)),
    ])
    .with_store(StoreIdentity {
        store_name: "Paws".to_string(),
        ..StoreIdentity::default()
    })
    .with_amounts(
        Money::from_cents(23950),
        Money::from_major(300),
        Money::from_cents(6050),
    )
}

#[tokio::test]
async fn usb_printer_receives_a_complete_job() {
    let dir = tempfile::tempdir().unwrap();
    let lp0 = dir.path().join("lp0");
    std::fs::write(&lp0, b"").unwrap();

    let discovery = PrinterDiscovery::new().with(UsbEnumerator::new(dir.path()));
    let dispatcher = PrintDispatcher::new(Arc::new(discovery), ReceiptFormatter::default());

    let device = dispatcher.print_receipt(&receipt()).await.unwrap();
    assert_eq!(device, lp0.display().to_string());

    let written = std::fs::read(&lp0).unwrap();
    assert_eq!(&written[..2], &[0x1B, 0x40]);
    assert_eq!(&written[written.len() - 3..], &[0x1D, 0x56, 0x00]);
    let text = String::from_utf8_lossy(&written);
    assert!(text.contains("Paws\n"));
    assert!(text.contains("Leash - PHP 89.50\n"));
    assert!(text.contains("Exchange: PHP 60.50\n"));
}

#[tokio::test]
async fn usb_printers_come_before_network_printers() {
    let dir = tempfile::tempdir().unwrap();
    let lp0 = dir.path().join("lp0");
    std::fs::write(&lp0, b"").unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let discovery = PrinterDiscovery::new()
        .with(UsbEnumerator::new(dir.path()))
        .with(NetworkEnumerator::from_list(&addr).unwrap());
    let dispatcher = PrintDispatcher::new(Arc::new(discovery), ReceiptFormatter::default());

    let device = dispatcher.dispatch("hello").await.unwrap();
    assert_eq!(device, lp0.display().to_string());
}

#[tokio::test]
async fn network_printer_receives_the_job() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let server = tokio::spawn(async move {
        // The first connection is the reachability probe.
        let (_probe, _) = listener.accept().await.unwrap();
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();
        socket.read_to_end(&mut received).await.unwrap();
        received
    });

    let missing = tempfile::tempdir().unwrap();
    let discovery = PrinterDiscovery::new()
        .with(UsbEnumerator::new(missing.path().join("usb")))
        .with(NetworkEnumerator::from_list(&addr).unwrap());
    let dispatcher = PrintDispatcher::new(Arc::new(discovery), ReceiptFormatter::new("USD"));

    dispatcher.print_receipt(&receipt()).await.unwrap();

    let received = server.await.unwrap();
    let text = String::from_utf8_lossy(&received);
    assert!(text.contains("Kibble - USD 150.00"));
    assert_eq!(&received[received.len() - 3..], &[0x1D, 0x56, 0x00]);
}

#[tokio::test]
async fn nothing_discovered_means_no_printers() {
    let missing = tempfile::tempdir().unwrap();
    let discovery = PrinterDiscovery::new().with(UsbEnumerator::new(missing.path().join("usb")));
    let dispatcher = PrintDispatcher::new(Arc::new(discovery), ReceiptFormatter::default());

    let result = dispatcher.print_receipt(&receipt()).await;
    assert!(matches!(result, Err(PrintError::NoPrinters)));
    assert_eq!(result.unwrap_err().to_string(), "No printers connected.");
}
