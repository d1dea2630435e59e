//! Printer pool adapters
//!
//! The engine only needs a submit capability: one ticket to one printer
//! address, bounded by a timeout, answered with Sent/Failed/TimedOut.
//! A timed-out submission is a failure, never an assumed success.

use super::types::{SubmitOutcome, Ticket};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{info, warn};

/// Set of named printers addressed by "host:port"
#[async_trait]
pub trait PrinterPool: Send + Sync {
    /// Submit one ticket to one printer, bounded by `timeout`
    async fn submit(
        &self,
        printer_address: &str,
        ticket: &Ticket,
        timeout: Duration,
    ) -> SubmitOutcome;
}

/// Network printer pool (raw TCP, port 9100 convention)
///
/// Most thermal printers accept raw text on TCP 9100. Connections are
/// per-submission; a stuck printer only ever costs its own timeout and
/// holds no lock that other printers wait on.
#[derive(Debug, Default)]
pub struct TcpPrinterPool;

impl TcpPrinterPool {
    pub fn new() -> Self {
        Self
    }

    /// Minimal text layout for the ticket payload
    fn render(ticket: &Ticket) -> Vec<u8> {
        let mut out = String::new();
        out.push_str(&format!("== {} ==\n", ticket.group_name));
        out.push_str(&format!("Order {}\n", ticket.order_id));
        out.push_str("------------------------\n");
        for line in &ticket.lines {
            out.push_str(&format!("{} x{}\n", line.item_name, line.quantity));
            if let Some(note) = &line.note {
                out.push_str(&format!("  * {}\n", note));
            }
        }
        out.push_str("\n\n");
        out.into_bytes()
    }

    async fn send(addr: SocketAddr, data: &[u8]) -> std::io::Result<()> {
        let mut stream = TcpStream::connect(addr).await?;
        stream.write_all(data).await?;
        stream.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl PrinterPool for TcpPrinterPool {
    async fn submit(
        &self,
        printer_address: &str,
        ticket: &Ticket,
        timeout: Duration,
    ) -> SubmitOutcome {
        let addr: SocketAddr = match printer_address.parse() {
            Ok(addr) => addr,
            Err(_) => {
                warn!(addr = %printer_address, "Invalid printer address");
                return SubmitOutcome::Failed(format!("invalid address: {}", printer_address));
            }
        };

        let data = Self::render(ticket);

        match tokio::time::timeout(timeout, Self::send(addr, &data)).await {
            Ok(Ok(())) => {
                info!(addr = %printer_address, bytes = data.len(), order_id = %ticket.order_id, "Ticket sent");
                SubmitOutcome::Sent
            }
            Ok(Err(e)) => {
                warn!(addr = %printer_address, error = %e, "Ticket submission failed");
                SubmitOutcome::Failed(e.to_string())
            }
            Err(_) => {
                warn!(addr = %printer_address, timeout_ms = timeout.as_millis() as u64, "Ticket submission timed out");
                SubmitOutcome::TimedOut
            }
        }
    }
}

/// Scripted printer pool for tests and dry runs
///
/// Every submission is recorded; unknown addresses succeed by default so a
/// test only scripts the printers it cares about.
#[derive(Debug, Default)]
pub struct MockPrinterPool {
    outcomes: Mutex<HashMap<String, SubmitOutcome>>,
    submissions: Mutex<Vec<(String, i64, i64)>>,
}

impl MockPrinterPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the outcome for a printer address
    pub fn set_outcome(&self, printer_address: impl Into<String>, outcome: SubmitOutcome) {
        self.outcomes.lock().insert(printer_address.into(), outcome);
    }

    /// Submissions seen so far, as `(address, local_id, group_id)`
    pub fn submissions(&self) -> Vec<(String, i64, i64)> {
        self.submissions.lock().clone()
    }

    /// Number of submissions that reached the given address
    pub fn submission_count(&self, printer_address: &str) -> usize {
        self.submissions
            .lock()
            .iter()
            .filter(|(addr, _, _)| addr == printer_address)
            .count()
    }
}

#[async_trait]
impl PrinterPool for MockPrinterPool {
    async fn submit(
        &self,
        printer_address: &str,
        ticket: &Ticket,
        _timeout: Duration,
    ) -> SubmitOutcome {
        self.submissions.lock().push((
            printer_address.to_string(),
            ticket.local_id,
            ticket.group_id,
        ));
        self.outcomes
            .lock()
            .get(printer_address)
            .cloned()
            .unwrap_or(SubmitOutcome::Sent)
    }
}
