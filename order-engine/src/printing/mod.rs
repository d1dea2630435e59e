//! Kitchen print routing
//!
//! Splits an order's items by print group, builds one ticket per
//! non-empty group, and submits each to its printer with independent
//! per-group outcomes. One printer failing or timing out never blocks the
//! other groups, and re-dispatch is idempotent: a group whose last outcome
//! was `Sent` is not submitted again.

mod catalog;
mod pool;
mod router;
mod types;
mod worker;

pub use catalog::PrintGroupCatalog;
pub use pool::{MockPrinterPool, PrinterPool, TcpPrinterPool};
pub use router::PrintRouter;
pub use types::{DispatchResult, SkipReason, SubmitOutcome, Ticket, TicketLine};
pub use worker::PrintWorker;
