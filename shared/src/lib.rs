//! Shared types for the order engine
//!
//! Common types used across the workspace: domain models, order status and
//! event types, the unified error system, and small utilities.

pub mod error;
pub mod models;
pub mod order;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, AppResult, ErrorCode};
pub use order::{OrderEvent, OrderStatus, TransitionOrigin};
