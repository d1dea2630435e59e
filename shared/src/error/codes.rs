//! Unified error codes for the order engine
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Order errors
//! - 5xxx: Gift card / payment errors
//! - 7xxx: Printing errors
//! - 8xxx: Sync errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Status transition not allowed by the lifecycle table
    InvalidTransition = 4002,
    /// Duplicate order for (channel, order_id)
    DuplicateOrder = 4003,
    /// Update carried a stale sequence number
    StaleSequence = 4004,

    // ==================== 5xxx: Gift card ====================
    /// Gift card not found
    CardNotFound = 5001,
    /// Gift card is disabled
    CardInactive = 5002,
    /// Gift card is past its expiry date
    CardExpired = 5003,
    /// Redemption exceeds current balance
    InsufficientBalance = 5004,
    /// Amount must be positive
    InvalidAmount = 5005,

    // ==================== 7xxx: Printing ====================
    /// Printer submission failed
    PrintFailed = 7001,
    /// Printer submission timed out
    PrintTimedOut = 7002,
    /// Print group unknown or inactive
    PrintGroupUnavailable = 7003,

    // ==================== 8xxx: Sync ====================
    /// Remote feed unreachable
    TransportFailure = 8001,
    /// Remote order payload failed validation
    MalformedRemoteOrder = 8002,

    // ==================== 9xxx: System ====================
    /// Internal error
    InternalError = 9001,
    /// Storage layer error
    StorageError = 9002,
    /// Operation timed out
    TimedOut = 9003,
}

impl ErrorCode {
    /// Default human-readable message for this code
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::Success => "Success",
            ErrorCode::Unknown => "Unknown error",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::ValueOutOfRange => "Value out of range",
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::InvalidTransition => "Invalid status transition",
            ErrorCode::DuplicateOrder => "Order already exists for this channel",
            ErrorCode::StaleSequence => "Stale sequence number",
            ErrorCode::CardNotFound => "Gift card not found",
            ErrorCode::CardInactive => "Gift card is inactive",
            ErrorCode::CardExpired => "Gift card has expired",
            ErrorCode::InsufficientBalance => "Insufficient balance",
            ErrorCode::InvalidAmount => "Invalid amount",
            ErrorCode::PrintFailed => "Print submission failed",
            ErrorCode::PrintTimedOut => "Print submission timed out",
            ErrorCode::PrintGroupUnavailable => "Print group unavailable",
            ErrorCode::TransportFailure => "Remote feed unreachable",
            ErrorCode::MalformedRemoteOrder => "Malformed remote order",
            ErrorCode::InternalError => "Internal error",
            ErrorCode::StorageError => "Storage error",
            ErrorCode::TimedOut => "Operation timed out",
        }
    }

    /// Whether this error is transient and safe to retry on schedule
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorCode::TransportFailure
                | ErrorCode::TimedOut
                | ErrorCode::PrintTimedOut
                | ErrorCode::StorageError
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), *self as u16)
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code as u16
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            0 => ErrorCode::Success,
            1 => ErrorCode::Unknown,
            2 => ErrorCode::ValidationFailed,
            3 => ErrorCode::NotFound,
            4 => ErrorCode::AlreadyExists,
            5 => ErrorCode::InvalidRequest,
            8 => ErrorCode::ValueOutOfRange,
            4001 => ErrorCode::OrderNotFound,
            4002 => ErrorCode::InvalidTransition,
            4003 => ErrorCode::DuplicateOrder,
            4004 => ErrorCode::StaleSequence,
            5001 => ErrorCode::CardNotFound,
            5002 => ErrorCode::CardInactive,
            5003 => ErrorCode::CardExpired,
            5004 => ErrorCode::InsufficientBalance,
            5005 => ErrorCode::InvalidAmount,
            7001 => ErrorCode::PrintFailed,
            7002 => ErrorCode::PrintTimedOut,
            7003 => ErrorCode::PrintGroupUnavailable,
            8001 => ErrorCode::TransportFailure,
            8002 => ErrorCode::MalformedRemoteOrder,
            9001 => ErrorCode::InternalError,
            9002 => ErrorCode::StorageError,
            9003 => ErrorCode::TimedOut,
            other => return Err(format!("Unknown error code: {}", other)),
        };
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_u16() {
        let code = ErrorCode::InsufficientBalance;
        let raw: u16 = code.into();
        assert_eq!(raw, 5004);
        assert_eq!(ErrorCode::try_from(raw).unwrap(), code);
    }

    #[test]
    fn test_unknown_code_rejected() {
        assert!(ErrorCode::try_from(6666).is_err());
    }

    #[test]
    fn test_transient_classification() {
        assert!(ErrorCode::TransportFailure.is_transient());
        assert!(ErrorCode::PrintTimedOut.is_transient());
        assert!(!ErrorCode::InvalidTransition.is_transient());
        assert!(!ErrorCode::InsufficientBalance.is_transient());
    }
}
