//! Error taxonomy: expected business rejections versus unexpected
//! infrastructure failures (see SPEC_FULL.md §A.2).

use thiserror::Error;

/// Why an instruction was rejected. These are expected, frequent outcomes,
/// never propagated as `Err` — they are mapped directly to NACK responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Malformed request: symbol too long, zero quantity, zero order id, ...
    Malformed,
    /// Request is well-formed but violates a domain rule: quantity below
    /// minimum, price off the tick grid, price outside [minPrice, maxPrice],
    /// missing triggerPrice for a stop order.
    Invalid,
    /// Policy rejection: symbol halted, or this order would move price
    /// beyond `volatilityThreshold` of `referencePrice` (which also halts
    /// the symbol as a side effect).
    Policy,
    /// No engine registered for the symbol, or no resting order with the
    /// given id (cancel / cancel-replace of an unknown order).
    NotFound,
    /// Write-ahead log append failed; the instruction is not applied.
    WalFailure,
}

impl RejectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RejectReason::Malformed => "MALFORMED",
            RejectReason::Invalid => "INVALID",
            RejectReason::Policy => "POLICY",
            RejectReason::NotFound => "NOT_FOUND",
            RejectReason::WalFailure => "WAL_FAILURE",
        }
    }
}

/// Infrastructure-level failures that are not business outcomes.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("wal append failed: {0}")]
    WalAppend(#[from] std::io::Error),
    #[error("engine already registered for symbol {0}")]
    DuplicateSymbol(String),
    #[error("no engine registered for symbol {0}")]
    UnknownSymbol(String),
}
