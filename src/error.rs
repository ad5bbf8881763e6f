//! Crate-level error types.
//!
//! Lookup and classification failures come from the reference data, the
//! portfolio and overflow variants from caller input, and the config and JSON
//! variants from loading files. A limit is either computed in full or one of
//! these is returned.

use rust_decimal::Decimal;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TradingLimitError>;

/// Top-level error type returned by all public APIs.
///
/// Every variant is terminal for the call that produced it: no computation
/// returns a partial or best-effort limit.
#[derive(Debug, thiserror::Error)]
pub enum TradingLimitError {
    /// A stock code has no entry in the haircut table.
    #[error("unknown stock code: {0}")]
    UnknownStock(String),

    /// A haircut percentage falls between two risk-class bands or outside
    /// `[0, 100]`.
    #[error("haircut {percent}% does not fall in any risk class band")]
    UnclassifiedHaircut { percent: Decimal },

    /// The portfolio snapshot is malformed.
    #[error("invalid portfolio: {0}")]
    InvalidPortfolio(String),

    /// An intermediate amount exceeds the representable range.
    #[error("arithmetic overflow: {0}")]
    Overflow(String),

    /// The haircut reference data is malformed.
    #[error("invalid haircut table: {0}")]
    InvalidHaircutTable(String),

    /// A configuration value or file could not be found, read, or validated.
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
