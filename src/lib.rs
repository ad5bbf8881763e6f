//! Collateral-based trading limit calculator.
//!
//! Computes how much a brokerage client may spend on one stock, given their
//! account type, settled cash and stock holdings. Holdings count as
//! collateral after a per-stock haircut and a per-class ceiling; the risk
//! class of the stock being bought then scales the whole limit.

pub mod cases;
pub mod config;
pub mod error;
pub mod haircut;
pub mod limit;
pub mod portfolio;
#[cfg(feature = "python")]
mod python;
pub mod risk;

pub use error::{Result, TradingLimitError};
pub use haircut::{HaircutLookup, HaircutTable, SharedHaircutTable};
pub use limit::{LimitBreakdown, TradingLimitCalculator, compute_limit};
pub use portfolio::PortfolioSnapshot;
pub use risk::rules::RuleTable;
pub use risk::{AccountType, RiskClass, classify, classify_percent};
