//! Portfolio snapshot: settled cash plus stock holdings.
//!
//! The wire shape is a single JSON object keyed by holding:
//!
//! ```json
//! { "CASHT2": 87594000384, "BBCA": { "lot": 10000, "price": 2430 } }
//! ```
//!
//! `CASHT2` is the settled (T+2) cash balance; every other key is a stock
//! code. Duplicate keys are rejected rather than silently overwritten.

use std::fmt;

use rust_decimal::Decimal;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::TradingLimitError;
use crate::haircut::is_valid_code;

/// Reserved key for the settled cash balance.
pub const CASH_KEY: &str = "CASHT2";

/// Shares per board lot.
pub const SHARES_PER_LOT: u64 = 100;

/// A stock position held in the portfolio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holding {
    pub code: String,
    /// Number of board lots, always positive.
    pub lot: u64,
    /// Price per share, always positive.
    pub price: Decimal,
}

impl Holding {
    /// Number of shares held. Lot counts are bounded on insertion so this
    /// cannot overflow.
    pub fn shares(&self) -> u64 {
        self.lot.saturating_mul(SHARES_PER_LOT)
    }

    /// Gross market value before any haircut.
    ///
    /// # Errors
    ///
    /// Returns [`TradingLimitError::Overflow`] if shares times price exceeds
    /// the range of [`Decimal`].
    pub fn gross_value(&self) -> crate::Result<Decimal> {
        Decimal::from(self.shares())
            .checked_mul(self.price)
            .ok_or_else(|| TradingLimitError::Overflow(format!("{}: gross value", self.code)))
    }
}

/// Validated portfolio snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortfolioSnapshot {
    cash: Decimal,
    holdings: Vec<Holding>,
}

impl PortfolioSnapshot {
    /// Creates a snapshot holding only settled cash.
    ///
    /// # Errors
    ///
    /// Returns [`TradingLimitError::InvalidPortfolio`] if `cash` is negative.
    pub fn with_cash(cash: Decimal) -> crate::Result<Self> {
        if cash < Decimal::ZERO {
            return Err(TradingLimitError::InvalidPortfolio(format!(
                "{CASH_KEY} must not be negative, got {cash}"
            )));
        }
        Ok(Self {
            cash,
            holdings: Vec::new(),
        })
    }

    /// Adds a stock holding.
    ///
    /// # Errors
    ///
    /// Returns [`TradingLimitError::InvalidPortfolio`] if the lot or price is
    /// not positive, the code is malformed or reserved, or the code is already
    /// held.
    pub fn add_holding(&mut self, code: &str, lot: i64, price: Decimal) -> crate::Result<()> {
        let code = code.trim();
        if code == CASH_KEY {
            return Err(TradingLimitError::InvalidPortfolio(format!(
                "{CASH_KEY} is reserved for cash and cannot be a stock holding"
            )));
        }
        if !is_valid_code(code) {
            return Err(TradingLimitError::InvalidPortfolio(format!(
                "invalid stock code {code:?}"
            )));
        }
        if lot <= 0 {
            return Err(TradingLimitError::InvalidPortfolio(format!(
                "{code}: lot must be positive, got {lot}"
            )));
        }
        if lot.unsigned_abs().checked_mul(SHARES_PER_LOT).is_none() {
            return Err(TradingLimitError::InvalidPortfolio(format!(
                "{code}: lot {lot} exceeds the share count limit"
            )));
        }
        if price <= Decimal::ZERO {
            return Err(TradingLimitError::InvalidPortfolio(format!(
                "{code}: price must be positive, got {price}"
            )));
        }
        if self.holding(code).is_some() {
            return Err(TradingLimitError::InvalidPortfolio(format!(
                "{code}: held more than once"
            )));
        }
        self.holdings.push(Holding {
            code: code.to_string(),
            lot: lot.unsigned_abs(),
            price,
        });
        Ok(())
    }

    /// Builder form of [`add_holding`](Self::add_holding).
    ///
    /// # Errors
    ///
    /// See [`add_holding`](Self::add_holding).
    pub fn holding_of(mut self, code: &str, lot: i64, price: Decimal) -> crate::Result<Self> {
        self.add_holding(code, lot, price)?;
        Ok(self)
    }

    /// Parses and validates a snapshot from its JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`TradingLimitError::Json`] if the document is not shaped like
    /// a snapshot and [`TradingLimitError::InvalidPortfolio`] if it is shaped
    /// correctly but violates a portfolio invariant.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let raw: RawPortfolio = serde_json::from_str(json)?;
        raw.validate()
    }

    /// Settled cash balance.
    pub fn cash(&self) -> Decimal {
        self.cash
    }

    /// Stock holdings, in insertion order.
    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    pub fn holding(&self, code: &str) -> Option<&Holding> {
        self.holdings.iter().find(|h| h.code == code)
    }

    /// Every stock code the snapshot refers to.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.holdings.iter().map(|h| h.code.as_str())
    }
}

/// Unvalidated snapshot entry as it appears on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum RawEntry {
    Cash(Decimal),
    Holding { lot: i64, price: Decimal },
}

#[derive(Deserialize)]
struct RawHolding {
    lot: i64,
    price: Decimal,
}

/// Snapshot entries in document order, duplicates preserved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPortfolio {
    pub entries: Vec<(String, RawEntry)>,
}

impl RawPortfolio {
    /// Validates the entries into a [`PortfolioSnapshot`].
    ///
    /// # Errors
    ///
    /// Returns [`TradingLimitError::InvalidPortfolio`] on the first invalid
    /// entry. Cash may be omitted, in which case it is zero.
    pub fn validate(self) -> crate::Result<PortfolioSnapshot> {
        let mut cash = None;
        let mut holdings = Vec::new();
        for (key, entry) in self.entries {
            match entry {
                RawEntry::Cash(amount) => {
                    if cash.replace(amount).is_some() {
                        return Err(TradingLimitError::InvalidPortfolio(format!(
                            "{CASH_KEY} listed more than once"
                        )));
                    }
                }
                RawEntry::Holding { lot, price } => holdings.push((key, lot, price)),
            }
        }
        let mut snapshot = PortfolioSnapshot::with_cash(cash.unwrap_or(Decimal::ZERO))?;
        for (code, lot, price) in holdings {
            snapshot.add_holding(&code, lot, price)?;
        }
        Ok(snapshot)
    }
}

impl<'de> Deserialize<'de> for RawPortfolio {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RawPortfolioVisitor;

        impl<'de> Visitor<'de> for RawPortfolioVisitor {
            type Value = RawPortfolio;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a map of {CASH_KEY} and stock holdings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::new();
                while let Some(key) = map.next_key::<String>()? {
                    let entry = if key == CASH_KEY {
                        RawEntry::Cash(map.next_value()?)
                    } else {
                        let holding: RawHolding = map.next_value()?;
                        RawEntry::Holding {
                            lot: holding.lot,
                            price: holding.price,
                        }
                    };
                    entries.push((key, entry));
                }
                Ok(RawPortfolio { entries })
            }
        }

        deserializer.deserialize_map(RawPortfolioVisitor)
    }
}
