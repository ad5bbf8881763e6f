//! Haircut reference data.
//!
//! A haircut is the percentage discount applied to a stock's market value
//! when it is counted as collateral. The table is loaded once from the
//! broker's reference export and treated as immutable; a reload replaces
//! the whole table at once through [`SharedHaircutTable`].

pub mod loader;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use rust_decimal::Decimal;

use crate::TradingLimitError;

/// Source of haircut percentages keyed by stock code.
pub trait HaircutLookup {
    /// Returns the haircut of `code` as a percentage in `[0, 100]`.
    ///
    /// # Errors
    ///
    /// Returns [`TradingLimitError::UnknownStock`] if the code is absent.
    fn haircut_percent(&self, code: &str) -> crate::Result<Decimal>;

    /// Returns the haircut of `code` as a fraction in `[0, 1]`.
    fn haircut(&self, code: &str) -> crate::Result<Decimal> {
        Ok(self.haircut_percent(code)? / Decimal::ONE_HUNDRED)
    }
}

/// In-memory haircut table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HaircutTable {
    entries: HashMap<String, Decimal>,
}

impl HaircutTable {
    /// Builds a table from `(code, percent)` pairs.
    ///
    /// Codes are trimmed before insertion.
    ///
    /// # Errors
    ///
    /// Returns [`TradingLimitError::InvalidHaircutTable`] on an invalid code,
    /// a percentage outside `[0, 100]`, or a code listed twice.
    pub fn from_entries<I, S>(entries: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = (S, Decimal)>,
        S: AsRef<str>,
    {
        let mut table = Self::default();
        for (code, percent) in entries {
            table.insert(code.as_ref(), percent)?;
        }
        Ok(table)
    }

    fn insert(&mut self, code: &str, percent: Decimal) -> crate::Result<()> {
        let code = code.trim();
        if !is_valid_code(code) {
            return Err(TradingLimitError::InvalidHaircutTable(format!(
                "invalid stock code {code:?}"
            )));
        }
        if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
            return Err(TradingLimitError::InvalidHaircutTable(format!(
                "{code}: haircut {percent}% outside 0..=100"
            )));
        }
        if self.entries.insert(code.to_string(), percent).is_some() {
            return Err(TradingLimitError::InvalidHaircutTable(format!(
                "{code}: listed more than once"
            )));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    /// Iterates over `(code, percent)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> {
        self.entries.iter().map(|(code, percent)| (code.as_str(), *percent))
    }
}

impl HaircutLookup for HaircutTable {
    fn haircut_percent(&self, code: &str) -> crate::Result<Decimal> {
        self.entries
            .get(code)
            .copied()
            .ok_or_else(|| TradingLimitError::UnknownStock(code.to_string()))
    }
}

/// Stock codes are upper-case ASCII letters and digits.
pub(crate) fn is_valid_code(code: &str) -> bool {
    !code.is_empty()
        && code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// A haircut table that can be replaced while readers are active.
///
/// Readers take a [`snapshot`](Self::snapshot) and compute against it; a
/// concurrent [`replace`](Self::replace) never affects a snapshot already
/// taken.
#[derive(Debug, Default)]
pub struct SharedHaircutTable {
    current: RwLock<Arc<HaircutTable>>,
}

impl SharedHaircutTable {
    pub fn new(table: HaircutTable) -> Self {
        Self {
            current: RwLock::new(Arc::new(table)),
        }
    }

    /// Returns the table currently in effect.
    pub fn snapshot(&self) -> Arc<HaircutTable> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    /// Swaps in a new table, returning the one it replaced.
    pub fn replace(&self, table: HaircutTable) -> Arc<HaircutTable> {
        let entries = table.len();
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        let previous = std::mem::replace(&mut *guard, Arc::new(table));
        tracing::info!(entries, "Replaced haircut table");
        previous
    }
}
