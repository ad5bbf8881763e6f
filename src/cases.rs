//! Regression cases: recorded portfolios and the limits the trading
//! terminal reported for them.
//!
//! ```json
//! {
//!     "case3": {
//!         "input": { "CASHT2": 87594000384, "BBCA": { "lot": 10000, "price": 2430 } },
//!         "output": { "BBCA": 253913628672 }
//!     }
//! }
//! ```
//!
//! Terminal figures are compared within a tolerance, not exactly.

use std::collections::BTreeMap;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::haircut::HaircutLookup;
use crate::limit::TradingLimitCalculator;
use crate::portfolio::RawPortfolio;
use crate::risk::AccountType;

/// Default comparison tolerance, in currency units.
pub const DEFAULT_TOLERANCE: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

/// A recorded portfolio and the expected limit per purchase target.
#[derive(Debug, Clone, Deserialize)]
pub struct RegressionCase {
    pub input: RawPortfolio,
    pub output: BTreeMap<String, Decimal>,
}

/// A named collection of regression cases.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct RegressionSuite {
    pub cases: BTreeMap<String, RegressionCase>,
}

/// How a single (case, target) pair fared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Within { actual: Decimal, difference: Decimal },
    Outside { actual: Decimal, difference: Decimal },
    /// The limit could not be computed.
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseOutcome {
    pub case: String,
    pub target: String,
    pub expected: Decimal,
    pub verdict: Verdict,
}

impl CaseOutcome {
    pub fn passed(&self) -> bool {
        matches!(self.verdict, Verdict::Within { .. })
    }
}

/// Outcomes of evaluating a whole suite.
#[derive(Debug, Clone, Default)]
pub struct SuiteReport {
    pub outcomes: Vec<CaseOutcome>,
}

impl SuiteReport {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseOutcome> {
        self.outcomes.iter().filter(|o| !o.passed())
    }

    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(CaseOutcome::passed)
    }
}

impl RegressionSuite {
    /// Loads a suite from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            crate::TradingLimitError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_json(&contents)
    }

    /// Parses a suite from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TradingLimitError::Json`](crate::TradingLimitError::Json) on
    /// malformed input.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Computes every expected limit and compares it with the recorded one.
    ///
    /// A case whose portfolio is invalid yields an [`Verdict::Error`] for each
    /// of its targets.
    pub fn evaluate<H: HaircutLookup + ?Sized>(
        &self,
        calculator: &TradingLimitCalculator<'_, H>,
        account: AccountType,
        tolerance: Decimal,
    ) -> SuiteReport {
        let mut outcomes = Vec::new();
        for (name, case) in &self.cases {
            let portfolio = case.input.clone().validate();
            for (target, expected) in &case.output {
                let computed = portfolio
                    .as_ref()
                    .map_err(ToString::to_string)
                    .and_then(|p| {
                        calculator
                            .compute_limit(account, target, p)
                            .map_err(|e| e.to_string())
                    });
                let verdict = match computed {
                    Ok(actual) => {
                        let difference = (actual - *expected).abs();
                        if difference <= tolerance {
                            Verdict::Within { actual, difference }
                        } else {
                            Verdict::Outside { actual, difference }
                        }
                    }
                    Err(reason) => Verdict::Error(reason),
                };
                match &verdict {
                    Verdict::Within { difference, .. } => {
                        debug!(case = %name, stock = %target, %difference, "Case within tolerance");
                    }
                    Verdict::Outside { actual, difference } => {
                        warn!(
                            case = %name,
                            stock = %target,
                            %expected,
                            %actual,
                            %difference,
                            "Case outside tolerance"
                        );
                    }
                    Verdict::Error(reason) => {
                        warn!(case = %name, stock = %target, %reason, "Case failed");
                    }
                }
                outcomes.push(CaseOutcome {
                    case: name.clone(),
                    target: target.clone(),
                    expected: *expected,
                    verdict,
                });
            }
        }
        SuiteReport { outcomes }
    }
}
