//! Risk classification of stocks and account types.
//!
//! A stock's haircut percentage places it in one of six risk classes. The
//! class, together with the account type, selects the collateral parameters
//! from the [`RuleTable`](rules::RuleTable).

pub mod rules;

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::TradingLimitError;

/// Risk class derived from a haircut percentage.
#[cfg_attr(feature = "python", pyo3::pyclass(eq, eq_int, frozen, from_py_object))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskClass {
    A,
    B,
    C,
    D,
    E,
    F,
}

/// Closed haircut-percentage bands, tested in order.
const CLASS_BANDS: [(RiskClass, Decimal, Decimal); 6] = [
    (RiskClass::A, Decimal::from_parts(0, 0, 0, false, 0), Decimal::from_parts(25, 0, 0, false, 0)),
    (RiskClass::B, Decimal::from_parts(30, 0, 0, false, 0), Decimal::from_parts(45, 0, 0, false, 0)),
    (RiskClass::C, Decimal::from_parts(50, 0, 0, false, 0), Decimal::from_parts(65, 0, 0, false, 0)),
    (RiskClass::D, Decimal::from_parts(70, 0, 0, false, 0), Decimal::from_parts(75, 0, 0, false, 0)),
    (RiskClass::E, Decimal::from_parts(80, 0, 0, false, 0), Decimal::from_parts(85, 0, 0, false, 0)),
    (RiskClass::F, Decimal::from_parts(90, 0, 0, false, 0), Decimal::from_parts(100, 0, 0, false, 0)),
];

impl RiskClass {
    /// All classes, from most to least liquid.
    pub const ALL: [RiskClass; 6] = [
        RiskClass::A,
        RiskClass::B,
        RiskClass::C,
        RiskClass::D,
        RiskClass::E,
        RiskClass::F,
    ];

    /// Returns the single-letter label of the class.
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskClass::A => "A",
            RiskClass::B => "B",
            RiskClass::C => "C",
            RiskClass::D => "D",
            RiskClass::E => "E",
            RiskClass::F => "F",
        }
    }

    /// Returns the inclusive haircut-percentage band `(low, high)` of the class.
    pub fn band(&self) -> (Decimal, Decimal) {
        let (_, low, high) = CLASS_BANDS[*self as usize];
        (low, high)
    }
}

impl fmt::Display for RiskClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies a haircut expressed as a percentage (`0..=100`).
///
/// Bands are closed on both ends and no rounding is applied, so a value such
/// as `25.5` or `46` that sits between two bands is rejected.
///
/// # Errors
///
/// Returns [`TradingLimitError::UnclassifiedHaircut`] when the percentage lies
/// in a gap between bands or outside `[0, 100]`.
pub fn classify_percent(percent: Decimal) -> crate::Result<RiskClass> {
    CLASS_BANDS
        .iter()
        .find(|(_, low, high)| *low <= percent && percent <= *high)
        .map(|(class, _, _)| *class)
        .ok_or(TradingLimitError::UnclassifiedHaircut { percent })
}

/// Classifies a haircut expressed as a fraction (`0..=1`).
///
/// # Errors
///
/// See [`classify_percent`].
pub fn classify(fraction: Decimal) -> crate::Result<RiskClass> {
    classify_percent(fraction * Decimal::ONE_HUNDRED)
}

/// Brokerage account type; selects the rule set applied to a portfolio.
#[cfg_attr(feature = "python", pyo3::pyclass(eq, eq_int, frozen, from_py_object))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountType {
    Free,
    Regular,
    Margin,
    Online,
}

impl AccountType {
    pub const ALL: [AccountType; 4] = [
        AccountType::Free,
        AccountType::Regular,
        AccountType::Margin,
        AccountType::Online,
    ];

    /// Returns the upper-case name used in configuration and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Free => "FREE",
            AccountType::Regular => "REGULAR",
            AccountType::Margin => "MARGIN",
            AccountType::Online => "ONLINE",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = TradingLimitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FREE" => Ok(AccountType::Free),
            "REGULAR" => Ok(AccountType::Regular),
            "MARGIN" => Ok(AccountType::Margin),
            "ONLINE" => Ok(AccountType::Online),
            other => Err(TradingLimitError::Config(format!(
                "unknown account type: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn band_edges_are_inclusive() {
        let cases = [
            (dec!(0), RiskClass::A),
            (dec!(10), RiskClass::A),
            (dec!(25), RiskClass::A),
            (dec!(30), RiskClass::B),
            (dec!(45), RiskClass::B),
            (dec!(50), RiskClass::C),
            (dec!(65), RiskClass::C),
            (dec!(70), RiskClass::D),
            (dec!(75), RiskClass::D),
            (dec!(80), RiskClass::E),
            (dec!(85), RiskClass::E),
            (dec!(90), RiskClass::F),
            (dec!(100), RiskClass::F),
        ];
        for (percent, expected) in cases {
            assert_eq!(classify_percent(percent).unwrap(), expected, "{percent}%");
        }
    }

    #[test]
    fn gaps_are_unclassified() {
        for percent in [dec!(26), dec!(46), dec!(66), dec!(76), dec!(86), dec!(25.5)] {
            assert!(matches!(
                classify_percent(percent),
                Err(TradingLimitError::UnclassifiedHaircut { percent: p }) if p == percent
            ));
        }
    }

    #[test]
    fn out_of_range_is_unclassified() {
        assert!(classify_percent(dec!(-1)).is_err());
        assert!(classify_percent(dec!(100.01)).is_err());
    }

    #[test]
    fn fraction_is_scaled_to_percent() {
        assert_eq!(classify(dec!(0.05)).unwrap(), RiskClass::A);
        assert_eq!(classify(dec!(0.65)).unwrap(), RiskClass::C);
        assert_eq!(classify(dec!(1)).unwrap(), RiskClass::F);
        assert!(classify(dec!(0.27)).is_err());
    }

    #[test]
    fn band_lookup_matches_table() {
        assert_eq!(RiskClass::B.band(), (dec!(30), dec!(45)));
        assert_eq!(RiskClass::F.band(), (dec!(90), dec!(100)));
    }

    #[test]
    fn parse_account_type() {
        assert_eq!("free".parse::<AccountType>().unwrap(), AccountType::Free);
        assert_eq!(" ONLINE ".parse::<AccountType>().unwrap(), AccountType::Online);
        let err = "cash".parse::<AccountType>().unwrap_err();
        assert!(err.to_string().contains("unknown account type: CASH"));
    }

    #[test]
    fn account_type_serde_names() {
        let json = serde_json::to_string(&AccountType::Regular).unwrap();
        assert_eq!(json, "\"REGULAR\"");
        let parsed: AccountType = serde_json::from_str("\"MARGIN\"").unwrap();
        assert_eq!(parsed, AccountType::Margin);
    }
}
