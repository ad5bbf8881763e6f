//! Collateral rule table: per account type and risk class parameters.

use std::fmt::Write;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{AccountType, RiskClass};

const fn d(units: u32, scale: u32) -> Decimal {
    Decimal::from_parts(units, 0, 0, false, scale)
}

const fn values(a: Decimal, b: Decimal, c: Decimal, dd: Decimal, e: Decimal, f: Decimal) -> ClassValues {
    ClassValues { a, b, c, d: dd, e, f }
}

const ZERO: Decimal = Decimal::ZERO;
const ONE: Decimal = Decimal::ONE;

/// Parameters shared by FREE and MARGIN accounts.
const LEVERAGED: AccountRules = AccountRules {
    stock_multiplier: values(d(185, 2), d(185, 2), d(185, 2), ZERO, ZERO, ZERO),
    capping_billion: values(d(125, 1), d(65, 1), d(2, 0), ZERO, ZERO, ZERO),
    effective_buy_rate: values(ONE, ONE, ONE, ZERO, ZERO, ZERO),
    cash_multiplier: values(d(285, 2), d(285, 2), d(285, 2), ZERO, ZERO, ZERO),
};

const REGULAR: AccountRules = AccountRules {
    stock_multiplier: values(ONE, ONE, d(7, 1), d(2, 1), ZERO, ZERO),
    capping_billion: values(d(8, 0), d(4, 0), d(2, 0), ZERO, ZERO, ZERO),
    effective_buy_rate: values(ONE, d(5, 1), d(3, 1), d(3, 1), d(1, 1), d(1, 1)),
    cash_multiplier: values(d(4, 0), d(2, 0), ONE, ONE, ONE, ONE),
};

const ONLINE: AccountRules = AccountRules {
    stock_multiplier: values(ONE, ONE, d(7, 1), d(2, 1), ZERO, ZERO),
    capping_billion: values(d(4, 0), d(2, 0), ONE, ZERO, ZERO, ZERO),
    effective_buy_rate: values(ONE, d(5, 1), d(25, 2), d(25, 2), d(7, 2), d(7, 2)),
    cash_multiplier: values(d(3, 0), d(2, 0), ONE, ONE, ONE, ONE),
};

/// The brokerage's standard rule table.
pub const STANDARD_RULES: RuleTable = RuleTable {
    free: LEVERAGED,
    regular: REGULAR,
    margin: LEVERAGED,
    online: ONLINE,
};

/// Capping values are expressed in billions of currency units.
pub const CAPPING_UNIT: Decimal = d(1_000_000_000, 0);

/// One of the four parameter families of an [`AccountRules`] set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    /// Weight applied to a holding's capped collateral value.
    StockMultiplier,
    /// Per-holding collateral ceiling, in billions.
    CappingBillion,
    /// Final scaling factor, selected by the purchase target's class.
    EffectiveBuyRate,
    /// Weight applied to settled cash, selected by the purchase target's class.
    CashMultiplier,
}

impl Parameter {
    pub const ALL: [Parameter; 4] = [
        Parameter::StockMultiplier,
        Parameter::CappingBillion,
        Parameter::EffectiveBuyRate,
        Parameter::CashMultiplier,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Parameter::StockMultiplier => "stock_multiplier",
            Parameter::CappingBillion => "capping_billion",
            Parameter::EffectiveBuyRate => "effective_buy_rate",
            Parameter::CashMultiplier => "cash_multiplier",
        }
    }
}

/// One value per risk class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassValues {
    #[serde(rename = "A")]
    pub a: Decimal,
    #[serde(rename = "B")]
    pub b: Decimal,
    #[serde(rename = "C")]
    pub c: Decimal,
    #[serde(rename = "D")]
    pub d: Decimal,
    #[serde(rename = "E")]
    pub e: Decimal,
    #[serde(rename = "F")]
    pub f: Decimal,
}

impl ClassValues {
    pub fn get(&self, class: RiskClass) -> Decimal {
        match class {
            RiskClass::A => self.a,
            RiskClass::B => self.b,
            RiskClass::C => self.c,
            RiskClass::D => self.d,
            RiskClass::E => self.e,
            RiskClass::F => self.f,
        }
    }
}

/// The four parameter families for one account type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRules {
    pub stock_multiplier: ClassValues,
    pub capping_billion: ClassValues,
    pub effective_buy_rate: ClassValues,
    pub cash_multiplier: ClassValues,
}

impl AccountRules {
    pub fn family(&self, parameter: Parameter) -> &ClassValues {
        match parameter {
            Parameter::StockMultiplier => &self.stock_multiplier,
            Parameter::CappingBillion => &self.capping_billion,
            Parameter::EffectiveBuyRate => &self.effective_buy_rate,
            Parameter::CashMultiplier => &self.cash_multiplier,
        }
    }

    /// Returns the per-holding collateral ceiling in currency units.
    ///
    /// # Errors
    ///
    /// Returns [`TradingLimitError::Overflow`](crate::TradingLimitError::Overflow)
    /// if the ceiling exceeds the range of [`Decimal`].
    pub fn capping(&self, class: RiskClass) -> crate::Result<Decimal> {
        self.capping_billion
            .get(class)
            .checked_mul(CAPPING_UNIT)
            .ok_or_else(|| {
                crate::TradingLimitError::Overflow(format!("capping_billion.{class}"))
            })
    }
}

/// Immutable collateral policy for every account type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    #[serde(rename = "FREE")]
    pub free: AccountRules,
    #[serde(rename = "REGULAR")]
    pub regular: AccountRules,
    #[serde(rename = "MARGIN")]
    pub margin: AccountRules,
    #[serde(rename = "ONLINE")]
    pub online: AccountRules,
}

impl Default for RuleTable {
    fn default() -> Self {
        STANDARD_RULES
    }
}

impl RuleTable {
    /// Loads a rule table from a JSON file with the same shape as the
    /// standard table.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if any value
    /// is negative or an effective buy rate exceeds 1.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            crate::TradingLimitError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let table: Self = serde_json::from_str(&contents)?;
        table.validate()?;
        tracing::info!(path = %path.display(), "Loaded rule table");
        Ok(table)
    }

    /// Checks that every parameter is usable by the calculator.
    ///
    /// # Errors
    ///
    /// Returns [`TradingLimitError::Config`](crate::TradingLimitError::Config)
    /// naming the first offending parameter.
    pub fn validate(&self) -> crate::Result<()> {
        for account in AccountType::ALL {
            let rules = self.for_account(account);
            for parameter in Parameter::ALL {
                for class in RiskClass::ALL {
                    let value = rules.family(parameter).get(class);
                    if value < Decimal::ZERO {
                        return Err(crate::TradingLimitError::Config(format!(
                            "{account}.{}.{class} must not be negative, got {value}",
                            parameter.as_str()
                        )));
                    }
                    if parameter == Parameter::EffectiveBuyRate && value > Decimal::ONE {
                        return Err(crate::TradingLimitError::Config(format!(
                            "{account}.effective_buy_rate.{class} must not exceed 1, got {value}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Returns the rule set of an account type.
    pub fn for_account(&self, account: AccountType) -> &AccountRules {
        match account {
            AccountType::Free => &self.free,
            AccountType::Regular => &self.regular,
            AccountType::Margin => &self.margin,
            AccountType::Online => &self.online,
        }
    }

    /// Returns a single parameter value.
    pub fn parameter(&self, account: AccountType, class: RiskClass, parameter: Parameter) -> Decimal {
        self.for_account(account).family(parameter).get(class)
    }

    /// Returns a human-readable rendering of the whole table.
    pub fn describe(&self) -> String {
        let mut out = String::from("Trading limit rules:\n");
        for account in AccountType::ALL {
            let _ = writeln!(out, "  {account}:");
            let rules = self.for_account(account);
            for parameter in Parameter::ALL {
                let family = rules.family(parameter);
                let cells: Vec<String> = RiskClass::ALL
                    .iter()
                    .map(|class| format!("{class}={}", family.get(*class)))
                    .collect();
                let _ = writeln!(out, "    {}: {}", parameter.as_str(), cells.join(" "));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn standard_free_values() {
        let rules = &STANDARD_RULES;
        let free = AccountType::Free;
        assert_eq!(rules.parameter(free, RiskClass::A, Parameter::StockMultiplier), dec!(1.85));
        assert_eq!(rules.parameter(free, RiskClass::A, Parameter::CappingBillion), dec!(12.5));
        assert_eq!(rules.parameter(free, RiskClass::B, Parameter::CappingBillion), dec!(6.5));
        assert_eq!(rules.parameter(free, RiskClass::C, Parameter::CashMultiplier), dec!(2.85));
        assert_eq!(rules.parameter(free, RiskClass::D, Parameter::EffectiveBuyRate), dec!(0));
    }

    #[test]
    fn every_standard_value_matches_policy() {
        use AccountType::{Free, Margin, Online, Regular};
        use Parameter::{CappingBillion, CashMultiplier, EffectiveBuyRate, StockMultiplier};

        let leveraged = [
            (StockMultiplier, [dec!(1.85), dec!(1.85), dec!(1.85), dec!(0), dec!(0), dec!(0)]),
            (CappingBillion, [dec!(12.5), dec!(6.5), dec!(2), dec!(0), dec!(0), dec!(0)]),
            (EffectiveBuyRate, [dec!(1), dec!(1), dec!(1), dec!(0), dec!(0), dec!(0)]),
            (CashMultiplier, [dec!(2.85), dec!(2.85), dec!(2.85), dec!(0), dec!(0), dec!(0)]),
        ];
        let regular = [
            (StockMultiplier, [dec!(1), dec!(1), dec!(0.7), dec!(0.2), dec!(0), dec!(0)]),
            (CappingBillion, [dec!(8), dec!(4), dec!(2), dec!(0), dec!(0), dec!(0)]),
            (EffectiveBuyRate, [dec!(1), dec!(0.5), dec!(0.3), dec!(0.3), dec!(0.1), dec!(0.1)]),
            (CashMultiplier, [dec!(4), dec!(2), dec!(1), dec!(1), dec!(1), dec!(1)]),
        ];
        let online = [
            (StockMultiplier, [dec!(1), dec!(1), dec!(0.7), dec!(0.2), dec!(0), dec!(0)]),
            (CappingBillion, [dec!(4), dec!(2), dec!(1), dec!(0), dec!(0), dec!(0)]),
            (EffectiveBuyRate, [dec!(1), dec!(0.5), dec!(0.25), dec!(0.25), dec!(0.07), dec!(0.07)]),
            (CashMultiplier, [dec!(3), dec!(2), dec!(1), dec!(1), dec!(1), dec!(1)]),
        ];

        let mut checked = 0;
        for (account, rows) in [(Free, &leveraged), (Regular, &regular), (Margin, &leveraged), (Online, &online)] {
            for (parameter, expected) in rows {
                for (class, value) in RiskClass::ALL.iter().zip(expected) {
                    assert_eq!(
                        STANDARD_RULES.parameter(account, *class, *parameter),
                        *value,
                        "{account}.{}.{class}",
                        parameter.as_str()
                    );
                    checked += 1;
                }
            }
        }
        assert_eq!(checked, 96);
    }

    #[test]
    fn margin_mirrors_free() {
        assert_eq!(STANDARD_RULES.margin, STANDARD_RULES.free);
    }

    #[test]
    fn standard_regular_and_online_values() {
        let rules = &STANDARD_RULES;
        assert_eq!(
            rules.parameter(AccountType::Regular, RiskClass::C, Parameter::EffectiveBuyRate),
            dec!(0.3)
        );
        assert_eq!(
            rules.parameter(AccountType::Regular, RiskClass::A, Parameter::CashMultiplier),
            dec!(4)
        );
        assert_eq!(
            rules.parameter(AccountType::Online, RiskClass::E, Parameter::EffectiveBuyRate),
            dec!(0.07)
        );
        assert_eq!(
            rules.parameter(AccountType::Online, RiskClass::C, Parameter::CappingBillion),
            dec!(1)
        );
        assert_eq!(
            rules.parameter(AccountType::Online, RiskClass::D, Parameter::StockMultiplier),
            dec!(0.2)
        );
    }

    #[test]
    fn capping_is_scaled_to_currency() {
        assert_eq!(STANDARD_RULES.free.capping(RiskClass::A).unwrap(), dec!(12500000000));
        assert_eq!(STANDARD_RULES.online.capping(RiskClass::F).unwrap(), dec!(0));

        let mut table = STANDARD_RULES;
        table.free.capping_billion.a = Decimal::MAX;
        assert!(matches!(
            table.free.capping(RiskClass::A),
            Err(crate::TradingLimitError::Overflow(_))
        ));
    }

    #[test]
    fn standard_table_validates() {
        assert!(STANDARD_RULES.validate().is_ok());
    }

    #[test]
    fn json_round_trip_preserves_table() {
        let json = serde_json::to_string(&STANDARD_RULES).unwrap();
        assert!(json.contains("\"FREE\""));
        let parsed: RuleTable = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, STANDARD_RULES);
    }

    #[test]
    fn rejects_buy_rate_above_one() {
        let mut table = STANDARD_RULES;
        table.online.effective_buy_rate.b = dec!(1.5);
        let err = table.validate().unwrap_err();
        assert!(err.to_string().contains("ONLINE.effective_buy_rate.B must not exceed 1"));
    }

    #[test]
    fn rejects_negative_value() {
        let mut table = STANDARD_RULES;
        table.regular.cash_multiplier.f = dec!(-1);
        let err = table.validate().unwrap_err();
        assert!(err.to_string().contains("REGULAR.cash_multiplier.F must not be negative"));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        let mut table = STANDARD_RULES;
        table.free.cash_multiplier.a = dec!(3);
        std::fs::write(&path, serde_json::to_string_pretty(&table).unwrap()).unwrap();

        let loaded = RuleTable::load(&path).unwrap();
        assert_eq!(loaded.free.cash_multiplier.a, dec!(3));
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let err = RuleTable::load(Path::new("/nonexistent/rules.json")).unwrap_err();
        assert!(matches!(err, crate::TradingLimitError::Config(_)));
    }

    #[test]
    fn describe_lists_every_account() {
        let desc = STANDARD_RULES.describe();
        for account in AccountType::ALL {
            assert!(desc.contains(&format!("{account}:")));
        }
        assert!(desc.contains("stock_multiplier: A=1.85 B=1.85 C=1.85 D=0 E=0 F=0"));
    }
}
