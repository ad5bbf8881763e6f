//! Trading limit computation.
//!
//! The limit for buying a target stock is the haircut-adjusted, capped
//! collateral value of the portfolio, weighted per holding class, plus
//! weighted settled cash, all scaled by the effective buy rate of the
//! target's class:
//!
//! ```text
//! limit = rate[target] * ( cash_mult[target] * CASHT2
//!       + Σ stock_mult[h] * min(lot * 100 * price * (1 - haircut[h]), cap[h]) )
//! ```

use rust_decimal::Decimal;
use tracing::debug;

use crate::TradingLimitError;
use crate::haircut::HaircutLookup;
use crate::portfolio::{Holding, PortfolioSnapshot};
use crate::risk::rules::{RuleTable, STANDARD_RULES};
use crate::risk::{AccountType, RiskClass, classify};

/// Collateral contributed by a single holding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoldingContribution {
    pub code: String,
    pub class: RiskClass,
    /// Haircut as a fraction.
    pub haircut: Decimal,
    /// Haircut-adjusted market value.
    pub market_value: Decimal,
    /// Market value after the class ceiling.
    pub collateral_value: Decimal,
    /// Whether the class ceiling was reached.
    pub capped: bool,
    /// Collateral value weighted by the class stock multiplier.
    pub contribution: Decimal,
}

/// Every intermediate of a limit computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitBreakdown {
    pub account: AccountType,
    pub target: String,
    pub target_class: RiskClass,
    pub effective_buy_rate: Decimal,
    pub cash_contribution: Decimal,
    pub holdings: Vec<HoldingContribution>,
    /// Cash plus holding contributions, before the effective buy rate.
    pub gross: Decimal,
    pub limit: Decimal,
}

/// Computes trading limits against a rule table and a haircut source.
pub struct TradingLimitCalculator<'a, H: HaircutLookup + ?Sized> {
    rules: &'a RuleTable,
    haircuts: &'a H,
}

impl<'a, H: HaircutLookup + ?Sized> TradingLimitCalculator<'a, H> {
    pub fn new(rules: &'a RuleTable, haircuts: &'a H) -> Self {
        Self { rules, haircuts }
    }

    /// Creates a calculator using the brokerage's standard rule table.
    pub fn standard(haircuts: &'a H) -> Self {
        Self::new(&STANDARD_RULES, haircuts)
    }

    pub fn rules(&self) -> &RuleTable {
        self.rules
    }

    /// Computes the trading limit for buying `target`.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownStock`](crate::TradingLimitError::UnknownStock) or
    /// [`UnclassifiedHaircut`](crate::TradingLimitError::UnclassifiedHaircut)
    /// if the target or any holding cannot be classified. No partial limit
    /// is produced.
    pub fn compute_limit(
        &self,
        account: AccountType,
        target: &str,
        portfolio: &PortfolioSnapshot,
    ) -> crate::Result<Decimal> {
        Ok(self.explain(account, target, portfolio)?.limit)
    }

    /// Computes the trading limit and returns every intermediate value.
    ///
    /// # Errors
    ///
    /// See [`compute_limit`](Self::compute_limit).
    pub fn explain(
        &self,
        account: AccountType,
        target: &str,
        portfolio: &PortfolioSnapshot,
    ) -> crate::Result<LimitBreakdown> {
        let rules = self.rules.for_account(account);
        let target_class = classify(self.haircuts.haircut(target)?)?;

        let cash_contribution = checked_mul(
            rules.cash_multiplier.get(target_class),
            portfolio.cash(),
            "cash contribution",
        )?;

        let holdings = portfolio
            .holdings()
            .iter()
            .map(|holding| self.contribution(account, holding))
            .collect::<crate::Result<Vec<_>>>()?;

        let gross = holdings.iter().try_fold(cash_contribution, |sum, h| {
            sum.checked_add(h.contribution)
                .ok_or_else(|| TradingLimitError::Overflow("collateral sum".to_string()))
        })?;
        let effective_buy_rate = rules.effective_buy_rate.get(target_class);
        let limit = checked_mul(gross, effective_buy_rate, "trading limit")?;

        debug!(
            account = account.as_str(),
            stock = target,
            class = target_class.as_str(),
            %gross,
            %limit,
            "Computed trading limit"
        );

        Ok(LimitBreakdown {
            account,
            target: target.to_string(),
            target_class,
            effective_buy_rate,
            cash_contribution,
            holdings,
            gross,
            limit,
        })
    }

    fn contribution(
        &self,
        account: AccountType,
        holding: &Holding,
    ) -> crate::Result<HoldingContribution> {
        let rules = self.rules.for_account(account);
        let haircut = self.haircuts.haircut(&holding.code)?;
        let class = classify(haircut)?;

        let market_value = checked_mul(
            holding.gross_value()?,
            Decimal::ONE - haircut,
            &holding.code,
        )?;
        let ceiling = rules.capping(class)?;
        let capped = market_value > ceiling;
        let collateral_value = market_value.min(ceiling);
        let contribution = checked_mul(
            rules.stock_multiplier.get(class),
            collateral_value,
            &holding.code,
        )?;

        debug!(
            code = %holding.code,
            class = class.as_str(),
            %market_value,
            %collateral_value,
            capped,
            "Holding collateral"
        );

        Ok(HoldingContribution {
            code: holding.code.clone(),
            class,
            haircut,
            market_value,
            collateral_value,
            capped,
            contribution,
        })
    }
}

fn checked_mul(a: Decimal, b: Decimal, what: &str) -> crate::Result<Decimal> {
    a.checked_mul(b)
        .ok_or_else(|| TradingLimitError::Overflow(what.to_string()))
}

/// Computes a trading limit with the standard rule table.
///
/// # Errors
///
/// See [`TradingLimitCalculator::compute_limit`].
pub fn compute_limit<H: HaircutLookup + ?Sized>(
    account: AccountType,
    target: &str,
    portfolio: &PortfolioSnapshot,
    haircuts: &H,
) -> crate::Result<Decimal> {
    TradingLimitCalculator::standard(haircuts).compute_limit(account, target, portfolio)
}
