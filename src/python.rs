//! PyO3 Python module exposing the limit calculator to Python scripts.
//!
//! Haircut tables and portfolios cross the boundary as plain Python data:
//! a `dict[str, Decimal]` of haircut percentages and a portfolio dict shaped
//! like `{"CASHT2": cash, "BBCA": {"lot": 100, "price": 2430}}`.

use std::collections::HashMap;

use pyo3::exceptions::{PyKeyError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use rust_decimal::Decimal;

use crate::portfolio::{CASH_KEY, RawEntry, RawPortfolio};
use crate::risk::{AccountType, RiskClass};
use crate::{HaircutTable, PortfolioSnapshot, TradingLimitError};

fn to_py_err(err: TradingLimitError) -> PyErr {
    match err {
        TradingLimitError::UnknownStock(code) => PyKeyError::new_err(code),
        other => PyValueError::new_err(other.to_string()),
    }
}

/// Reads a portfolio dict into a validated snapshot.
fn extract_portfolio(portfolio: &Bound<'_, PyDict>) -> PyResult<PortfolioSnapshot> {
    let mut raw = RawPortfolio::default();
    for (key, value) in portfolio.iter() {
        let key: String = key.extract()?;
        let entry = if key == CASH_KEY {
            RawEntry::Cash(value.extract()?)
        } else {
            RawEntry::Holding {
                lot: value.get_item("lot")?.extract()?,
                price: value.get_item("price")?.extract()?,
            }
        };
        raw.entries.push((key, entry));
    }
    raw.validate().map_err(to_py_err)
}

/// Computes the trading limit for buying `target` with the standard rules.
#[pyfunction]
fn compute_limit(
    account: AccountType,
    target: &str,
    portfolio: &Bound<'_, PyDict>,
    haircuts: HashMap<String, Decimal>,
) -> PyResult<Decimal> {
    let table = HaircutTable::from_entries(haircuts).map_err(to_py_err)?;
    let portfolio = extract_portfolio(portfolio)?;
    crate::compute_limit(account, target, &portfolio, &table).map_err(to_py_err)
}

/// Returns the risk class of a haircut percentage.
#[pyfunction]
fn classify_percent(percent: Decimal) -> PyResult<RiskClass> {
    crate::classify_percent(percent).map_err(to_py_err)
}

#[pymodule]
fn tradinglimit(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<AccountType>()?;
    m.add_class::<RiskClass>()?;
    m.add_function(wrap_pyfunction!(compute_limit, m)?)?;
    m.add_function(wrap_pyfunction!(classify_percent, m)?)?;
    Ok(())
}
