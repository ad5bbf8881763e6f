//! Application configuration loaded from environment variables.
//!
//! - `TRADINGLIMIT_HAIRCUT_PATH` — haircut reference file (required)
//! - `TRADINGLIMIT_HAIRCUT_COLUMN` — `house` (default) or `clearing`
//! - `TRADINGLIMIT_RULES_PATH` — JSON rule table replacing the standard one
//! - `TRADINGLIMIT_ACCOUNT` — account type, defaults to `FREE`
//! - `TRADINGLIMIT_TOLERANCE` — regression tolerance, defaults to `10000`
//! - `TRADINGLIMIT_CASES_PATH` — regression case file
//! - `TRADINGLIMIT_PORTFOLIO_PATH` — single portfolio snapshot
//! - `TRADINGLIMIT_TARGET` — purchase target for the single portfolio

use std::path::PathBuf;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::cases::DEFAULT_TOLERANCE;
use crate::haircut::loader::HaircutColumn;
use crate::risk::AccountType;

/// Top-level application configuration.
#[derive(Debug)]
pub struct AppConfig {
    pub haircut_path: PathBuf,
    pub haircut_column: HaircutColumn,
    pub rules_path: Option<PathBuf>,
    pub account: AccountType,
    pub tolerance: Decimal,
    pub cases_path: Option<PathBuf>,
    pub portfolio: Option<PortfolioRequest>,
}

/// A single limit request read from a portfolio file.
#[derive(Debug)]
pub struct PortfolioRequest {
    pub path: PathBuf,
    pub target: String,
}

/// Loads the application configuration from environment variables.
///
/// # Errors
///
/// Returns [`TradingLimitError::Config`](crate::TradingLimitError::Config)
/// if the haircut path is missing, a value cannot be parsed, or only one of
/// `TRADINGLIMIT_PORTFOLIO_PATH` and `TRADINGLIMIT_TARGET` is set.
pub fn fetch_config() -> crate::Result<AppConfig> {
    let haircut_path = non_empty_var("TRADINGLIMIT_HAIRCUT_PATH")
        .map(PathBuf::from)
        .ok_or_else(|| {
            crate::TradingLimitError::Config("TRADINGLIMIT_HAIRCUT_PATH is not set".to_string())
        })?;

    let haircut_column = non_empty_var("TRADINGLIMIT_HAIRCUT_COLUMN")
        .map(|v| v.parse::<HaircutColumn>())
        .transpose()?
        .unwrap_or_default();

    let account = non_empty_var("TRADINGLIMIT_ACCOUNT")
        .map(|v| v.parse::<AccountType>())
        .transpose()?
        .unwrap_or(AccountType::Free);

    let tolerance = match non_empty_var("TRADINGLIMIT_TOLERANCE") {
        Some(raw) => {
            let value = Decimal::from_str(raw.trim()).map_err(|e| {
                crate::TradingLimitError::Config(format!(
                    "TRADINGLIMIT_TOLERANCE is not a number: {e}"
                ))
            })?;
            if value < Decimal::ZERO {
                return Err(crate::TradingLimitError::Config(
                    "TRADINGLIMIT_TOLERANCE must not be negative".to_string(),
                ));
            }
            value
        }
        None => DEFAULT_TOLERANCE,
    };

    let portfolio = match (
        non_empty_var("TRADINGLIMIT_PORTFOLIO_PATH"),
        non_empty_var("TRADINGLIMIT_TARGET"),
    ) {
        (Some(path), Some(target)) => Some(PortfolioRequest {
            path: PathBuf::from(path),
            target: target.trim().to_ascii_uppercase(),
        }),
        (Some(_), None) => {
            return Err(crate::TradingLimitError::Config(
                "TRADINGLIMIT_PORTFOLIO_PATH is set but TRADINGLIMIT_TARGET is missing"
                    .to_string(),
            ));
        }
        (None, Some(_)) => {
            return Err(crate::TradingLimitError::Config(
                "TRADINGLIMIT_TARGET is set but TRADINGLIMIT_PORTFOLIO_PATH is missing"
                    .to_string(),
            ));
        }
        (None, None) => None,
    };

    Ok(AppConfig {
        haircut_path,
        haircut_column,
        rules_path: non_empty_var("TRADINGLIMIT_RULES_PATH").map(PathBuf::from),
        account,
        tolerance,
        cases_path: non_empty_var("TRADINGLIMIT_CASES_PATH").map(PathBuf::from),
        portfolio,
    })
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    const VARS: [&str; 8] = [
        "TRADINGLIMIT_HAIRCUT_PATH",
        "TRADINGLIMIT_HAIRCUT_COLUMN",
        "TRADINGLIMIT_RULES_PATH",
        "TRADINGLIMIT_ACCOUNT",
        "TRADINGLIMIT_TOLERANCE",
        "TRADINGLIMIT_CASES_PATH",
        "TRADINGLIMIT_PORTFOLIO_PATH",
        "TRADINGLIMIT_TARGET",
    ];

    /// Serializes tests that touch the process environment.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Clears every config variable, applies `vars`, runs `f`, then restores
    /// the originals.
    fn with_env<F: FnOnce()>(vars: &[(&str, &str)], f: F) {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let originals: Vec<(&str, Option<String>)> =
            VARS.iter().map(|k| (*k, std::env::var(k).ok())).collect();

        // SAFETY: every test touching these variables holds ENV_LOCK.
        unsafe {
            for k in VARS {
                std::env::remove_var(k);
            }
            for (k, v) in vars {
                std::env::set_var(k, v);
            }
        }

        f();

        for (k, original) in originals {
            // SAFETY: restoring original values under the same lock.
            unsafe {
                match original {
                    Some(val) => std::env::set_var(k, val),
                    None => std::env::remove_var(k),
                }
            }
        }
    }

    #[test]
    fn defaults_with_only_haircut_path() {
        with_env(&[("TRADINGLIMIT_HAIRCUT_PATH", "haircut.txt")], || {
            let config = fetch_config().unwrap();
            assert_eq!(config.haircut_path, PathBuf::from("haircut.txt"));
            assert_eq!(config.haircut_column, HaircutColumn::House);
            assert_eq!(config.account, AccountType::Free);
            assert_eq!(config.tolerance, DEFAULT_TOLERANCE);
            assert!(config.rules_path.is_none());
            assert!(config.cases_path.is_none());
            assert!(config.portfolio.is_none());
        });
    }

    #[test]
    fn missing_haircut_path_is_an_error() {
        with_env(&[], || {
            let err = fetch_config().unwrap_err();
            assert!(err.to_string().contains("TRADINGLIMIT_HAIRCUT_PATH is not set"));
        });
    }

    #[test]
    fn reads_overrides() {
        with_env(
            &[
                ("TRADINGLIMIT_HAIRCUT_PATH", "haircut.json"),
                ("TRADINGLIMIT_HAIRCUT_COLUMN", "clearing"),
                ("TRADINGLIMIT_ACCOUNT", "online"),
                ("TRADINGLIMIT_TOLERANCE", "1"),
                ("TRADINGLIMIT_CASES_PATH", "cases.json"),
                ("TRADINGLIMIT_PORTFOLIO_PATH", "porto.json"),
                ("TRADINGLIMIT_TARGET", "bbca"),
            ],
            || {
                let config = fetch_config().unwrap();
                assert_eq!(config.haircut_column, HaircutColumn::Clearing);
                assert_eq!(config.account, AccountType::Online);
                assert_eq!(config.tolerance, Decimal::ONE);
                assert_eq!(config.cases_path, Some(PathBuf::from("cases.json")));
                let request = config.portfolio.unwrap();
                assert_eq!(request.target, "BBCA");
            },
        );
    }

    #[test]
    fn rejects_unknown_account() {
        with_env(
            &[
                ("TRADINGLIMIT_HAIRCUT_PATH", "haircut.txt"),
                ("TRADINGLIMIT_ACCOUNT", "cash"),
            ],
            || {
                let err = fetch_config().unwrap_err();
                assert!(err.to_string().contains("unknown account type"));
            },
        );
    }

    #[test]
    fn rejects_negative_tolerance() {
        with_env(
            &[
                ("TRADINGLIMIT_HAIRCUT_PATH", "haircut.txt"),
                ("TRADINGLIMIT_TOLERANCE", "-5"),
            ],
            || {
                assert!(fetch_config().is_err());
            },
        );
    }

    #[test]
    fn rejects_portfolio_without_target() {
        with_env(
            &[
                ("TRADINGLIMIT_HAIRCUT_PATH", "haircut.txt"),
                ("TRADINGLIMIT_PORTFOLIO_PATH", "porto.json"),
            ],
            || {
                let err = fetch_config().unwrap_err();
                assert!(err.to_string().contains("TRADINGLIMIT_TARGET is missing"));
            },
        );
    }

    #[test]
    fn empty_values_treated_as_absent() {
        with_env(
            &[
                ("TRADINGLIMIT_HAIRCUT_PATH", "haircut.txt"),
                ("TRADINGLIMIT_ACCOUNT", ""),
                ("TRADINGLIMIT_TARGET", ""),
            ],
            || {
                let config = fetch_config().unwrap();
                assert_eq!(config.account, AccountType::Free);
                assert!(config.portfolio.is_none());
            },
        );
    }
}
