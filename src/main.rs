use std::process::ExitCode;

use tracing::info;
use tradinglimit::cases::{RegressionSuite, Verdict};
use tradinglimit::config::fetch_config;
use tradinglimit::haircut::loader;
use tradinglimit::{PortfolioSnapshot, RuleTable, TradingLimitCalculator, TradingLimitError};

fn main() -> Result<ExitCode, TradingLimitError> {
    // Initialize tracing subscriber for logging output.
    tracing_subscriber::fmt::init();

    let config = fetch_config()?;

    let rules = match &config.rules_path {
        Some(path) => RuleTable::load(path)?,
        None => RuleTable::default(),
    };
    let haircuts = loader::load(&config.haircut_path, config.haircut_column)?;
    let calculator = TradingLimitCalculator::new(&rules, &haircuts);

    if config.portfolio.is_none() && config.cases_path.is_none() {
        print!("{}", rules.describe());
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(request) = &config.portfolio {
        let json = std::fs::read_to_string(&request.path).map_err(|e| {
            TradingLimitError::Config(format!("failed to read {}: {e}", request.path.display()))
        })?;
        let portfolio = PortfolioSnapshot::from_json(&json)?;
        let breakdown = calculator.explain(config.account, &request.target, &portfolio)?;

        println!(
            "{} {} (class {}): {}",
            breakdown.account, breakdown.target, breakdown.target_class, breakdown.limit
        );
        println!("  cash: {}", breakdown.cash_contribution);
        for holding in &breakdown.holdings {
            println!(
                "  {} (class {}): {}{}",
                holding.code,
                holding.class,
                holding.contribution,
                if holding.capped { " [capped]" } else { "" }
            );
        }
        println!("  effective buy rate: {}", breakdown.effective_buy_rate);
    }

    let mut status = ExitCode::SUCCESS;
    if let Some(path) = &config.cases_path {
        let suite = RegressionSuite::load(path)?;
        info!(cases = suite.len(), account = config.account.as_str(), "Evaluating regression cases");
        let report = suite.evaluate(&calculator, config.account, config.tolerance);

        for outcome in &report.outcomes {
            let detail = match &outcome.verdict {
                Verdict::Within { actual, difference } => format!("ok {actual} (diff {difference})"),
                Verdict::Outside { actual, difference } => {
                    format!("MISMATCH {actual} (diff {difference})")
                }
                Verdict::Error(reason) => format!("ERROR {reason}"),
            };
            println!(
                "{} {}: expected {} -> {detail}",
                outcome.case, outcome.target, outcome.expected
            );
        }
        println!("{}/{} passed", report.passed(), report.outcomes.len());
        if !report.all_passed() {
            status = ExitCode::FAILURE;
        }
    }

    Ok(status)
}
