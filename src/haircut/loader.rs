//! Haircut reference file parsing.
//!
//! Two formats are accepted:
//! - the broker's semicolon-separated haircut export, one stock per row:
//!   `  12.;BBCA; 5.00 %; 10.00 %;` (row number, code, clearing-house
//!   haircut, house haircut). Header and footer lines are ignored.
//! - a JSON object mapping stock code to haircut percentage.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use rust_decimal::Decimal;

use super::HaircutTable;
use crate::TradingLimitError;

/// Which haircut column of the broker export to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HaircutColumn {
    /// Haircut published by the clearing house.
    Clearing,
    /// The broker's own haircut, applied to its clients.
    #[default]
    House,
}

impl FromStr for HaircutColumn {
    type Err = TradingLimitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clearing" | "kpei" => Ok(HaircutColumn::Clearing),
            "house" => Ok(HaircutColumn::House),
            other => Err(TradingLimitError::Config(format!(
                "unknown haircut column: {other}"
            ))),
        }
    }
}

/// Loads a haircut table from `path`, choosing the format by extension
/// (`.json` for a JSON map, anything else for the broker export).
///
/// # Errors
///
/// Returns [`TradingLimitError::Config`] if the file cannot be read and
/// [`TradingLimitError::InvalidHaircutTable`] or
/// [`TradingLimitError::Json`] if its content is malformed.
pub fn load(path: &Path, column: HaircutColumn) -> crate::Result<HaircutTable> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        TradingLimitError::Config(format!("failed to read {}: {e}", path.display()))
    })?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let table = if is_json {
        parse_json(&contents)?
    } else {
        parse_export(&contents, column)?
    };
    tracing::info!(path = %path.display(), entries = table.len(), "Loaded haircut table");
    Ok(table)
}

/// Parses a JSON object of `code -> percent`.
///
/// # Errors
///
/// Returns an error on malformed JSON or an invalid entry.
pub fn parse_json(contents: &str) -> crate::Result<HaircutTable> {
    let raw: HashMap<String, Decimal> = serde_json::from_str(contents)?;
    HaircutTable::from_entries(raw)
}

/// Parses the broker's semicolon-separated haircut export.
///
/// # Errors
///
/// Returns [`TradingLimitError::InvalidHaircutTable`] naming the line of the
/// first data row that cannot be parsed, or if no data rows are found.
pub fn parse_export(contents: &str, column: HaircutColumn) -> crate::Result<HaircutTable> {
    let mut entries = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        let fields: Vec<&str> = line.split(';').collect();
        if fields.len() < 4 || !is_row_number(fields[0]) {
            continue;
        }
        let raw = match column {
            HaircutColumn::Clearing => fields[2],
            HaircutColumn::House => fields[3],
        };
        let percent = parse_percent(raw).ok_or_else(|| {
            TradingLimitError::InvalidHaircutTable(format!(
                "line {}: cannot parse haircut {:?}",
                index + 1,
                raw.trim()
            ))
        })?;
        entries.push((fields[1].trim(), percent));
    }
    if entries.is_empty() {
        return Err(TradingLimitError::InvalidHaircutTable(
            "no haircut rows found".to_string(),
        ));
    }
    HaircutTable::from_entries(entries)
}

/// Matches the leading `"  12."` row counter of a data row.
fn is_row_number(field: &str) -> bool {
    field
        .trim()
        .strip_suffix('.')
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

/// Parses `" 25.00 %"` into `25.00`.
fn parse_percent(field: &str) -> Option<Decimal> {
    let number = field.trim().strip_suffix('%')?.trim();
    Decimal::from_str(number).ok()
}
