//! Reading the budget ceiling out of the settings sheet.

use crate::model::{Amount, Mapping};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::debug;

/// The budget ceiling used when neither the settings sheet nor the configuration provides one.
pub const DEFAULT_BUDGET_CEILING: Decimal = Decimal::from_parts(15000, 0, 0, false, 0);

/// Labels that name the budget ceiling, either as the first cell of a row or as a column header.
pub const BUDGET_LABELS: &[&str] = &["Budget", "Budget Totale", "Tetto di Spesa", "Budget Massimo"];

/// Finds the budget ceiling in the raw rows of the settings sheet.
///
/// The first row labelled with one of `BUDGET_LABELS` wins; its value is the first number to the
/// right of the label. Failing that, the first number under a column headed by one of the labels
/// is used. Anything else (no sheet, no label, no number, a value that is not positive) gives
/// `fallback`.
pub fn budget_ceiling(rows: &[Vec<String>], fallback: Decimal) -> Decimal {
    match from_labelled_row(rows).or_else(|| from_labelled_column(rows)) {
        Some(value) if value.is_sign_positive() && !value.is_zero() => value,
        Some(value) => {
            debug!("Ignoring budget ceiling {value}, using {fallback}");
            fallback
        }
        None => {
            debug!("No budget ceiling in settings, using {fallback}");
            fallback
        }
    }
}

fn is_label(cell: &str) -> bool {
    let cell = cell.trim();
    BUDGET_LABELS.iter().any(|l| l.eq_ignore_ascii_case(cell))
}

fn number(cell: &str) -> Option<Decimal> {
    if cell.trim().is_empty() {
        return None;
    }
    Amount::from_str(cell).ok().map(|a| a.value())
}

fn from_labelled_row(rows: &[Vec<String>]) -> Option<Decimal> {
    rows.iter()
        .filter(|r| r.first().is_some_and(|c| is_label(c)))
        .find_map(|r| r[1..].iter().find_map(|c| number(c)))
}

fn from_labelled_column(rows: &[Vec<String>]) -> Option<Decimal> {
    let (header, body) = rows.split_first()?;
    let mapping = Mapping::new(header.iter().map(String::as_str));
    let col = BUDGET_LABELS.iter().find_map(|l| mapping.header_index(l))?;
    body.iter().find_map(|r| r.get(col).and_then(|c| number(c)))
}
