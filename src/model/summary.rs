//! Aggregation of every category sheet into one financial picture.

use crate::error::LoadError;
use crate::model::confirm::partition;
use crate::model::CategorySheet;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Totals for a single category sheet. Values are read as stored; nothing is re-derived.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CategoryTotals {
    /// Sum of `line_total` over confirmed rows.
    pub confirmed: Decimal,
    /// Sum of `line_total` over all rows.
    pub potential: Decimal,
    /// Sum of `amount_paid` over confirmed rows.
    pub paid: Decimal,
    pub confirmed_items: usize,
    pub pending_items: usize,
}

impl CategoryTotals {
    pub fn of(sheet: &CategorySheet) -> Self {
        let (confirmed, pending) = partition(sheet);
        let mut totals = CategoryTotals {
            confirmed_items: confirmed.len(),
            pending_items: pending.len(),
            ..Default::default()
        };
        for item in confirmed {
            totals.confirmed = totals.confirmed.saturating_add(item.line_total().value());
            totals.paid = totals.paid.saturating_add(item.amount_paid().value());
        }
        totals.potential = sheet
            .items()
            .iter()
            .fold(Decimal::ZERO, |acc, i| acc.saturating_add(i.line_total().value()));
        totals
    }

    /// Sum of line totals over pending rows.
    pub fn pending(&self) -> Decimal {
        self.potential.saturating_sub(self.confirmed)
    }
}

/// One entry of the per-sheet breakdown.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SheetSummary {
    pub name: String,
    #[serde(flatten)]
    pub totals: CategoryTotals,
}

/// A sheet left out of the summary because it could not be loaded.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SkippedSheet {
    pub name: String,
    pub reason: String,
}

/// Spend across all category sheets, measured against the budget ceiling.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Summary {
    pub confirmed_total: Decimal,
    pub paid_total: Decimal,
    pub potential_total: Decimal,
    /// Value of the rows that are not confirmed yet.
    pub outstanding_to_decide: Decimal,
    pub budget_ceiling: Decimal,
    /// Negative when confirmed spend exceeds the ceiling.
    pub budget_remaining: Decimal,
    /// Confirmed spend that has not been paid yet.
    pub left_to_pay: Decimal,
    pub sheets: Vec<SheetSummary>,
    pub skipped: Vec<SkippedSheet>,
}

impl Summary {
    /// Aggregates the raw rows of each sheet. A sheet whose load failed is recorded in `skipped`
    /// and otherwise ignored, so this never fails. The per-sheet breakdown keeps input order.
    pub fn aggregate<N, I>(sheets: I, budget_ceiling: Decimal) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, Result<Vec<Vec<String>>, LoadError>)>,
    {
        let mut normalized = Vec::new();
        let mut skipped = Vec::new();
        for (name, loaded) in sheets {
            let name = name.into();
            match loaded {
                Ok(rows) => normalized.push(CategorySheet::normalize(name, rows)),
                Err(e) => {
                    warn!("Skipping sheet '{name}' in summary: {e}");
                    skipped.push(SkippedSheet {
                        name,
                        reason: e.to_string(),
                    });
                }
            }
        }
        let mut summary = Self::from_sheets(&normalized, budget_ceiling);
        summary.skipped = skipped;
        summary
    }

    /// Aggregates sheets that are already normalized.
    pub fn from_sheets<'a, I>(sheets: I, budget_ceiling: Decimal) -> Self
    where
        I: IntoIterator<Item = &'a CategorySheet>,
    {
        let mut summary = Summary {
            budget_ceiling,
            ..Default::default()
        };
        for sheet in sheets {
            let totals = CategoryTotals::of(sheet);
            summary.confirmed_total = summary.confirmed_total.saturating_add(totals.confirmed);
            summary.paid_total = summary.paid_total.saturating_add(totals.paid);
            summary.potential_total = summary.potential_total.saturating_add(totals.potential);
            summary.sheets.push(SheetSummary {
                name: sheet.name().to_string(),
                totals,
            });
        }
        summary.outstanding_to_decide = summary.potential_total.saturating_sub(summary.confirmed_total);
        summary.budget_remaining = budget_ceiling.saturating_sub(summary.confirmed_total);
        summary.left_to_pay = summary.confirmed_total.saturating_sub(summary.paid_total);
        debug!(
            "Summary over {} sheets: confirmed {}, potential {}",
            summary.sheets.len(),
            summary.confirmed_total,
            summary.potential_total
        );
        summary
    }

    pub fn is_over_budget(&self) -> bool {
        self.budget_remaining.is_sign_negative() && !self.budget_remaining.is_zero()
    }

    pub fn sheet(&self, name: &str) -> Option<&SheetSummary> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DEFAULT_BUDGET_CEILING;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn sheet_a() -> Vec<Vec<String>> {
        rows(&[
            &["Oggetto", "Importo Totale", "Acquista S/N", "Importo Pagato"],
            &["Letto", "100", "S", "100"],
            &["Comodino", "50", "S", "20"],
            &["Specchio", "75", "N", "0"],
        ])
    }

    fn sheet_b() -> Vec<Vec<String>> {
        rows(&[
            &["Articolo", "Totale", "S/N"],
            &["Divano", "200", "s"],
        ])
    }

    #[test]
    fn test_two_sheets() {
        let summary = Summary::aggregate(
            vec![("camera", Ok(sheet_a())), ("salotto", Ok(sheet_b()))],
            DEFAULT_BUDGET_CEILING,
        );
        assert_eq!(summary.confirmed_total, dec("350"));
        assert_eq!(summary.potential_total, dec("425"));
        assert_eq!(summary.outstanding_to_decide, dec("75"));
        assert_eq!(summary.paid_total, dec("120"));
        assert_eq!(summary.left_to_pay, dec("230"));
        assert_eq!(summary.budget_remaining, dec("14650"));
        assert!(summary.skipped.is_empty());

        let camera = summary.sheet("camera").unwrap();
        assert_eq!(camera.totals.confirmed, dec("150"));
        assert_eq!(camera.totals.potential, dec("225"));
        assert_eq!(camera.totals.pending(), dec("75"));
        assert_eq!(camera.totals.confirmed_items, 2);
        assert_eq!(camera.totals.pending_items, 1);
    }

    #[test]
    fn test_confirmed_total_is_sum_of_subtotals() {
        let summary = Summary::aggregate(
            vec![
                ("camera", Ok(sheet_a())),
                ("salotto", Ok(sheet_b())),
                ("vuoto", Ok(Vec::new())),
            ],
            DEFAULT_BUDGET_CEILING,
        );
        let confirmed: Decimal = summary.sheets.iter().map(|s| s.totals.confirmed).sum();
        let potential: Decimal = summary.sheets.iter().map(|s| s.totals.potential).sum();
        assert_eq!(summary.confirmed_total, confirmed);
        assert_eq!(summary.potential_total, potential);
        let names: Vec<&str> = summary.sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["camera", "salotto", "vuoto"]);
    }

    #[test]
    fn test_failed_sheet_is_skipped() {
        let summary = Summary::aggregate(
            vec![
                ("camera", Ok(sheet_a())),
                (
                    "cucina",
                    Err(LoadError::Missing {
                        sheet: "cucina".to_string(),
                    }),
                ),
                ("salotto", Ok(sheet_b())),
            ],
            DEFAULT_BUDGET_CEILING,
        );
        assert_eq!(summary.confirmed_total, dec("350"));
        assert_eq!(summary.sheets.len(), 2);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.skipped[0].name, "cucina");
        assert!(summary.skipped[0].reason.contains("not found"));
    }

    #[test]
    fn test_overspend_is_reported_not_rejected() {
        let summary = Summary::aggregate(vec![("camera", Ok(sheet_a()))], dec("100"));
        assert_eq!(summary.budget_remaining, dec("-50"));
        assert!(summary.is_over_budget());
    }

    #[test]
    fn test_uses_stored_totals() {
        // Not recalculated: list price and quantity disagree with the stored total.
        let stale = rows(&[
            &["Oggetto", "Prezzo Listino", "Quantità", "Importo Totale", "Acquista S/N"],
            &["Lavello", "300", "2", "10", "S"],
        ]);
        let summary = Summary::aggregate(vec![("cucina", Ok(stale))], DEFAULT_BUDGET_CEILING);
        assert_eq!(summary.confirmed_total, dec("10"));
    }
}
