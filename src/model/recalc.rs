//! Derivation of the computed columns of a line item: unit cost, line total and amount paid.
//!
//! These run on the save path only. Reading a sheet never re-derives anything; the summary uses
//! whatever totals are stored.

use crate::model::amount::to_cents;
use crate::model::sheet::{CategorySheet, PricingBasis};
use crate::model::{Amount, Field, LineItem, PaymentStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// A row whose derived values could not be computed. The row is left as it was.
#[derive(Debug, Clone, Copy, Error, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecalcError {
    #[error("arithmetic overflow while computing {0}")]
    Overflow(Field),
}

/// Recomputes `unit_cost`, `line_total` and `amount_paid` of one row, in that order.
///
/// - With a positive list price, `unit_cost = list_price × (1 - discount/100)`. Otherwise the
///   stored `unit_cost` is kept, which is how a manual cost is entered.
/// - `line_total = unit_cost × quantity`.
/// - `amount_paid` is reconciled against the new `line_total` (see [`reconcile_payment`]).
///
/// Money is rounded to cents, midpoint away from zero. On error nothing is modified.
pub fn recalculate(item: &mut LineItem) -> Result<(), RecalcError> {
    let unit_cost = if item.list_price.is_positive() {
        let rate = item
            .discount_percent
            .checked_div(Decimal::ONE_HUNDRED)
            .and_then(|d| Decimal::ONE.checked_sub(d))
            .ok_or(RecalcError::Overflow(Field::DiscountPercent))?;
        let value = item
            .list_price
            .value()
            .checked_mul(rate)
            .ok_or(RecalcError::Overflow(Field::UnitCost))?;
        item.unit_cost.with_value(value)
    } else {
        item.unit_cost
    };

    let total = unit_cost
        .value()
        .checked_mul(item.quantity)
        .ok_or(RecalcError::Overflow(Field::LineTotal))?;
    let line_total = item.line_total.with_value(to_cents(total));
    let amount_paid = reconciled(&item.payment_status, line_total, item.amount_paid);

    item.unit_cost = unit_cost;
    item.line_total = line_total;
    item.amount_paid = amount_paid;
    Ok(())
}

/// Derives `amount_paid` from the payment status and the current `line_total`:
///
/// - `Saldato`: paid in full, `amount_paid = line_total`.
/// - unset: nothing committed, `amount_paid = 0`.
/// - anything else: the user tracks the paid amount by hand, so it is left alone.
pub fn reconcile_payment(item: &mut LineItem) {
    item.amount_paid = reconciled(&item.payment_status, item.line_total, item.amount_paid);
}

fn reconciled(status: &PaymentStatus, line_total: Amount, paid: Amount) -> Amount {
    match status {
        PaymentStatus::Saldato => paid.with_value(line_total.value()),
        PaymentStatus::Unset => paid.with_value(Decimal::ZERO),
        PaymentStatus::Acconto
        | PaymentStatus::Ordinato
        | PaymentStatus::Preventivo
        | PaymentStatus::Other(_) => paid,
    }
}

/// A row that was skipped during a sheet recalculation.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RowFailure {
    /// The 1-based row number in the sheet, counting the header row.
    pub row: usize,
    pub description: String,
    pub error: RecalcError,
}

/// The outcome of recalculating a whole sheet.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct RecalcReport {
    pub basis: PricingBasis,
    pub recalculated: usize,
    pub failed: Vec<RowFailure>,
}

impl CategorySheet {
    /// Recalculates every row. Sheets without a quantity column only get payment reconciliation,
    /// so that totals entered by hand are not zeroed. A row that fails is reported and left
    /// untouched; the others are still processed.
    pub fn recalculate(&mut self) -> RecalcReport {
        let basis = self.pricing_basis();
        let name = self.name().to_string();
        let mut recalculated = 0;
        let mut failed = Vec::new();

        for (ix, item) in self.items_mut().iter_mut().enumerate() {
            let result = match basis {
                PricingBasis::Derived => recalculate(item),
                PricingBasis::TotalOnly => {
                    reconcile_payment(item);
                    Ok(())
                }
            };
            match result {
                Ok(()) => recalculated += 1,
                Err(error) => {
                    warn!("Sheet '{name}' row {}: {error}, row left unchanged", ix + 2);
                    failed.push(RowFailure {
                        row: ix + 2,
                        description: item.description().to_string(),
                        error,
                    });
                }
            }
        }

        debug!("Recalculated sheet '{name}' ({basis}): {recalculated} ok, {} failed", failed.len());
        RecalcReport {
            basis,
            recalculated,
            failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SaveOptions;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn item(fields: &[(Field, &str)]) -> LineItem {
        let mut item = LineItem::default();
        for (field, value) in fields {
            item.set_field(*field, value);
        }
        item
    }

    fn assert_invariants(item: &LineItem) {
        let expected = item.unit_cost().value() * item.quantity();
        let diff = (item.line_total().value() - expected).abs();
        assert!(diff <= dec("0.01"), "{item:?}");
        match item.payment_status() {
            PaymentStatus::Saldato => assert_eq!(item.amount_paid().value(), item.line_total().value()),
            PaymentStatus::Unset => assert!(item.amount_paid().is_zero()),
            _ => {}
        }
    }

    #[test]
    fn test_list_price_with_discount() {
        let mut row = item(&[
            (Field::ListPrice, "100"),
            (Field::DiscountPercent, "10"),
            (Field::Quantity, "2"),
        ]);
        recalculate(&mut row).unwrap();
        assert_eq!(row.unit_cost().value(), dec("90"));
        assert_eq!(row.line_total().value(), dec("180"));
        assert_invariants(&row);
    }

    #[test]
    fn test_manual_unit_cost_without_list_price() {
        let mut row = item(&[
            (Field::ListPrice, "0"),
            (Field::UnitCost, "50"),
            (Field::Quantity, "3"),
        ]);
        recalculate(&mut row).unwrap();
        assert_eq!(row.unit_cost().value(), dec("50"));
        assert_eq!(row.line_total().value(), dec("150"));
    }

    #[test]
    fn test_reconcile_saldato() {
        let mut row = item(&[(Field::LineTotal, "180"), (Field::PaymentStatus, "Saldato")]);
        reconcile_payment(&mut row);
        assert_eq!(row.amount_paid().value(), dec("180"));
    }

    #[test]
    fn test_reconcile_unset() {
        let mut row = item(&[
            (Field::LineTotal, "180"),
            (Field::PaymentStatus, ""),
            (Field::AmountPaid, "40"),
        ]);
        reconcile_payment(&mut row);
        assert!(row.amount_paid().is_zero());

        let mut row = item(&[(Field::AmountPaid, "40"), (Field::PaymentStatus, "nan")]);
        reconcile_payment(&mut row);
        assert!(row.amount_paid().is_zero());
    }

    #[test]
    fn test_reconcile_keeps_manual_amounts() {
        for status in ["Acconto", "Ordinato", "Preventivo", "Annullato"] {
            let mut row = item(&[
                (Field::LineTotal, "180"),
                (Field::PaymentStatus, status),
                (Field::AmountPaid, "60"),
            ]);
            reconcile_payment(&mut row);
            assert_eq!(row.amount_paid().value(), dec("60"), "{status}");
        }
    }

    #[test]
    fn test_saldato_follows_new_line_total() {
        let mut row = item(&[
            (Field::ListPrice, "100"),
            (Field::Quantity, "2"),
            (Field::LineTotal, "999"),
            (Field::PaymentStatus, "Saldato"),
            (Field::AmountPaid, "999"),
        ]);
        recalculate(&mut row).unwrap();
        assert_eq!(row.amount_paid().value(), dec("200"));
        assert_invariants(&row);
    }

    #[test]
    fn test_fractional_quantity_and_rounding() {
        let mut row = item(&[
            (Field::ListPrice, "19.99"),
            (Field::DiscountPercent, "15"),
            (Field::Quantity, "2,5"),
        ]);
        recalculate(&mut row).unwrap();
        // 19.99 × 0.85 = 16.9915 -> 16.99; × 2.5 = 42.475 -> 42.48
        assert_eq!(row.unit_cost().value(), dec("16.99"));
        assert_eq!(row.line_total().value(), dec("42.48"));
        assert_invariants(&row);
    }

    #[test]
    fn test_keeps_cell_formatting() {
        let mut row = item(&[
            (Field::ListPrice, "€1.000,00"),
            (Field::Quantity, "2"),
            (Field::LineTotal, "€0,00"),
        ]);
        recalculate(&mut row).unwrap();
        assert_eq!(row.get_field(Field::LineTotal), "€2000.00");
        assert_eq!(row.get_field(Field::UnitCost), "1000.00");
    }

    #[test]
    fn test_overflow_leaves_row_untouched() {
        let mut row = item(&[
            (Field::ListPrice, "100"),
            (Field::LineTotal, "5"),
            (Field::PaymentStatus, "Saldato"),
        ]);
        row.quantity = Decimal::MAX;
        let before = row.clone();
        let err = recalculate(&mut row).unwrap_err();
        assert_eq!(err, RecalcError::Overflow(Field::LineTotal));
        assert_eq!(row, before);
    }

    #[test]
    fn test_sheet_recalculate_isolates_failures() {
        let mut sheet = CategorySheet::normalize(
            "cucina",
            vec![
                vec!["Oggetto", "Prezzo Listino", "Quantità", "Stato Pagamento", "Importo Totale"],
                vec!["Forno", "500", "1", "Saldato", ""],
                vec!["Piano", "100", "1", "", ""],
                vec!["Sedie", "80", "4", "", ""],
            ],
        );
        sheet.items_mut()[1].quantity = Decimal::MAX;
        let report = sheet.recalculate();
        assert_eq!(report.basis, PricingBasis::Derived);
        assert_eq!(report.recalculated, 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].row, 3);
        assert_eq!(report.failed[0].description, "Piano");

        let items = sheet.items();
        assert_eq!(items[0].amount_paid().value(), dec("500"));
        assert_eq!(items[2].line_total().value(), dec("320"));
        assert!(items[1].line_total().is_zero());
    }

    #[test]
    fn test_total_only_sheet_keeps_entered_totals() {
        let mut sheet = CategorySheet::normalize(
            "camera",
            vec![
                vec!["Articolo", "Costo", "S/N", "Stato", "Pagato"],
                vec!["Letto", "800", "S", "Saldato", "0"],
                vec!["Comodino", "120", "S", "Acconto", "50"],
                vec!["Lampada", "40", "N", "", "10"],
            ],
        );
        let report = sheet.recalculate();
        assert_eq!(report.basis, PricingBasis::TotalOnly);
        let items = sheet.items();
        assert_eq!(items[0].line_total().value(), dec("800"));
        assert_eq!(items[0].amount_paid().value(), dec("800"));
        assert_eq!(items[1].amount_paid().value(), dec("50"));
        assert!(items[2].amount_paid().is_zero());
    }

    #[test]
    fn test_recalculate_then_normalize_is_stable() {
        let mut sheet = CategorySheet::normalize(
            "tavolo",
            vec![
                vec!["Oggetto", "Prezzo Listino", "Sconto %", "Qta", "Acquista S/N"],
                vec!["Tavolo", "1.250,00", "12,5", "1", "S"],
                vec!["Sedia", "149.90", "", "6", "s"],
            ],
        );
        sheet.recalculate();
        let rows = sheet.to_rows(SaveOptions::new(true));
        let reloaded = CategorySheet::normalize("tavolo", rows);
        for item in reloaded.items() {
            assert_invariants(item);
        }
        assert_eq!(reloaded.items()[0].line_total().value(), dec("1093.75"));
        assert_eq!(reloaded.items()[1].line_total().value(), dec("899.40"));
    }
}
