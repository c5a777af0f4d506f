//! The registry of semantic columns a room sheet may carry and the header names each one goes by.

use crate::model::mapping::{ColumnRef, ColumnResolver, Mapping};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A semantic column of a room sheet. Real sheets name these inconsistently; `synonyms` lists the
/// names each field is known by, in priority order.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Description,
    ListPrice,
    DiscountPercent,
    Quantity,
    UnitCost,
    LineTotal,
    Confirmed,
    PaymentStatus,
    AmountPaid,
    DueDate,
    InvoiceLink,
    Notes,
}

serde_plain::derive_display_from_serialize!(Field);
serde_plain::derive_fromstr_from_deserialize!(Field);

/// How the cells of a field are coerced during normalization.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FieldKind {
    /// Parsed as a decimal; anything unparsable is zero.
    Numeric,
    /// Trimmed; placeholder tokens become empty.
    Text,
    /// Like `Text`, then uppercased.
    Flag,
}

impl Field {
    pub const ALL: [Field; 12] = [
        Field::Description,
        Field::ListPrice,
        Field::DiscountPercent,
        Field::Quantity,
        Field::UnitCost,
        Field::LineTotal,
        Field::Confirmed,
        Field::PaymentStatus,
        Field::AmountPaid,
        Field::DueDate,
        Field::InvoiceLink,
        Field::Notes,
    ];

    /// Known header names for this field, highest priority first.
    pub fn synonyms(self) -> &'static [&'static str] {
        match self {
            Field::Description => DESCRIPTION,
            Field::ListPrice => LIST_PRICE,
            Field::DiscountPercent => DISCOUNT_PERCENT,
            Field::Quantity => QUANTITY,
            Field::UnitCost => UNIT_COST,
            Field::LineTotal => LINE_TOTAL,
            Field::Confirmed => CONFIRMED,
            Field::PaymentStatus => PAYMENT_STATUS,
            Field::AmountPaid => AMOUNT_PAID,
            Field::DueDate => DUE_DATE,
            Field::InvoiceLink => INVOICE_LINK,
            Field::Notes => NOTES,
        }
    }

    /// The header used when this column has to be added to a sheet.
    pub fn canonical_header(self) -> &'static str {
        self.synonyms()[0]
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Field::ListPrice
            | Field::DiscountPercent
            | Field::Quantity
            | Field::UnitCost
            | Field::LineTotal
            | Field::AmountPaid => FieldKind::Numeric,
            Field::Confirmed => FieldKind::Flag,
            Field::Description
            | Field::PaymentStatus
            | Field::DueDate
            | Field::InvoiceLink
            | Field::Notes => FieldKind::Text,
        }
    }

    /// Fields the engine computes on save.
    pub fn is_derived(self) -> bool {
        matches!(self, Field::UnitCost | Field::LineTotal | Field::AmountPaid)
    }
}

pub(super) const DESCRIPTION: &[&str] = &["Oggetto", "Articolo", "Descrizione", "Nome"];
pub(super) const LIST_PRICE: &[&str] = &["Prezzo Listino", "Prezzo di Listino", "Listino"];
pub(super) const DISCOUNT_PERCENT: &[&str] = &["Sconto %", "Sconto", "Sconto (%)"];
pub(super) const QUANTITY: &[&str] = &["Quantità", "Quantita", "Qtà", "Qta", "Pezzi"];
pub(super) const UNIT_COST: &[&str] = &["Costo Unitario", "Prezzo Unitario"];
pub(super) const LINE_TOTAL: &[&str] = &["Importo Totale", "Totale", "Prezzo", "Costo"];
pub(super) const CONFIRMED: &[&str] = &["Acquista S/N", "S/N", "Scelta", "Acquistato"];
pub(super) const PAYMENT_STATUS: &[&str] = &["Stato Pagamento", "Stato", "Pagamento"];
pub(super) const AMOUNT_PAID: &[&str] = &["Importo Pagato", "Pagato", "Versato"];
pub(super) const DUE_DATE: &[&str] = &["Scadenza", "Data Scadenza", "Data Pagamento"];
pub(super) const INVOICE_LINK: &[&str] = &["Link Fattura", "Fattura", "Link"];
pub(super) const NOTES: &[&str] = &["Note", "Annotazioni"];

/// The outcome of resolving every `Field` against one sheet's headers.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Columns(BTreeMap<Field, ColumnRef>);

impl Columns {
    pub fn resolve(mapping: &Mapping) -> Self {
        let resolver = ColumnResolver::new(mapping);
        let map = Field::ALL
            .iter()
            .filter_map(|&field| resolver.resolve(field.synonyms()).map(|c| (field, c)))
            .collect();
        Self(map)
    }

    pub fn get(&self, field: Field) -> Option<&ColumnRef> {
        self.0.get(&field)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    /// The field stored at column `index`, if any.
    pub fn field_at(&self, index: usize) -> Option<Field> {
        self.0
            .iter()
            .find(|(_, c)| c.index() == index)
            .map(|(&f, _)| f)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &ColumnRef)> {
        self.0.iter().map(|(&f, c)| (f, c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::str::FromStr;

    #[test]
    fn test_derived_fields_are_numeric() {
        let derived: Vec<Field> = Field::ALL.into_iter().filter(|f| f.is_derived()).collect();
        assert_eq!(
            derived,
            vec![Field::UnitCost, Field::LineTotal, Field::AmountPaid]
        );
        assert!(derived.iter().all(|f| f.kind() == FieldKind::Numeric));
    }

    #[test]
    fn test_synonym_sets_are_disjoint() {
        let mut seen = HashSet::new();
        for field in Field::ALL {
            for name in field.synonyms() {
                assert!(
                    seen.insert(name.to_lowercase()),
                    "'{name}' is listed for more than one field"
                );
            }
        }
    }

    #[test]
    fn test_field_display_and_parse() {
        assert_eq!(Field::LineTotal.to_string(), "line_total");
        assert_eq!(Field::from_str("amount_paid").unwrap(), Field::AmountPaid);
    }

    #[test]
    fn test_columns_resolve_real_headers() {
        let mapping = Mapping::new(vec![
            "Articolo",
            " Costo ",
            "S/N",
            "Link",
            "Colore",
        ]);
        let columns = Columns::resolve(&mapping);
        assert_eq!(columns.get(Field::Description).unwrap().index(), 0);
        assert_eq!(columns.get(Field::LineTotal).unwrap().index(), 1);
        assert_eq!(columns.get(Field::Confirmed).unwrap().index(), 2);
        assert_eq!(columns.get(Field::InvoiceLink).unwrap().index(), 3);
        assert!(columns.get(Field::Quantity).is_none());
        assert_eq!(columns.field_at(1), Some(Field::LineTotal));
        assert_eq!(columns.field_at(4), None);
    }

    #[test]
    fn test_price_priority() {
        let mapping = Mapping::new(vec!["Costo", "Importo Totale"]);
        let columns = Columns::resolve(&mapping);
        assert_eq!(
            columns.get(Field::LineTotal).unwrap().header().as_ref(),
            "Importo Totale"
        );
    }
}
