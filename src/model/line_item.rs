use crate::model::amount::{format_decimal, parse_decimal};
use crate::model::{Amount, Field, FieldKind};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Tokens that upstream exports write into cells that were really empty.
const PLACEHOLDERS: &[&str] = &["none", "nan", "<na>", "undefined", "null"];

/// Value of the confirmation flag when the sheet has no flag column.
pub(crate) const FLAG_DEFAULT: &str = "N";

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d/%m/%y", "%d-%m-%Y", "%d.%m.%Y"];

/// One purchase in a room sheet.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LineItem {
    pub(crate) description: String,
    pub(crate) list_price: Amount,
    pub(crate) discount_percent: Decimal,
    pub(crate) quantity: Decimal,
    pub(crate) unit_cost: Amount,
    pub(crate) line_total: Amount,
    pub(crate) confirmed: String,
    pub(crate) payment_status: PaymentStatus,
    pub(crate) amount_paid: Amount,
    pub(crate) due_date: String,
    pub(crate) invoice_link: String,
    pub(crate) notes: String,
    /// Cells of columns that are not one of the known fields, keyed by column index, so that a
    /// write-back reproduces them.
    pub(crate) other_fields: BTreeMap<usize, String>,
}

impl Default for LineItem {
    fn default() -> Self {
        Self {
            description: String::new(),
            list_price: Amount::default(),
            discount_percent: Decimal::ZERO,
            quantity: Decimal::ZERO,
            unit_cost: Amount::default(),
            line_total: Amount::default(),
            confirmed: FLAG_DEFAULT.to_string(),
            payment_status: PaymentStatus::Unset,
            amount_paid: Amount::default(),
            due_date: String::new(),
            invoice_link: String::new(),
            notes: String::new(),
            other_fields: BTreeMap::new(),
        }
    }
}

impl LineItem {
    /// Sets `field` from a raw cell, coercing it the way the field's kind requires. Never fails.
    pub fn set_field(&mut self, field: Field, value: &str) {
        let text = match field.kind() {
            FieldKind::Numeric => String::new(),
            FieldKind::Text => clean_text(value),
            FieldKind::Flag => clean_text(value).to_uppercase(),
        };
        match field {
            Field::Description => self.description = text,
            Field::ListPrice => self.list_price = Amount::parse_lenient(value),
            Field::DiscountPercent => self.discount_percent = parse_decimal(value),
            Field::Quantity => self.quantity = parse_decimal(value),
            Field::UnitCost => self.unit_cost = Amount::parse_lenient(value),
            Field::LineTotal => self.line_total = Amount::parse_lenient(value),
            Field::Confirmed => self.confirmed = text,
            Field::PaymentStatus => self.payment_status = PaymentStatus::parse(&text),
            Field::AmountPaid => self.amount_paid = Amount::parse_lenient(value),
            Field::DueDate => self.due_date = text,
            Field::InvoiceLink => self.invoice_link = text,
            Field::Notes => self.notes = text,
        }
    }

    /// Renders `field` as the text written back to the sheet.
    pub fn get_field(&self, field: Field) -> String {
        match field {
            Field::Description => self.description.clone(),
            Field::ListPrice => self.list_price.to_string(),
            Field::DiscountPercent => format_decimal(self.discount_percent),
            Field::Quantity => format_decimal(self.quantity),
            Field::UnitCost => self.unit_cost.to_string(),
            Field::LineTotal => self.line_total.to_string(),
            Field::Confirmed => self.confirmed.clone(),
            Field::PaymentStatus => self.payment_status.to_string(),
            Field::AmountPaid => self.amount_paid.to_string(),
            Field::DueDate => self.due_date.clone(),
            Field::InvoiceLink => self.invoice_link.clone(),
            Field::Notes => self.notes.clone(),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn list_price(&self) -> Amount {
        self.list_price
    }

    pub fn discount_percent(&self) -> Decimal {
        self.discount_percent
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn unit_cost(&self) -> Amount {
        self.unit_cost
    }

    pub fn line_total(&self) -> Amount {
        self.line_total
    }

    /// The normalized (trimmed, uppercased) confirmation flag.
    pub fn flag(&self) -> &str {
        &self.confirmed
    }

    pub fn payment_status(&self) -> &PaymentStatus {
        &self.payment_status
    }

    pub fn amount_paid(&self) -> Amount {
        self.amount_paid
    }

    pub fn invoice_link(&self) -> Option<&str> {
        non_empty(&self.invoice_link)
    }

    pub fn notes(&self) -> Option<&str> {
        non_empty(&self.notes)
    }

    /// The due date as typed in the sheet.
    pub fn due_date_text(&self) -> Option<&str> {
        non_empty(&self.due_date)
    }

    /// The due date, if the cell holds one in a recognized format.
    pub fn due_date(&self) -> Option<NaiveDate> {
        let text = self.due_date_text()?;
        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
    }

    /// True when the row carries nothing the user typed.
    pub fn is_blank(&self) -> bool {
        self == &LineItem::default()
    }
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Trims `value` and maps serialization placeholders (`None`, `nan`, ...) to the empty string.
pub(crate) fn clean_text(value: &str) -> String {
    let trimmed = value.trim();
    if PLACEHOLDERS
        .iter()
        .any(|p| trimmed.eq_ignore_ascii_case(p))
    {
        String::new()
    } else {
        trimmed.to_string()
    }
}

/// Where a purchase stands with respect to payment.
#[derive(Default, Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum PaymentStatus {
    /// Nothing committed yet.
    #[default]
    Unset,
    /// A deposit has been paid.
    Acconto,
    /// Paid in full.
    Saldato,
    /// Ordered, payment tracked by hand.
    Ordinato,
    /// Only a quote so far.
    Preventivo,
    /// A status this tool does not know; kept as typed.
    Other(String),
}

impl PaymentStatus {
    /// Matches `s` case-insensitively against the known statuses. Empty text and placeholder
    /// tokens are `Unset`.
    pub fn parse(s: &str) -> Self {
        let cleaned = clean_text(s);
        match cleaned.to_lowercase().as_str() {
            "" => PaymentStatus::Unset,
            "acconto" => PaymentStatus::Acconto,
            "saldato" => PaymentStatus::Saldato,
            "ordinato" => PaymentStatus::Ordinato,
            "preventivo" => PaymentStatus::Preventivo,
            _ => PaymentStatus::Other(cleaned),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PaymentStatus::Unset => "",
            PaymentStatus::Acconto => "Acconto",
            PaymentStatus::Saldato => "Saldato",
            PaymentStatus::Ordinato => "Ordinato",
            PaymentStatus::Preventivo => "Preventivo",
            PaymentStatus::Other(s) => s,
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, PaymentStatus::Unset)
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(PaymentStatus::parse(s))
    }
}

impl Serialize for PaymentStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PaymentStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(PaymentStatus::parse(&s))
    }
}
