//! Types that represent the core data model: category sheets, their line items, and the
//! computations over them.
mod amount;
mod confirm;
mod field;
mod line_item;
mod mapping;
mod recalc;
mod settings;
mod sheet;
mod summary;

pub use amount::{format_decimal, parse_decimal, Amount, AmountError, AmountFormat};
pub use confirm::{is_confirmed, partition, CONFIRMED_FLAGS};
pub use field::{Columns, Field, FieldKind};
pub use line_item::{LineItem, PaymentStatus};
pub use mapping::{resolve, ColumnRef, ColumnResolver, Header, Mapping};
pub use recalc::{reconcile_payment, recalculate, RecalcError, RecalcReport, RowFailure};
pub use settings::{budget_ceiling, BUDGET_LABELS, DEFAULT_BUDGET_CEILING};
pub use sheet::{CategorySheet, PricingBasis, SaveOptions};
pub use summary::{CategoryTotals, SheetSummary, SkippedSheet, Summary};
