use crate::api::Mode;
use crate::commands::Out;
use crate::model::{Amount, CategorySheet, CategoryTotals};
use crate::{Config, Result};
use anyhow::Context;

/// Loads and normalizes one category sheet. Nothing is recalculated.
pub async fn show(config: Config, mode: Mode, sheet: &str) -> Result<Out<CategorySheet>> {
    let mut workbook = crate::api::workbook(&config, mode)?;
    let category = workbook
        .load_category(sheet)
        .await
        .with_context(|| format!("Unable to show sheet '{sheet}'"))?;

    let totals = CategoryTotals::of(&category);
    let message = format!(
        "Sheet '{}' ({}): {} items, {} confirmed, confirmed {}, potential {}, paid {}",
        category.name(),
        category.pricing_basis(),
        category.len(),
        totals.confirmed_items,
        Amount::euro(totals.confirmed),
        Amount::euro(totals.potential),
        Amount::euro(totals.paid),
    );
    Ok(Out::new(message, category))
}
