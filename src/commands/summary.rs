use crate::api::Mode;
use crate::commands::Out;
use crate::model::{Amount, Summary};
use crate::{Config, Result};
use tracing::warn;

/// Aggregates every configured category sheet against the budget ceiling. Sheets that cannot be
/// loaded are left out and listed in the output.
pub async fn summary(config: Config, mode: Mode) -> Result<Out<Summary>> {
    let mut workbook = crate::api::workbook(&config, mode)?;
    let ceiling = workbook.budget_ceiling().await;
    let loaded = workbook.load_categories().await;
    let summary = Summary::aggregate(loaded, ceiling);

    let mut message = format!(
        "Confirmed {} of a {} budget, {} remaining. Paid {}, left to pay {}. {} still to decide",
        Amount::euro(summary.confirmed_total),
        Amount::euro(summary.budget_ceiling),
        Amount::euro(summary.budget_remaining),
        Amount::euro(summary.paid_total),
        Amount::euro(summary.left_to_pay),
        Amount::euro(summary.outstanding_to_decide),
    );
    if summary.is_over_budget() {
        warn!(
            "Confirmed purchases exceed the budget by {}",
            Amount::euro(-summary.budget_remaining)
        );
    }
    if !summary.skipped.is_empty() {
        let names: Vec<&str> = summary.skipped.iter().map(|s| s.name.as_str()).collect();
        message.push_str(&format!(". Skipped: {}", names.join(", ")));
    }
    Ok(Out::new(message, summary))
}
