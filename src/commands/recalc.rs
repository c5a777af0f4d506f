use crate::api::Mode;
use crate::commands::Out;
use crate::model::{CategorySheet, RecalcReport, SaveOptions};
use crate::{Config, Result};
use anyhow::Context;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};

/// The result of recalculating and saving one sheet.
#[derive(Debug, Clone, Serialize)]
pub struct RecalcOutcome {
    pub sheet: String,
    /// Nothing was written when `true`.
    pub dry_run: bool,
    /// The backup of the stored rows taken before the write.
    pub backup: Option<PathBuf>,
    #[serde(flatten)]
    pub report: RecalcReport,
}

/// Recomputes the derived columns of `sheet` and writes the whole table back.
///
/// The stored rows are backed up before they are replaced. Rows that cannot be recomputed are
/// reported and written back unchanged. With `dry_run` nothing is backed up or written. With
/// `add_columns`, derived columns the sheet lacks are appended to it.
pub async fn recalc(
    config: Config,
    mode: Mode,
    sheet: &str,
    dry_run: bool,
    add_columns: bool,
) -> Result<Out<RecalcOutcome>> {
    let mut workbook = crate::api::workbook(&config, mode)?;
    let stored = workbook
        .load_raw(sheet)
        .await
        .with_context(|| format!("Unable to recalculate sheet '{sheet}'"))?;

    let mut category = CategorySheet::normalize(sheet, stored.clone());
    let report = category.recalculate();
    for failure in &report.failed {
        info!(
            "Row {} '{}' was not recalculated: {}",
            failure.row, failure.description, failure.error
        );
    }

    let backup = if dry_run {
        debug!("Dry run, sheet '{sheet}' is not written");
        None
    } else {
        let path = config.backup().save_sheet(sheet, &stored).await?;
        debug!("Saved backup to {}", path.display());
        workbook
            .save_category(&category, SaveOptions::new(add_columns))
            .await?;
        Some(path)
    };

    let verb = if dry_run { "Would recalculate" } else { "Recalculated" };
    let mut message = format!("{verb} {} rows of sheet '{sheet}'", report.recalculated);
    if !report.failed.is_empty() {
        message.push_str(&format!(", {} rows left unchanged", report.failed.len()));
    }
    Ok(Out::new(
        message,
        RecalcOutcome {
            sheet: sheet.to_string(),
            dry_run,
            backup,
            report,
        },
    ))
}
