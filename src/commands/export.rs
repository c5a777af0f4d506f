use crate::api::{write_csv_file, Mode};
use crate::commands::Out;
use crate::model::{format_decimal, CategorySheet, Field, LineItem, PricingBasis, SkippedSheet};
use crate::{utils, Config, Result};
use anyhow::Context;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, warn};

const EXPORT_CSV: &str = "export.csv";
const CATEGORY_HEADER: &str = "Categoria";

/// What `export` wrote.
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub path: PathBuf,
    /// Data rows written, not counting the header row.
    pub rows: usize,
    pub skipped: Vec<SkippedSheet>,
}

/// Writes the confirmed line items of every configured category to a single CSV file.
///
/// The default output is `$ARREDO_HOME/export.csv`. Sheets that cannot be loaded are left out.
pub async fn export(config: Config, mode: Mode, output: Option<PathBuf>) -> Result<Out<ExportReport>> {
    let path = output.unwrap_or_else(|| config.root().join(EXPORT_CSV));
    let mut workbook = crate::api::workbook(&config, mode)?;

    let mut rows = vec![header()];
    let mut skipped = Vec::new();
    for (name, loaded) in workbook.load_categories().await {
        match loaded {
            Ok(raw) => {
                let sheet = CategorySheet::normalize(name, raw);
                let before = rows.len();
                rows.extend(confirmed_rows(&sheet));
                debug!("Exporting {} rows from sheet '{}'", rows.len() - before, sheet.name());
            }
            Err(e) => {
                warn!("Skipping sheet '{name}' in export: {e}");
                skipped.push(SkippedSheet {
                    name,
                    reason: e.to_string(),
                });
            }
        }
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        utils::make_dir(parent).await?;
    }
    write_csv_file(&path, &rows)
        .await
        .with_context(|| format!("Unable to write the export to {}", path.display()))?;

    let count = rows.len() - 1;
    Ok(Out::new(
        format!("Exported {count} confirmed items to {}", path.display()),
        ExportReport {
            path,
            rows: count,
            skipped,
        },
    ))
}

fn header() -> Vec<String> {
    let mut header = vec![CATEGORY_HEADER.to_string()];
    header.extend(
        EXPORT_FIELDS
            .iter()
            .map(|f| f.canonical_header().to_string()),
    );
    header
}

const EXPORT_FIELDS: [Field; 7] = [
    Field::Description,
    Field::Quantity,
    Field::UnitCost,
    Field::LineTotal,
    Field::PaymentStatus,
    Field::AmountPaid,
    Field::DueDate,
];

fn confirmed_rows(sheet: &CategorySheet) -> impl Iterator<Item = Vec<String>> + '_ {
    let basis = sheet.pricing_basis();
    sheet
        .items()
        .iter()
        .filter(|item| item.is_confirmed())
        .map(move |item| export_row(sheet.name(), basis, item))
}

fn export_row(category: &str, basis: PricingBasis, item: &LineItem) -> Vec<String> {
    let mut row = vec![category.to_string()];
    for field in EXPORT_FIELDS {
        let cell = match (field, basis) {
            (Field::Quantity | Field::UnitCost, PricingBasis::TotalOnly) => String::new(),
            (Field::Quantity, PricingBasis::Derived) => format_decimal(item.quantity()),
            (Field::DueDate, _) => match item.due_date() {
                Some(date) => date.format("%Y-%m-%d").to_string(),
                None => item.due_date_text().unwrap_or_default().to_string(),
            },
            _ => item.get_field(field),
        };
        row.push(cell);
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::parse_csv;
    use crate::test::TestEnv;

    async fn read_export(path: &std::path::Path) -> Vec<Vec<String>> {
        let data = utils::read(path).await.unwrap();
        parse_csv(data.as_bytes()).unwrap()
    }

    #[tokio::test]
    async fn test_export_confirmed_rows() {
        let env = TestEnv::new().await;
        let out = export(env.config(), Mode::Csv, None).await.unwrap();
        let report = out.structure().unwrap();
        assert_eq!(report.path, env.config().root().join("export.csv"));
        assert_eq!(report.rows, 12);

        let rows = read_export(&report.path).await;
        assert_eq!(rows.len(), 13);
        assert_eq!(
            rows[0],
            vec![
                "Categoria",
                "Oggetto",
                "Quantità",
                "Costo Unitario",
                "Importo Totale",
                "Stato Pagamento",
                "Importo Pagato",
                "Scadenza"
            ]
        );
        assert!(rows.iter().all(|r| r[1] != "Sgabelli" && r[1] != "Parquet"));

        let piano = rows.iter().find(|r| r[1] == "Piano cottura induzione").unwrap();
        assert_eq!(piano[0], "cucina");
        assert_eq!(piano[2], "1");
        assert_eq!(piano[4], "442.00");
        assert_eq!(piano[5], "Acconto");
        assert_eq!(piano[7], "2026-03-15");

        let letto = rows.iter().find(|r| r[1] == "Letto matrimoniale").unwrap();
        assert_eq!(letto[2], "");
        assert_eq!(letto[3], "");
    }

    #[tokio::test]
    async fn test_export_to_custom_path_skips_broken_sheet() {
        let env = TestEnv::new().await;
        env.remove("camera").await;
        let path = env.config().root().join("out").join("confermati.csv");
        let out = export(env.config(), Mode::Csv, Some(path.clone()))
            .await
            .unwrap();
        let report = out.structure().unwrap();
        assert_eq!(report.rows, 10);
        assert_eq!(report.skipped.len(), 1);
        assert!(path.is_file());
    }
}
