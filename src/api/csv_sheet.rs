//! Implements the `Sheet` trait over a directory holding one `<sheet>.csv` file per sheet.

use crate::api::Sheet;
use crate::error::LoadError;
use crate::{utils, Result};
use anyhow::Context;
use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::trace;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Sheets stored as CSV files in `dir`.
pub(crate) struct CsvSheet {
    dir: PathBuf,
}

impl CsvSheet {
    pub(crate) fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The file holding `sheet_name`. Names that could resolve outside `dir` are rejected.
    fn path(&self, sheet_name: &str) -> std::result::Result<PathBuf, LoadError> {
        let invalid = sheet_name.trim().is_empty()
            || sheet_name == "."
            || sheet_name == ".."
            || sheet_name.contains(['/', '\\', '\0']);
        if invalid {
            return Err(LoadError::InvalidName {
                sheet: sheet_name.to_string(),
            });
        }
        Ok(self.dir.join(format!("{sheet_name}.csv")))
    }
}

#[async_trait::async_trait]
impl Sheet for CsvSheet {
    async fn get(&mut self, sheet_name: &str) -> std::result::Result<Vec<Vec<String>>, LoadError> {
        let path = self.path(sheet_name)?;
        trace!("get for {sheet_name} from {}", path.display());
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(LoadError::Missing {
                    sheet: sheet_name.to_string(),
                })
            }
            Err(e) => {
                return Err(LoadError::Transport {
                    sheet: sheet_name.to_string(),
                    source: Box::new(e),
                })
            }
        };
        parse_csv(&data).map_err(|e| LoadError::Malformed {
            sheet: sheet_name.to_string(),
            reason: e.to_string(),
        })
    }

    async fn put(&mut self, sheet_name: &str, rows: &[Vec<String>]) -> Result<()> {
        let path = self.path(sheet_name)?;
        trace!("put for {sheet_name} to {}", path.display());
        let data = to_csv(rows)?;
        utils::write_atomic(&path, data)
            .await
            .with_context(|| format!("Unable to save sheet '{sheet_name}'"))
    }
}

/// Loads rows from CSV data. Every record is a row, the first one included, and rows may have
/// different lengths.
pub(crate) fn parse_csv(data: &[u8]) -> std::result::Result<Vec<Vec<String>>, csv::Error> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(Cursor::new(data));

    let mut rows: Vec<Vec<String>> = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(|field| field.to_string()).collect());
    }
    Ok(rows)
}

/// Renders rows as CSV data.
pub(crate) fn to_csv(rows: &[Vec<String>]) -> Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    for row in rows {
        wtr.write_record(row).context("Unable to encode CSV row")?;
    }
    wtr.into_inner().context("Unable to finish CSV data")
}

/// Writes `rows` as a CSV file at `path`.
pub(crate) async fn write_csv_file(path: &Path, rows: &[Vec<String>]) -> Result<()> {
    utils::write_atomic(path, to_csv(rows)?).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let dir = TempDir::new().unwrap();
        let mut sheet = CsvSheet::new(dir.path());
        let data = rows(&[
            &["Oggetto", "Importo Totale", "Note"],
            &["Divano, 3 posti", "€1,512.00", "consegna \"veloce\""],
            &["Tavolino", "180"],
        ]);
        sheet.put("salotto", &data).await.unwrap();
        assert!(dir.path().join("salotto.csv").is_file());
        let read = sheet.get("salotto").await.unwrap();
        assert_eq!(read, data);
    }

    #[tokio::test]
    async fn test_missing_sheet() {
        let dir = TempDir::new().unwrap();
        let mut sheet = CsvSheet::new(dir.path());
        let err = sheet.get("bagno").await.unwrap_err();
        assert!(err.is_missing());
        assert_eq!(err.sheet(), "bagno");
    }

    #[tokio::test]
    async fn test_malformed_sheet() {
        let dir = TempDir::new().unwrap();
        utils::write(dir.path().join("cucina.csv"), b"Oggetto\n\xFF\xFE\n")
            .await
            .unwrap();
        let mut sheet = CsvSheet::new(dir.path());
        let err = sheet.get("cucina").await.unwrap_err();
        assert!(matches!(err, LoadError::Malformed { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn test_sheet_names_stay_inside_data_dir() {
        let root = TempDir::new().unwrap();
        let data_dir = root.path().join("data");
        utils::make_dir(&data_dir).await.unwrap();
        utils::write(root.path().join("segreto.csv"), "Oggetto\nCassaforte\n")
            .await
            .unwrap();
        let mut sheet = CsvSheet::new(&data_dir);

        for name in ["../segreto", "a/b", "..\\segreto", "..", ".", "", "  ", "nul\0"] {
            let err = sheet.get(name).await.unwrap_err();
            assert!(matches!(err, LoadError::InvalidName { .. }), "{name:?}: {err:?}");
            assert_eq!(err.sheet(), name);
            assert!(sheet.put(name, &rows(&[&["x"]])).await.is_err(), "{name:?}");
        }

        assert_eq!(
            utils::read(&root.path().join("segreto.csv")).await.unwrap(),
            "Oggetto\nCassaforte\n"
        );
        assert!(!root.path().join("a").exists());
        let mut entries = std::fs::read_dir(&data_dir).unwrap();
        assert!(entries.next().is_none());

        sheet.put("sala.da.pranzo", &rows(&[&["x"]])).await.unwrap();
        assert!(data_dir.join("sala.da.pranzo.csv").is_file());
    }

    #[test]
    fn test_parse_csv_strips_bom() {
        let parsed = parse_csv("\u{feff}Oggetto,Costo\nLetto,800\n".as_bytes()).unwrap();
        assert_eq!(parsed[0][0], "Oggetto");
        assert_eq!(parsed.len(), 2);
    }

    #[tokio::test]
    async fn test_write_csv_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("export.csv");
        write_csv_file(&path, &rows(&[&["a", "b"]])).await.unwrap();
        assert_eq!(utils::read(&path).await.unwrap(), "a,b\n");
    }
}
