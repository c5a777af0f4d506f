//! Access to the stored sheets.
//!
//! A `Sheet` moves raw rows in and out of a backing store. A `Workbook` sits on top of it and
//! knows which sheets are categories and which one holds the settings.

mod csv_sheet;
mod sheet_test_client;
mod workbook;

use crate::error::LoadError;
use crate::model::{CategorySheet, SaveOptions};
use crate::{Config, Result};
use rust_decimal::Decimal;

pub(crate) use csv_sheet::{parse_csv, write_csv_file, CsvSheet};
pub(crate) use sheet_test_client::{seed_data, TestSheet};
pub(crate) use workbook::WorkbookImpl;

/// When this environment variable is set and non-empty, sheets are served from memory instead of
/// the data directory.
pub const IN_TEST_MODE: &str = "ARREDO_IN_TEST_MODE";

/// Selects the backing store for sheets.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub enum Mode {
    /// One CSV file per sheet in the configured data directory.
    #[default]
    Csv,
    /// In-memory sheets seeded with demo data.
    Test,
}

impl Mode {
    pub fn from_env() -> Self {
        match std::env::var(IN_TEST_MODE) {
            Ok(v) if !v.is_empty() => Mode::Test,
            _ => Mode::Csv,
        }
    }
}

/// Raw row access to a backing store. The first row of a sheet is its header row.
#[async_trait::async_trait]
pub trait Sheet {
    /// Reads every row of `sheet_name`.
    async fn get(&mut self, sheet_name: &str) -> std::result::Result<Vec<Vec<String>>, LoadError>;

    /// Replaces the whole contents of `sheet_name` with `rows`.
    async fn put(&mut self, sheet_name: &str, rows: &[Vec<String>]) -> Result<()>;
}

/// Category and settings access on top of a `Sheet`.
#[async_trait::async_trait]
pub trait Workbook {
    /// Reads the stored rows of a sheet without normalizing them.
    async fn load_raw(&mut self, name: &str) -> std::result::Result<Vec<Vec<String>>, LoadError>;

    /// Reads and normalizes one category sheet.
    async fn load_category(&mut self, name: &str)
        -> std::result::Result<CategorySheet, LoadError>;

    /// Reads every configured category sheet, in report order. Each load succeeds or fails on its
    /// own.
    async fn load_categories(
        &mut self,
    ) -> Vec<(String, std::result::Result<Vec<Vec<String>>, LoadError>)>;

    /// The budget ceiling from the settings sheet, or the configured default.
    async fn budget_ceiling(&mut self) -> Decimal;

    /// Writes the whole sheet back.
    async fn save_category(&mut self, sheet: &CategorySheet, options: SaveOptions) -> Result<()>;
}

/// Creates the `Sheet` for `mode`.
pub(crate) fn sheet(config: &Config, mode: Mode) -> Result<Box<dyn Sheet + Send>> {
    Ok(match mode {
        Mode::Csv => Box::new(CsvSheet::new(config.data_dir())),
        Mode::Test => Box::new(TestSheet::seeded()?),
    })
}

/// Creates the `Workbook` for `config`, reading sheets through the store selected by `mode`.
pub(crate) fn workbook(config: &Config, mode: Mode) -> Result<Box<dyn Workbook + Send>> {
    Ok(Box::new(WorkbookImpl::new(sheet(config, mode)?, config)))
}
