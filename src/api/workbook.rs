//! Implements the `Workbook` trait on top of any `Sheet`.

use crate::api::{Sheet, Workbook};
use crate::error::LoadError;
use crate::model::{budget_ceiling, CategorySheet, SaveOptions};
use crate::{Config, Result};
use rust_decimal::Decimal;
use tracing::{debug, warn};

/// Implements the `Workbook` trait, reading and writing through a dynamically-dispatched `sheet`.
pub(crate) struct WorkbookImpl {
    sheet: Box<dyn Sheet + Send>,
    categories: Vec<String>,
    settings_sheet: String,
    default_budget: Decimal,
}

impl WorkbookImpl {
    pub(crate) fn new(sheet: Box<dyn Sheet + Send>, config: &Config) -> Self {
        Self {
            sheet,
            categories: config.categories().to_vec(),
            settings_sheet: config.settings_sheet().to_string(),
            default_budget: config.default_budget(),
        }
    }
}

#[async_trait::async_trait]
impl Workbook for WorkbookImpl {
    async fn load_raw(&mut self, name: &str) -> std::result::Result<Vec<Vec<String>>, LoadError> {
        self.sheet.get(name).await
    }

    async fn load_category(
        &mut self,
        name: &str,
    ) -> std::result::Result<CategorySheet, LoadError> {
        let rows = self.sheet.get(name).await?;
        Ok(CategorySheet::normalize(name, rows))
    }

    async fn load_categories(
        &mut self,
    ) -> Vec<(String, std::result::Result<Vec<Vec<String>>, LoadError>)> {
        let mut loaded = Vec::with_capacity(self.categories.len());
        for name in &self.categories {
            let rows = self.sheet.get(name).await;
            loaded.push((name.clone(), rows));
        }
        loaded
    }

    async fn budget_ceiling(&mut self) -> Decimal {
        match self.sheet.get(&self.settings_sheet).await {
            Ok(rows) => budget_ceiling(&rows, self.default_budget),
            Err(e) if e.is_missing() => {
                debug!("{e}, using the default budget");
                self.default_budget
            }
            Err(e) => {
                warn!("{e}, using the default budget");
                self.default_budget
            }
        }
    }

    async fn save_category(&mut self, sheet: &CategorySheet, options: SaveOptions) -> Result<()> {
        let rows = sheet.to_rows(options);
        debug!("Writing {} rows to sheet '{}'", rows.len(), sheet.name());
        self.sheet.put(sheet.name(), &rows).await
    }
}
