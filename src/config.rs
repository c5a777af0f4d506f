//! Configuration file handling for arredo.
//!
//! The configuration file is stored at `$ARREDO_HOME/config.json`. It names the category sheets
//! to work with, where their CSV files live, the settings sheet holding the budget ceiling and
//! the backup settings.

use crate::backup::Backup;
use crate::model::DEFAULT_BUDGET_CEILING;
use crate::{utils, Result};
use anyhow::{bail, Context};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "arredo";
const CONFIG_VERSION: u8 = 1;
const BACKUP_COPIES: u32 = 5;
const BACKUPS: &str = ".backups";
const DATA: &str = "data";
const CONFIG_JSON: &str = "config.json";
const SETTINGS_SHEET: &str = "Impostazioni";

/// The category sheets a new home is configured with.
pub(crate) const DEFAULT_CATEGORIES: &[&str] = &["camera", "cucina", "salotto", "tavolo", "lavori"];

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$ARREDO_HOME` and from there it loads `$ARREDO_HOME/config.json`. It provides
/// paths to other items that are either configurable or are expected in a certain location within
/// the arredo home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    backups: PathBuf,
    data_dir: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
}

impl Config {
    /// Creates the home directory, its subdirectories and an initial `config.json` with default
    /// settings.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of the home directory, e.g. `$HOME/arredo`
    /// - `data_dir` - Where the category CSV files live. Relative paths are resolved against
    ///   `dir`. Defaults to `$ARREDO_HOME/data`.
    ///
    /// # Errors
    /// - Returns an error if any file operations fail.
    pub async fn create(dir: impl Into<PathBuf>, data_dir: Option<PathBuf>) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the arredo home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let backups = root.join(BACKUPS);
        utils::make_dir(&backups).await?;

        let config_file = ConfigFile {
            data_dir,
            ..ConfigFile::default()
        };
        let data_dir = resolve(&root, config_file.data_dir());
        utils::make_dir(&data_dir)
            .await
            .context("Unable to create the data directory")?;

        let config_path = root.join(CONFIG_JSON);
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            backups,
            data_dir,
            config_path,
            config_file,
        })
    }

    /// This will
    /// - validate that `arredo_home` exists and that the config file exists
    /// - load the config file
    /// - validate that the backups and data directories exist
    /// - return the loaded configuration object
    pub async fn load(arredo_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = arredo_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("Arredo home is missing, run 'arredo init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;

        let config = Self {
            backups: root.join(BACKUPS),
            data_dir: resolve(&root, config_file.data_dir()),
            root,
            config_path,
            config_file,
        };
        if !config.backups.is_dir() {
            bail!(
                "The backups directory is missing '{}'",
                config.backups.display()
            )
        }
        if !config.data_dir.is_dir() {
            bail!(
                "The data directory is missing '{}'",
                config.data_dir.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn backups(&self) -> &Path {
        &self.backups
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// The category sheets, in report order.
    pub fn categories(&self) -> &[String] {
        &self.config_file.categories
    }

    pub fn settings_sheet(&self) -> &str {
        &self.config_file.settings_sheet
    }

    /// The budget ceiling to use when the settings sheet does not provide one.
    pub fn default_budget(&self) -> Decimal {
        self.config_file.default_budget
    }

    pub fn backup_copies(&self) -> u32 {
        self.config_file.backup_copies
    }

    /// Creates a new `Backup` instance for managing backup files.
    pub fn backup(&self) -> Backup {
        Backup::new(self)
    }
}

/// Returns `p` if it is absolute, otherwise `root` joined with `p`.
fn resolve(root: &Path, p: PathBuf) -> PathBuf {
    if p.is_absolute() {
        return p;
    }
    root.join(p)
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "arredo",
///   "config_version": 1,
///   "categories": ["camera", "cucina", "salotto", "tavolo", "lavori"],
///   "settings_sheet": "Impostazioni",
///   "default_budget": "15000",
///   "backup_copies": 5
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "arredo"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Directory holding one `<sheet>.csv` per sheet (optional, relative to `$ARREDO_HOME` or
    /// absolute). Defaults to `$ARREDO_HOME/data`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data_dir: Option<PathBuf>,

    /// Category sheet names
    #[serde(default = "default_categories")]
    categories: Vec<String>,

    /// Name of the sheet holding the budget ceiling
    #[serde(default = "default_settings_sheet")]
    settings_sheet: String,

    /// Budget ceiling used when the settings sheet has none
    #[serde(default = "default_budget")]
    default_budget: Decimal,

    /// Number of backup copies to keep, per sheet
    #[serde(default = "default_backup_copies")]
    backup_copies: u32,
}

fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect()
}

fn default_settings_sheet() -> String {
    SETTINGS_SHEET.to_string()
}

fn default_budget() -> Decimal {
    DEFAULT_BUDGET_CEILING
}

fn default_backup_copies() -> u32 {
    BACKUP_COPIES
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            data_dir: None,
            categories: default_categories(),
            settings_sheet: default_settings_sheet(),
            default_budget: default_budget(),
            backup_copies: BACKUP_COPIES,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile asynchronously from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if it belongs to another app.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)
            .await
            .with_context(|| format!("Failed to load config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.backup_copies > 0,
            "Invalid backup_copies in config file: must be at least 1"
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }

    /// Gets the data directory, relative to `$ARREDO_HOME` unless absolute.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| PathBuf::from(DATA))
    }
}
