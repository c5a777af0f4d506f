use crate::api::{seed_data, CsvSheet, Sheet};
use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What `init` created.
#[derive(Debug, Clone, Serialize)]
pub struct InitReport {
    pub root: PathBuf,
    pub data_dir: PathBuf,
    /// The sheets written by `--seed`, empty otherwise.
    pub seeded: Vec<String>,
}

/// Creates the home directory, its subdirectories and an initial `config.json` with default
/// settings.
///
/// # Arguments
/// - `arredo_home` - The directory that will be the root of the home directory, e.g. `$HOME/arredo`
/// - `data_dir` - Where the category CSV files live, if not `$ARREDO_HOME/data`.
/// - `seed` - Write the demo sheets into the data directory.
///
/// # Errors
/// - Returns an error if any file operations fail.
pub async fn init(arredo_home: &Path, data_dir: Option<PathBuf>, seed: bool) -> Result<Out<InitReport>> {
    let config = Config::create(arredo_home, data_dir)
        .await
        .context("Unable to create the arredo home directory and config")?;

    let mut seeded = Vec::new();
    if seed {
        let mut sheet = CsvSheet::new(config.data_dir());
        for (name, rows) in seed_data()? {
            sheet.put(name, &rows).await?;
            debug!("Seeded sheet '{name}' with {} rows", rows.len());
            seeded.push(name.to_string());
        }
    }

    let message = if seeded.is_empty() {
        format!("Created the arredo home at {}", config.root().display())
    } else {
        format!(
            "Created the arredo home at {} with {} demo sheets",
            config.root().display(),
            seeded.len()
        )
    };
    Ok(Out::new(
        message,
        InitReport {
            root: config.root().to_path_buf(),
            data_dir: config.data_dir().to_path_buf(),
            seeded,
        },
    ))
}
