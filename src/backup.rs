//! Backup management for the stored copy of a sheet before it is overwritten.

use crate::{utils, Config, Result};
use anyhow::Context;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Prefix for backups taken right before a sheet is written back.
pub const SAVE_PRE: &str = "save-pre";

/// The contents of a sheet backup file.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct SheetSnapshot {
    pub sheet: String,
    pub rows: Vec<Vec<String>>,
}

/// Manages backup file creation and rotation.
///
/// The `Backup` struct is immutable and owns copies of the paths and settings it needs.
/// Create a new instance via `Config::backup()` or `Backup::new()`.
#[derive(Debug, Clone)]
pub struct Backup {
    backups_dir: PathBuf,
    backup_copies: u32,
}

impl Backup {
    /// Creates a new `Backup` instance from a `Config`.
    pub fn new(config: &Config) -> Self {
        Self {
            backups_dir: config.backups().to_path_buf(),
            backup_copies: config.backup_copies(),
        }
    }

    /// Saves the stored rows of `sheet` before they are replaced.
    ///
    /// The filename format is `save-pre.{sheet}.YYYY-MM-DD-NNN.json`. Only `backup_copies` files
    /// are kept per sheet.
    pub async fn save_sheet(&self, sheet: &str, rows: &[Vec<String>]) -> Result<PathBuf> {
        let snapshot = SheetSnapshot {
            sheet: sheet.to_string(),
            rows: rows.to_vec(),
        };
        self.save_json(&format!("{SAVE_PRE}.{sheet}"), &snapshot).await
    }

    /// Saves `data` as a pretty-printed JSON backup file.
    ///
    /// The filename format is `{prefix}.YYYY-MM-DD-NNN.json` where NNN is a sequence number.
    /// Automatically rotates old backups, keeping only `backup_copies` files.
    ///
    /// Returns the path to the created backup file.
    pub async fn save_json<T: Serialize>(&self, prefix: &str, data: &T) -> Result<PathBuf> {
        let date = today();
        let seq = self.next_sequence_number(prefix, &date).await?;
        let filename = format!("{prefix}.{date}-{seq:03}.json");
        let path = self.backups_dir.join(&filename);

        let json = serde_json::to_string_pretty(data).context("Failed to serialize backup")?;
        utils::write(&path, json).await?;

        self.rotate(prefix).await?;

        Ok(path)
    }

    /// Lists the backup files for `prefix`, oldest first.
    async fn list(&self, prefix: &str) -> Result<Vec<(PathBuf, String)>> {
        let mut files: Vec<(PathBuf, String)> = Vec::new();
        let mut dir = utils::read_dir(&self.backups_dir).await?;
        while let Some(entry) = dir
            .next_entry()
            .await
            .context("Failed to read directory entry")?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if is_backup_file(&name, prefix) {
                files.push((entry.path(), name));
            }
        }
        // Sorting by filename sorts by date and sequence number.
        files.sort_by(|a, b| a.1.cmp(&b.1));
        Ok(files)
    }

    /// Returns the next sequence number for `prefix` on `date`.
    async fn next_sequence_number(&self, prefix: &str, date: &str) -> Result<u32> {
        let max_seq = self
            .list(prefix)
            .await?
            .iter()
            .filter_map(|(_, name)| parse_sequence_number(name, prefix, date))
            .max()
            .unwrap_or(0);
        Ok(max_seq + 1)
    }

    /// Rotates old backup files, keeping only `backup_copies` files with the given prefix.
    async fn rotate(&self, prefix: &str) -> Result<()> {
        let files = self.list(prefix).await?;
        let to_delete = files.len().saturating_sub(self.backup_copies as usize);
        for (path, _) in files.into_iter().take(to_delete) {
            utils::remove(&path).await?;
        }
        Ok(())
    }
}

/// Returns today's date in YYYY-MM-DD format.
fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Splits `{prefix}.{date}-{NNN}.json` into its date and sequence number.
fn split_backup_name<'a>(filename: &'a str, prefix: &str) -> Option<(&'a str, u32)> {
    let rest = filename
        .strip_prefix(prefix)?
        .strip_prefix('.')?
        .strip_suffix(".json")?;
    let (date, seq) = rest.rsplit_once('-')?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    Some((date, seq.parse().ok()?))
}

/// Parses the sequence number from a backup filename.
/// Returns None if the filename doesn't match the expected pattern.
fn parse_sequence_number(filename: &str, prefix: &str, date: &str) -> Option<u32> {
    split_backup_name(filename, prefix)
        .filter(|(d, _)| *d == date)
        .map(|(_, seq)| seq)
}

/// Checks if a filename is a backup file with the given prefix.
fn is_backup_file(filename: &str, prefix: &str) -> bool {
    split_backup_name(filename, prefix).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[test]
    fn test_parse_sequence_number() {
        assert_eq!(
            parse_sequence_number(
                "save-pre.cucina.2026-03-14-001.json",
                "save-pre.cucina",
                "2026-03-14"
            ),
            Some(1)
        );
        assert_eq!(
            parse_sequence_number(
                "save-pre.cucina.2026-03-14-042.json",
                "save-pre.cucina",
                "2026-03-14"
            ),
            Some(42)
        );
        // Wrong prefix
        assert_eq!(
            parse_sequence_number(
                "save-pre.camera.2026-03-14-001.json",
                "save-pre.cucina",
                "2026-03-14"
            ),
            None
        );
        // Wrong date
        assert_eq!(
            parse_sequence_number(
                "save-pre.cucina.2026-03-13-001.json",
                "save-pre.cucina",
                "2026-03-14"
            ),
            None
        );
    }

    #[test]
    fn test_is_backup_file() {
        assert!(is_backup_file(
            "save-pre.salotto.2026-03-14-001.json",
            "save-pre.salotto"
        ));
        assert!(!is_backup_file(
            "save-pre.salotto.2026-03-14-001.json",
            "save-pre.sal"
        ));
        assert!(!is_backup_file(
            "save-pre.salotto.extra.2026-03-14-001.json",
            "save-pre.salotto"
        ));
        assert!(!is_backup_file(
            "save-pre.salotto.2026-03-14-001.csv",
            "save-pre.salotto"
        ));
    }

    #[tokio::test]
    async fn test_save_sheet_rotates_per_sheet() {
        let env = TestEnv::new().await;
        let backup = env.config().backup();
        let rows = vec![vec!["Oggetto".to_string()], vec!["Sedia".to_string()]];

        let mut saved = Vec::new();
        for _ in 0..7 {
            saved.push(backup.save_sheet("cucina", &rows).await.unwrap());
        }
        let last = saved.last().unwrap();
        backup.save_sheet("camera", &rows).await.unwrap();

        let cucina = backup.list("save-pre.cucina").await.unwrap();
        assert_eq!(cucina.len(), 5);
        assert!(last.to_string_lossy().ends_with("-007.json"));
        assert_eq!(backup.list("save-pre.camera").await.unwrap().len(), 1);

        let snapshot: SheetSnapshot = utils::deserialize(last).await.unwrap();
        assert_eq!(snapshot.sheet, "cucina");
        assert_eq!(snapshot.rows, rows);
    }
}
