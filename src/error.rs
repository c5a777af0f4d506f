use thiserror::Error;

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The reason a single worksheet could not be loaded.
///
/// Loading is isolated per sheet: the caller decides whether a failure is fatal (e.g. `show` on a
/// single sheet) or should be skipped (e.g. the cross-sheet summary).
#[derive(Debug, Error)]
pub enum LoadError {
    /// The worksheet does not exist in the backing store.
    #[error("sheet '{sheet}' not found")]
    Missing { sheet: String },

    /// The backing store could not be reached or read.
    #[error("unable to read sheet '{sheet}': {source}")]
    Transport {
        sheet: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The worksheet exists but its contents could not be decoded into rows.
    #[error("sheet '{sheet}' is malformed: {reason}")]
    Malformed { sheet: String, reason: String },

    /// The name cannot be used as a sheet name, e.g. it contains a path separator.
    #[error("'{sheet}' is not a valid sheet name")]
    InvalidName { sheet: String },
}

impl LoadError {
    /// The name of the sheet that failed to load.
    pub fn sheet(&self) -> &str {
        match self {
            LoadError::Missing { sheet } => sheet,
            LoadError::Transport { sheet, .. } => sheet,
            LoadError::Malformed { sheet, .. } => sheet,
            LoadError::InvalidName { sheet } => sheet,
        }
    }

    /// True when the sheet is simply absent, as opposed to present but unreadable.
    pub fn is_missing(&self) -> bool {
        matches!(self, LoadError::Missing { .. })
    }
}
