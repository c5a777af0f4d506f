//! These structs provide the CLI interface for the arredo CLI.

use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing::level_filters::LevelFilter;

/// arredo: A command-line tool for tracking what furnishing a home costs.
///
/// Each room is a sheet of line items: what it is, its list price, discount and quantity, whether
/// the purchase is confirmed and how much of it has been paid. Sheets are stored as CSV files, one
/// per room, and may name their columns however they like as long as the names are ones arredo
/// recognizes (e.g. "Oggetto" or "Articolo" for the description).
///
/// arredo reads these sheets, recomputes their derived columns when asked to, and adds them up
/// against a budget ceiling.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the home directory and initialize the configuration file.
    ///
    /// This is the first command you should run. By default the room sheets are expected in
    /// $ARREDO_HOME/data, one CSV file per sheet, named after the sheet (e.g. cucina.csv). Pass
    /// --data-dir to keep them elsewhere and --seed to start from a set of demo rooms.
    Init(InitArgs),
    /// Print one room sheet, normalized, along with its totals.
    Show(ShowArgs),
    /// Recompute unit costs, line totals and amounts paid for one sheet and save it.
    ///
    /// The stored sheet is backed up to $ARREDO_HOME/.backups before it is replaced.
    Recalc(RecalcArgs),
    /// Add up every room against the budget ceiling.
    Summary,
    /// Write the confirmed purchases of every room to one CSV file.
    Export(ExportArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG. See the tracing-subscriber crate for instructions.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where arredo configuration and backups are held. Defaults to ~/arredo
    #[arg(long, env = "ARREDO_HOME", default_value_t = default_arredo_home())]
    arredo_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, arredo_home: PathBuf) -> Self {
        Self {
            log_level,
            arredo_home: arredo_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn arredo_home(&self) -> &DisplayPath {
        &self.arredo_home
    }
}

/// Args for the `arredo init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The directory holding the room sheets. Relative paths are relative to $ARREDO_HOME.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Write a set of demo room sheets into the data directory.
    #[arg(long)]
    seed: bool,
}

impl InitArgs {
    pub fn new(data_dir: Option<PathBuf>, seed: bool) -> Self {
        Self { data_dir, seed }
    }

    pub fn data_dir(&self) -> Option<&PathBuf> {
        self.data_dir.as_ref()
    }

    pub fn seed(&self) -> bool {
        self.seed
    }
}

/// Args for the `arredo show` command.
#[derive(Debug, Parser, Clone)]
pub struct ShowArgs {
    /// The name of the sheet, e.g. cucina
    sheet: String,
}

impl ShowArgs {
    pub fn new(sheet: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
        }
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }
}

/// Args for the `arredo recalc` command.
#[derive(Debug, Parser, Clone)]
pub struct RecalcArgs {
    /// The name of the sheet, e.g. cucina
    sheet: String,

    /// Compute and report, but do not write anything.
    #[arg(long)]
    dry_run: bool,

    /// Append the computed columns the sheet lacks ("Costo Unitario", "Importo Totale",
    /// "Importo Pagato"). Without this the header row is never changed.
    #[arg(long)]
    add_columns: bool,
}

impl RecalcArgs {
    pub fn new(sheet: impl Into<String>, dry_run: bool, add_columns: bool) -> Self {
        Self {
            sheet: sheet.into(),
            dry_run,
            add_columns,
        }
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn add_columns(&self) -> bool {
        self.add_columns
    }
}

/// Args for the `arredo export` command.
#[derive(Debug, Parser, Clone)]
pub struct ExportArgs {
    /// Where to write the CSV file. Defaults to $ARREDO_HOME/export.csv
    #[arg(long)]
    output: Option<PathBuf>,
}

impl ExportArgs {
    pub fn new(output: Option<PathBuf>) -> Self {
        Self { output }
    }

    pub fn output(&self) -> Option<&PathBuf> {
        self.output.as_ref()
    }
}

fn default_arredo_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("arredo"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --arredo-home or ARREDO_HOME instead of relying on the default \
                arredo home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("arredo")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}
