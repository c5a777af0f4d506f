use arredo::args::{Args, Command};
use arredo::{commands, Config, Mode, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().arredo_home().path();

    // When ARREDO_IN_TEST_MODE is set and non-empty, sheets come from in-memory demo data instead
    // of the data directory.
    let mode = Mode::from_env();

    let _: () = match args.command() {
        Command::Init(init_args) => {
            commands::init(home, init_args.data_dir().cloned(), init_args.seed())
                .await?
                .print()
        }

        Command::Show(show_args) => {
            let config = Config::load(home).await?;
            commands::show(config, mode, show_args.sheet())
                .await?
                .print()
        }

        Command::Recalc(recalc_args) => {
            let config = Config::load(home).await?;
            commands::recalc(
                config,
                mode,
                recalc_args.sheet(),
                recalc_args.dry_run(),
                recalc_args.add_columns(),
            )
            .await?
            .print()
        }

        Command::Summary => commands::summary(Config::load(home).await?, mode)
            .await?
            .print(),

        Command::Export(export_args) => {
            let config = Config::load(home).await?;
            commands::export(config, mode, export_args.output().cloned())
                .await?
                .print()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use the given level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
