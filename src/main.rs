use clap::Parser;
use cashcal::args::{Args, Command};
use cashcal::commands::{self, Session};
use cashcal::{Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env is fine, the variables may come from the environment.
    let dotenv = dotenvy::dotenv();
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());
    match dotenv {
        Ok(path) => debug!("Loaded variables from {}", path.display()),
        Err(e) => debug!("No .env file was loaded: {e}"),
    }

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().home();

    // This allows for running the program without the ledger backend. When
    // CASHCAL_IN_TEST_MODE is set and non-zero in length, then the mode will be Mode::Test,
    // otherwise it will be Mode::Http.
    let mode = Mode::from_env();

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Serve(serve_args) => {
            commands::serve(serve_args.addr(), mode, serve_args.event_limit())
                .await?
                .print()
        }

        Command::Calendar(calendar_args) => {
            let session = Session::connect(calendar_args.client().config(), home)?;
            commands::calendar(&session, calendar_args.year(), calendar_args.month())
                .await?
                .print()
        }

        Command::Stats(stats_args) => {
            let calendar_args = stats_args.calendar();
            let session = Session::connect(calendar_args.client().config(), home)?;
            commands::stats(
                &session,
                calendar_args.year(),
                calendar_args.month(),
                stats_args.expand(),
            )
            .await?
            .print()
        }

        Command::Add(add_args) => {
            let session = Session::connect(add_args.client().config(), home)?;
            commands::add(&session, add_args.date(), add_args.amount(), add_args.fields())
                .await?
                .print()
        }

        Command::Edit(edit_args) => {
            let session = Session::connect(edit_args.client().config(), home)?;
            commands::edit(
                &session,
                edit_args.id(),
                edit_args.date(),
                edit_args.amount(),
                edit_args.fields(),
            )
            .await?
            .print()
        }

        Command::Theme(theme_args) => commands::theme(home, theme_args.action()).await?.print(),
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
            // RUST_LOG does not exist; use default log level for this crate only.
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
