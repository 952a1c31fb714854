use chrono::Local;
use eyre::{Context, Result};
use log::{debug, error};
use std::io::Write;

mod cli;
mod commands;
mod config;
mod gate;
mod hook;
mod input;

use cli::{Cli, Commands};
use config::{Config, LogLevel};
use hook::EXIT_USAGE;

fn setup_logging(verbose: bool) -> Result<()> {
    // RUST_LOG env var takes precedence, then --verbose, then config log_level
    let mut builder = env_logger::Builder::new();

    if std::env::var("RUST_LOG").is_ok() {
        builder.parse_default_env();
    } else {
        // Filtering happens on the global max level, see apply_log_level
        builder.filter_level(log::LevelFilter::Trace);
    }

    // The host shows stderr to the user, stdout is reserved for hook output
    builder
        .target(env_logger::Target::Stderr)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .try_init()
        .context("Failed to initialize logger")?;

    apply_log_level(LogLevel::default(), verbose);
    Ok(())
}

/// Switch to the configured level once the config is known
fn apply_log_level(log_level: LogLevel, verbose: bool) {
    if std::env::var("RUST_LOG").is_ok() {
        return;
    }
    let filter = if verbose { log::LevelFilter::Debug } else { log_level.as_filter() };
    log::set_max_level(filter);
}

fn run(cli: Cli) -> Result<i32> {
    // Logging starts at the default level so config load warnings are shown
    setup_logging(cli.verbose)?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    apply_log_level(config.log_level, cli.verbose);

    if cli.lenient {
        debug!("Arguments not fully recognized, using mode '{}'", cli.mode);
    }

    match cli.command {
        Some(Commands::Gates { format, only }) => commands::gates::run(format, &only, &config),
        None => commands::hook::run(&cli.mode, &config),
    }
}

fn main() {
    let cli = Cli::parse_lenient();

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            EXIT_USAGE
        }
    };

    std::process::exit(code);
}
