pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use reserva_core::config::{AppConfig, ConfigOverrides, LoadOptions, LoggingConfig};

use commands::forecast::ForecastArgs;
use commands::offers::OffersArgs;
use commands::recommend::RecommendArgs;
use commands::{CommandResult, EXIT_CONFIG};

#[derive(Debug, Parser)]
#[command(
    name = "reserva",
    about = "Reserved instance purchase recommendations",
    long_about = "Price reserved-instance offers from a catalog snapshot against observed usage and recommend what to buy.",
    after_help = "Examples:\n  reserva recommend --catalog ap-northeast-1.json --input purchases.json --format csv\n  reserva offers --catalog ap-northeast-1.json --instance-type m4.large --os Linux\n  reserva config"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        help = "Config file path (defaults to reserva.toml or config/reserva.toml)"
    )]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override logging.level for this run")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Recommend the cheapest reservation for each purchase or usage group")]
    Recommend(RecommendArgs),
    #[command(about = "List catalog offers for an instance type with their breakeven month")]
    Offers(OffersArgs),
    #[command(about = "Split a monthly demand forecast into reserved and on-demand instances")]
    Forecast(ForecastArgs),
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Recommend(_) => "recommend",
            Self::Offers(_) => "offers",
            Self::Forecast(_) => "forecast",
            Self::Config => "config",
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config.clone(),
        require_file: cli.config.is_some(),
        overrides: ConfigOverrides { log_level: cli.log_level, ..ConfigOverrides::default() },
    };
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            let result = CommandResult::failure(
                cli.command.name(),
                "config_validation",
                error.to_string(),
                EXIT_CONFIG,
            );
            println!("{}", result.output);
            return ExitCode::from(result.exit_code);
        }
    };
    init_logging(&config.logging);

    let result = match cli.command {
        Command::Recommend(args) => commands::recommend::run(&config, args),
        Command::Offers(args) => commands::offers::run(&config, args),
        Command::Forecast(args) => commands::forecast::run(&config, args),
        Command::Config => CommandResult {
            exit_code: 0,
            output: commands::config::run(&config, cli.config.as_deref()),
        },
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr; stdout carries command output only.
fn init_logging(logging: &LoggingConfig) {
    use reserva_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    match logging.format {
        Compact => builder.compact().init(),
        Pretty => builder.pretty().init(),
        Json => builder.json().init(),
    }
}
