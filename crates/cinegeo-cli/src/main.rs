mod nearby;
mod position;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "cinegeo-cli")]
#[command(about = "Find cinemas and cultural venues near a position, with showtimes")]
struct Cli {
    /// Overrides `CINEGEO_SOURCES_PATH`.
    #[arg(long, global = true)]
    sources: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search for POIs around a center or the last recorded position.
    Nearby {
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,
        #[arg(long)]
        radius_km: Option<f64>,
        #[arg(long)]
        max_results: Option<usize>,
        #[arg(long, default_value = cinegeo_sources::nearby::DEFAULT_CATEGORY)]
        category: String,
        /// Attach catalog showtimes to the nearest results.
        #[arg(long)]
        enrich: bool,
        #[arg(long)]
        enrich_limit: Option<usize>,
        /// Showtime date (YYYY-MM-DD); defaults to today in the reference zone.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Manage the recorded position log.
    Position {
        #[command(subcommand)]
        command: PositionCommands,
    },
}

#[derive(Debug, Subcommand)]
enum PositionCommands {
    /// Append a position fix stamped with the current time.
    Record {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        /// Reported accuracy in metres.
        #[arg(long)]
        accuracy: Option<f64>,
    },
    /// Print the most recent valid fix.
    Latest,
    /// Print every recorded fix with a count.
    List,
    /// Remove every recorded fix.
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = cinegeo_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(path) = cli.sources {
        config.sources_path = path;
    }
    let log = Arc::new(cinegeo_core::PositionLog::new(
        config.position_log_path.clone(),
    ));

    match cli.command {
        Commands::Nearby {
            lat,
            lon,
            radius_km,
            max_results,
            category,
            enrich,
            enrich_limit,
            date,
        } => {
            let request = nearby::build_request(
                lat,
                lon,
                radius_km,
                max_results,
                category,
                enrich,
                enrich_limit,
                date,
            )?;
            nearby::run_nearby(&config, log, request).await?;
        }
        Commands::Position { command } => match command {
            PositionCommands::Record { lat, lon, accuracy } => {
                position::run_record(&log, lat, lon, accuracy)?;
            }
            PositionCommands::Latest => position::run_latest(&log)?,
            PositionCommands::List => position::run_list(&log)?,
            PositionCommands::Clear => position::run_clear(&log)?,
        },
    }

    Ok(())
}
