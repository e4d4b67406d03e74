#![forbid(unsafe_code)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lineup_history::config::{Config, DEFAULT_CONFIG_FILE};
use lineup_history::{HistoryError, history_cmd};

#[derive(Parser, Debug)]
#[command(name = "lineup-history")]
#[command(about = "Type 2 history of festival lineup scrapes", long_about = None)]
struct Cli {
    /// Enable verbose logging (or set LINEUP_HISTORY_LOG)
    #[arg(long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fold new lineup scrapes into the history file
    Generate,

    /// Print summary counts for the history file
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export the history as CSV
    ExportCsv {
        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Append a scrape to the lineup file
    Ingest {
        /// Festival name
        #[arg(long)]
        festival: String,
        /// Festival year
        #[arg(long)]
        year: i32,
        /// JSON file holding a list of artist observations
        #[arg(long)]
        artists: PathBuf,
        /// Scrape time, RFC 3339 (defaults to now)
        #[arg(long)]
        scrape_ts: Option<String>,
    },
}

fn init_tracing(verbose: bool) {
    let env = std::env::var("LINEUP_HISTORY_LOG").unwrap_or_else(|_| {
        if verbose { "lineup_history=debug".to_string() } else { "lineup_history=info".to_string() }
    });
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_env_filter(EnvFilter::new(env))
        .try_init();
}

fn run(cli: Cli) -> Result<(), HistoryError> {
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Generate => {
            if let Some(stats) = history_cmd::generate(&config)? {
                println!("\nStats:\n{stats}");
            }
        }
        Commands::Stats { json } => {
            let stats = history_cmd::stats(&config)?;
            if json {
                let text = serde_json::to_string_pretty(&stats)
                    .map_err(|e| HistoryError::Message(e.to_string()))?;
                println!("{text}");
            } else {
                println!("{stats}");
            }
        }
        Commands::ExportCsv { out } => {
            history_cmd::export_csv(&config, out.as_deref())?;
        }
        Commands::Ingest { festival, year, artists, scrape_ts } => {
            history_cmd::ingest(&config, festival, year, artists, scrape_ts)?;
        }
    }
    Ok(())
}

fn main() {
    color_eyre::install().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}
