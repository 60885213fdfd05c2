use std::error::Error;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use barter_value_scanner::{
    app::Appraiser,
    domain::{compute_value, Breakdown, HeuristicEngine, ItemMetadata},
    infra::gemini::{parse_candidate, GeminiClient},
    util::{
        config::AppConfig,
        version::{version_label, APP_NAME},
    },
};

#[derive(Parser)]
#[command(name = "barter-value-scanner")]
#[command(about = "Estimate used-item values and score barter trades")]
struct Cli {
    /// Pricing tables JSON (overrides BARTER_PRICING_TABLES)
    #[arg(long, global = true)]
    tables: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Value an item from its metadata JSON
    Appraise {
        /// Metadata JSON file (or stdin if not provided)
        input: Option<PathBuf>,
        /// Skip the AI collaborator even when configured
        #[arg(long)]
        offline: bool,
        /// Report where the valuation came from on stderr
        #[arg(long)]
        verbose: bool,
    },
    /// Compute a value from a five-factor breakdown JSON
    Breakdown {
        /// Breakdown JSON file (or stdin if not provided)
        input: Option<PathBuf>,
    },
    /// Score a proposed trade: {offer:{value}, request:{value}, proposerCash?}
    Fairness {
        /// Trade JSON file (or stdin if not provided)
        input: Option<PathBuf>,
    },
    /// Run a stored collaborator response through the validation gate
    Check {
        /// Raw response text (code fences allowed)
        candidate: PathBuf,
        /// Metadata JSON used if the candidate is rejected
        #[arg(long)]
        metadata: Option<PathBuf>,
    },
    /// Print the version
    Version,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut config = AppConfig::from_env()?;
    if let Some(path) = cli.tables {
        config.tables_path = Some(path);
    }

    match cli.command {
        Commands::Appraise {
            input,
            offline,
            verbose,
        } => {
            let metadata: ItemMetadata = serde_json::from_str(&read_input(input)?)
                .map_err(|e| format!("Invalid metadata JSON: {}", e))?;
            let source = match (&config.gemini, offline) {
                (Some(settings), false) => Some(GeminiClient::new(settings)?),
                _ => None,
            };
            let appraiser = Appraiser::new(engine(&config)?, source);
            let appraisal = appraiser.appraise(&metadata).await?;
            if verbose {
                eprintln!("origin: {}", appraisal.origin);
            }
            print_json(&appraisal.valuation)
        }
        Commands::Breakdown { input } => {
            let raw = parse_json(&read_input(input)?)?;
            print_json(&compute_value(&Breakdown::from_json(&raw)))
        }
        Commands::Fairness { input } => {
            let raw = parse_json(&read_input(input)?)?;
            let appraiser = Appraiser::<GeminiClient>::new(engine(&config)?, None);
            print_json(&appraiser.evaluate_trade(&raw)?)
        }
        Commands::Check {
            candidate,
            metadata,
        } => {
            let text = read_input(Some(candidate))?;
            let metadata: ItemMetadata = match metadata {
                Some(path) => serde_json::from_str(&read_input(Some(path))?)
                    .map_err(|e| format!("Invalid metadata JSON: {}", e))?,
                None => ItemMetadata::default(),
            };
            let appraiser = Appraiser::<GeminiClient>::new(engine(&config)?, None);
            let appraisal = match parse_candidate(&text) {
                Ok(value) => appraiser.gate().accept(Some(&value), &metadata),
                Err(error) => appraiser.gate().recover(&error, &metadata),
            };
            eprintln!("origin: {}", appraisal.origin);
            print_json(&appraisal.valuation)
        }
        Commands::Version => {
            println!("{} {}", APP_NAME, version_label());
            Ok(())
        }
    }
}

fn engine(config: &AppConfig) -> Result<HeuristicEngine, Box<dyn Error>> {
    Ok(HeuristicEngine::new(config.load_tables()?))
}

fn read_input(input: Option<PathBuf>) -> Result<String, Box<dyn Error>> {
    if let Some(path) = input {
        Ok(std::fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read file {}: {}", path.display(), e))?)
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    }
}

fn parse_json(text: &str) -> Result<Value, Box<dyn Error>> {
    Ok(serde_json::from_str(text).map_err(|e| format!("Invalid JSON: {}", e))?)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
