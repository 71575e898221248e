mod resolve;
mod scrape;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "nzhp")]
#[command(about = "New Zealand house price estimate scraper")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape every target and print results, metrics and the consensus as JSON
    Scrape {
        /// Targets file (defaults to `NZHP_TARGETS_PATH`)
        #[arg(long)]
        targets: Option<PathBuf>,
        /// Scrape up to this many sites at once
        #[arg(long)]
        parallel: Option<usize>,
        /// Abandon sites still running after this many seconds
        #[arg(long)]
        budget_secs: Option<u64>,
        /// Range-check prices and their ordering
        #[arg(long)]
        validate: bool,
        /// Seed for the consensus simulation
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Find a site's property page for an address
    Resolve {
        #[arg(long)]
        site: String,
        /// Search results URL with a `{query}` placeholder
        #[arg(long)]
        query_url: Option<String>,
        address: String,
    },
    /// Print the parsed components of an address
    ParseAddress { address: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = nzhp_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Scrape {
            targets,
            parallel,
            budget_secs,
            validate,
            seed,
        }) => {
            let args = scrape::ScrapeArgs {
                targets,
                parallel,
                budget_secs,
                validate,
                seed,
            };
            scrape::run_scrape(&config, &args).await?;
        }
        Some(Commands::Resolve {
            site,
            query_url,
            address,
        }) => resolve::run_resolve(&config, &site, &address, query_url.as_deref()).await?,
        Some(Commands::ParseAddress { address }) => resolve::run_parse_address(&address)?,
        None => println!("nzhp: no command given, see --help"),
    }

    Ok(())
}
