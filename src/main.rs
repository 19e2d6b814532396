//! pricetrail - incremental price-history scraper for e-commerce category
//! listings behind a scripted browser session.

use anyhow::Result;
use clap::{Parser, Subcommand};
use pricetrail::config::RunConfig;
use pricetrail::format::{Formatter, OutputFormat};
use pricetrail::store::DedupStore;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pricetrail",
    version,
    about = "Incremental price-history scraper for paginated category listings",
    long_about = "Walks configured e-commerce category listings through a scripted browser \
                  session, deduplicating records by (url, price) and persisting after every page."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scrape session against a real browser
    #[cfg(feature = "chromium")]
    #[command(alias = "r")]
    Run,

    /// Validate the configuration and list the category jobs it describes
    Plan,

    /// Print the persisted product snapshot
    #[command(alias = "e")]
    Export {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let config = RunConfig::load(cli.config.as_deref())?.with_env();

    match cli.command {
        #[cfg(feature = "chromium")]
        Commands::Run => {
            config.validate()?;

            let driver = pricetrail::chromium::ChromiumDriver::launch(&config).await?;
            let session = pricetrail::session::SessionOrchestrator::new(driver, config);
            let summary = session.run().await?;

            println!(
                "{} job(s) ({} failed), {} new record(s), {} total",
                summary.jobs, summary.failed_jobs, summary.new_records, summary.total_records
            );

            session.into_driver().close().await?;
        }

        Commands::Plan => {
            config.validate()?;

            for site in &config.websites {
                println!("{} ({})", site.name, site.url);
                for category in &site.categories {
                    println!("  - {} [{}]", category.name, category.kind);
                }
            }
        }

        Commands::Export { format } => {
            let store = DedupStore::load_from(&config.products_path)?;
            let formatter = Formatter::new(format);
            println!("{}", formatter.format_records(store.snapshot()));
        }
    }

    Ok(())
}
