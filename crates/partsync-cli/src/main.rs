use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "partsync")]
#[command(about = "Supplier catalog sync and dropship automation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape all suppliers, price, diff, download images, persist the catalog
    FullSync {
        /// Search query forwarded to each supplier feed
        #[arg(long, default_value = "")]
        query: String,

        /// Cap on records taken from each supplier
        #[arg(long, default_value_t = 50)]
        max_per_supplier: usize,
    },
    /// Scrape and price only; prints the result and writes nothing
    ProductsOnly {
        /// Search query forwarded to each supplier feed
        #[arg(long, default_value = "")]
        query: String,

        /// Cap on records taken from each supplier
        #[arg(long, default_value_t = 50)]
        max_per_supplier: usize,
    },
    /// Re-download images for the stored catalog and prune stale files
    ImagesOnly {
        /// Concurrent downloads per batch (defaults to the configured value)
        #[arg(long)]
        max_concurrent: Option<usize>,
    },
    /// Small bounded sync against the configured suppliers, in memory only
    Test {
        /// Cap on records taken from each supplier
        #[arg(long, default_value_t = 5)]
        max_per_supplier: usize,
    },
    /// Run full syncs on the configured interval until interrupted
    Schedule,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = partsync_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::debug!(env = %config.env, "configuration loaded");

    let cli = Cli::parse();
    match cli.command {
        Commands::FullSync {
            query,
            max_per_supplier,
        } => commands::run_full_sync(&config, &query, max_per_supplier).await,
        Commands::ProductsOnly {
            query,
            max_per_supplier,
        } => commands::run_products_only(&config, &query, max_per_supplier).await,
        Commands::ImagesOnly { max_concurrent } => {
            commands::run_images_only(&config, max_concurrent).await
        }
        Commands::Test { max_per_supplier } => commands::run_test(&config, max_per_supplier).await,
        Commands::Schedule => commands::run_schedule(&config).await,
    }
}
