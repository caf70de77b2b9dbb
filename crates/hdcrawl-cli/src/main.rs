mod export;
mod scrape;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::scrape::ScrapeArgs;

#[derive(Debug, Parser)]
#[command(name = "hdcrawl")]
#[command(about = "Home Depot category listing scraper")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape every configured request (or a single one) and write the CSV
    Scrape(ScrapeArgs),
    /// Print the department index built from the site map as JSON
    Sitemap,
    /// Print the brand index of one category as JSON
    Brands {
        #[arg(long)]
        department: String,
        #[arg(long)]
        sub_department: String,
        /// Store whose session is used to load the category page
        #[arg(long)]
        location: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = hdcrawl_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Scrape(args)) => scrape::run_scrape(&config, &args).await?,
        Some(Commands::Sitemap) => scrape::run_sitemap(&config).await?,
        Some(Commands::Brands {
            department,
            sub_department,
            location,
        }) => scrape::run_brands(&config, &department, &sub_department, location).await?,
        None => scrape::run_scrape(&config, &ScrapeArgs::default()).await?,
    }

    Ok(())
}
