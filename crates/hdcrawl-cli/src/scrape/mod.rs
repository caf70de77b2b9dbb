//! Scrape command handlers for the CLI.
//!
//! Every handler builds the shared site collaborators once, then works
//! through them by reference. Per-request resolution failures are logged and
//! skipped so one bad request does not abort the batch.

mod runner;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use hdcrawl_core::{AppConfig, ScrapeRequest, StoreId};
use hdcrawl_scraper::{Crawler, PageOffsets, SiteCatalog};

use runner::{run_batch, Site};

/// Arguments of the `scrape` command.
#[derive(Debug, Default, Args)]
pub struct ScrapeArgs {
    /// Requests file to run (defaults to `HDCRAWL_REQUESTS_PATH`)
    #[arg(long, conflicts_with = "department")]
    pub(crate) requests: Option<PathBuf>,

    /// CSV file to write (defaults to `HDCRAWL_OUTPUT_PATH`)
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,

    /// Run a single request for this department instead of a requests file
    #[arg(long, requires_all = ["sub_department", "brand", "location"])]
    pub(crate) department: Option<String>,

    #[arg(long, requires = "department")]
    pub(crate) sub_department: Option<String>,

    #[arg(long, requires = "department")]
    pub(crate) brand: Option<String>,

    /// Store ZIP code of the single request
    #[arg(long, requires = "department")]
    pub(crate) location: Option<u32>,
}

impl ScrapeArgs {
    /// The request described by the single-request flags, if they were given.
    pub(crate) fn single_request(&self) -> Option<ScrapeRequest> {
        match (
            &self.department,
            &self.sub_department,
            &self.brand,
            self.location,
        ) {
            (Some(department), Some(sub_department), Some(brand), Some(location)) => Some(
                ScrapeRequest::new(department, sub_department, brand, StoreId(location)),
            ),
            _ => None,
        }
    }

    fn load_requests(&self, config: &AppConfig) -> anyhow::Result<Vec<ScrapeRequest>> {
        if let Some(request) = self.single_request() {
            return Ok(vec![request]);
        }
        let path = self.requests.as_ref().unwrap_or(&config.requests_path);
        let file = hdcrawl_core::load_requests(path)
            .with_context(|| format!("failed to load requests from {}", path.display()))?;
        Ok(file.requests)
    }
}

/// Runs a batch of scrape requests and writes every collected row to one CSV
/// file, replacing any previous output.
///
/// # Errors
///
/// Returns an error if the configuration files cannot be loaded, the site map
/// cannot be fetched, or the CSV cannot be written. Failures of individual
/// requests are logged and skipped.
pub(crate) async fn run_scrape(config: &AppConfig, args: &ScrapeArgs) -> anyhow::Result<()> {
    let requests = args.load_requests(config)?;
    if requests.is_empty() {
        println!("no scrape requests configured; nothing to do");
        return Ok(());
    }

    let site = Site::connect(config).await?;
    let index = site.category_index().await?;
    let catalog = SiteCatalog::new(&index, &site.aliases, &site.fetcher, site.base.clone());
    let crawler = Crawler::new(&catalog, &site.fetcher, &site.renderer, &site.extractor)
        .with_offsets(PageOffsets {
            start: config.page_offset_start,
            step: config.page_offset_step,
        })
        .with_inter_page_delay(Duration::from_millis(config.inter_page_delay_ms));

    let outcome = run_batch(&crawler, &requests).await;

    let output = args.output.as_ref().unwrap_or(&config.output_path);
    crate::export::write_csv(output, &outcome.rows)?;

    println!(
        "wrote {} rows for {} of {} requests to {} ({} with no items on display, {} skipped)",
        outcome.rows.len(),
        outcome.completed,
        requests.len(),
        output.display(),
        outcome.empty,
        outcome.skipped
    );
    Ok(())
}

/// Prints the department index as JSON.
///
/// # Errors
///
/// Returns an error if the site map cannot be fetched.
pub(crate) async fn run_sitemap(config: &AppConfig) -> anyhow::Result<()> {
    let site = Site::connect(config).await?;
    let index = site.category_index().await?;
    println!("{}", serde_json::to_string_pretty(&index)?);
    Ok(())
}

/// Prints the brand index of one category as JSON.
///
/// # Errors
///
/// Returns an error if the site map cannot be fetched or the category's brand
/// list cannot be loaded.
pub(crate) async fn run_brands(
    config: &AppConfig,
    department: &str,
    sub_department: &str,
    location: u32,
) -> anyhow::Result<()> {
    let site = Site::connect(config).await?;
    let index = site.category_index().await?;
    let catalog = SiteCatalog::new(&index, &site.aliases, &site.fetcher, site.base.clone());
    let brands = catalog
        .brand_index(department, sub_department, StoreId(location))
        .await
        .with_context(|| format!("failed to load brands for {department} / {sub_department}"))?;
    println!("{}", serde_json::to_string_pretty(&brands)?);
    Ok(())
}
