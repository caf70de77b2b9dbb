//! Shared site collaborators and the sequential batch loop.

use anyhow::Context;
use hdcrawl_core::{AppConfig, BrandAliases, ProductRow, ResultSet, ScrapeRequest};
use hdcrawl_scraper::{
    build_category_index, CategoryIndex, CategoryResolver, Crawler, HttpPageFetcher,
    IdentityPool, PageFetcher, PageRenderer, ProductExtractor, WebDriverRenderer,
};
use url::Url;

/// Everything a run needs to talk to the site, built once from configuration.
pub(crate) struct Site {
    pub base: Url,
    pub site_map_url: String,
    pub aliases: BrandAliases,
    pub fetcher: HttpPageFetcher,
    /// `None` disables load-more expansion.
    pub renderer: Option<WebDriverRenderer>,
    pub extractor: ProductExtractor,
}

impl Site {
    /// Loads the store file, fetches the proxy list and builds the HTTP
    /// fetcher and (when an endpoint is configured) the WebDriver renderer.
    pub(crate) async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let base = Url::parse(&config.site_base_url)
            .with_context(|| format!("invalid site base URL {}", config.site_base_url))?;

        let (stores, aliases) = hdcrawl_core::load_stores(&config.stores_path)
            .with_context(|| {
                format!("failed to load stores from {}", config.stores_path.display())
            })?
            .into_parts();
        tracing::info!(stores = stores.len(), "loaded store directory");

        let identity = IdentityPool::load(
            config.proxy_list_url.as_deref(),
            &config.user_agent,
            config.request_timeout_secs,
        )
        .await;

        let renderer = match config.webdriver_url.as_deref() {
            Some(endpoint) => Some(
                WebDriverRenderer::new(
                    endpoint,
                    stores.clone(),
                    config.request_timeout_secs,
                    config.load_more_click_delay_ms,
                    config.load_more_page_size,
                )
                .context("failed to build WebDriver renderer")?,
            ),
            None => {
                tracing::info!("no WebDriver endpoint configured; load-more expansion disabled");
                None
            }
        };

        let fetcher = HttpPageFetcher::new(
            stores,
            identity,
            config.request_timeout_secs,
            config.proxy_attempts,
            config.retry_backoff_base_ms,
        )
        .context("failed to build HTTP client")?;

        Ok(Self {
            extractor: ProductExtractor::new(base.clone()),
            base,
            site_map_url: config.site_map_url.clone(),
            aliases,
            fetcher,
            renderer,
        })
    }

    /// Fetches the site map and builds the department index.
    pub(crate) async fn category_index(&self) -> anyhow::Result<CategoryIndex> {
        build_category_index(&self.fetcher, &self.site_map_url, &self.base)
            .await
            .with_context(|| format!("failed to load site map {}", self.site_map_url))
    }
}

/// Rows of a batch run plus per-request tallies.
#[derive(Debug, Default)]
pub(crate) struct BatchOutcome {
    pub rows: Vec<ProductRow>,
    /// Requests that produced a result set, sentinel included.
    pub completed: usize,
    /// Requests whose result set is the sentinel row.
    pub empty: usize,
    /// Requests dropped on a resolution failure.
    pub skipped: usize,
}

/// Scrapes `requests` one after another and concatenates their rows in
/// request order.
pub(crate) async fn run_batch<R, F, P>(
    crawler: &Crawler<'_, R, F, P>,
    requests: &[ScrapeRequest],
) -> BatchOutcome
where
    R: CategoryResolver,
    F: PageFetcher,
    P: PageRenderer,
{
    let mut sets: Vec<ResultSet> = Vec::with_capacity(requests.len());
    let mut skipped = 0;

    for (idx, request) in requests.iter().enumerate() {
        match crawler.scrape(request).await {
            Ok(set) => sets.push(set),
            Err(e) => {
                tracing::error!(
                    request = idx,
                    department = %request.department,
                    sub_department = %request.sub_department,
                    brand = %request.brand,
                    location = %request.location,
                    error = %e,
                    "skipping request"
                );
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        tracing::warn!(skipped, total = requests.len(), "some requests could not be resolved");
    }

    let completed = sets.len();
    let empty = sets.iter().filter(|s| s.is_empty_result()).count();
    BatchOutcome {
        rows: ResultSet::concat(sets),
        completed,
        empty,
        skipped,
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
