//! Pagination controller: drives fetch and extract cycles for one scrape
//! request and assembles the result.
//!
//! Failures are absorbed according to position. Nothing usable on the first
//! page yields the single sentinel row; a failure on a later page ends the
//! loop and keeps what was already collected. On an incremental listing a
//! render failure keeps page one, while an expanded page without readable
//! products yields the sentinel. Only resolution failures reach the caller.

use std::time::Duration;

use hdcrawl_core::{BrowseScope, PageLayout, ResultSet, ScrapeRequest};

use crate::assemble::assemble;
use crate::client::PageFetcher;
use crate::error::{FetchError, RenderError, ResolutionError};
use crate::extract::{PageScan, ProductExtractor};
use crate::render::PageRenderer;
use crate::resolver::CategoryResolver;
use crate::types::{CategoryTarget, LoadMore, PageBatch};

/// Result offsets of the pages after the first on a paged listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageOffsets {
    /// Offset of page two.
    pub start: u32,
    pub step: u32,
}

impl Default for PageOffsets {
    fn default() -> Self {
        Self { start: 24, step: 12 }
    }
}

impl PageOffsets {
    /// Offsets to request for a listing whose pagination bar links up to
    /// `max_page`: `start, start + step, …` below `(max_page + 2) * step`.
    pub fn follow_up(self, max_page: u32) -> impl Iterator<Item = u32> {
        let step = self.step.max(1);
        let end = max_page.saturating_add(2).saturating_mul(step);
        (self.start..end).step_by(step as usize)
    }
}

/// Drives one scrape request from resolution to assembled rows.
///
/// Holds its collaborators by reference; they are built once per run and
/// shared across requests.
pub struct Crawler<'a, R, F, P> {
    resolver: &'a R,
    fetcher: &'a F,
    renderer: &'a P,
    extractor: &'a ProductExtractor,
    offsets: PageOffsets,
    inter_page_delay: Duration,
}

impl<'a, R, F, P> Crawler<'a, R, F, P>
where
    R: CategoryResolver,
    F: PageFetcher,
    P: PageRenderer,
{
    #[must_use]
    pub fn new(
        resolver: &'a R,
        fetcher: &'a F,
        renderer: &'a P,
        extractor: &'a ProductExtractor,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            renderer,
            extractor,
            offsets: PageOffsets::default(),
            inter_page_delay: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn with_offsets(mut self, offsets: PageOffsets) -> Self {
        self.offsets = offsets;
        self
    }

    /// Pause before each follow-up page request.
    #[must_use]
    pub fn with_inter_page_delay(mut self, delay: Duration) -> Self {
        self.inter_page_delay = delay;
        self
    }

    /// Scrapes `request` using the layout its sub-department implies.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError`] when the request cannot be mapped to a
    /// category page.
    pub async fn scrape(&self, request: &ScrapeRequest) -> Result<ResultSet, ResolutionError> {
        self.paginate(request, request.layout()).await
    }

    /// Scrapes `request` as a listing of the given layout.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError`] when the request cannot be mapped to a
    /// category page or its location is not a configured store. Fetch,
    /// extraction and render failures never surface here.
    pub async fn paginate(
        &self,
        request: &ScrapeRequest,
        layout: PageLayout,
    ) -> Result<ResultSet, ResolutionError> {
        tracing::info!(
            department = %request.department,
            sub_department = %request.sub_department,
            brand = %request.brand,
            location = %request.location,
            ?layout,
            "scraping"
        );

        let target = self.resolver.resolve(request).await?;

        let Some(scan) = self.first_page(request, &target.page1_url).await? else {
            tracing::info!(
                brand = %request.brand,
                location = %request.location,
                "no items on display"
            );
            return Ok(ResultSet::empty_result(request));
        };

        let batch = match layout {
            PageLayout::Paged => self.follow_pages(request, &target, scan).await,
            PageLayout::IncrementalLoad => {
                let Some(batch) = self.expand(request, &target, scan).await else {
                    tracing::info!(
                        brand = %request.brand,
                        location = %request.location,
                        "no items on display after expansion"
                    );
                    return Ok(ResultSet::empty_result(request));
                };
                batch
            }
        };

        let result = assemble(request, &batch);
        tracing::info!(
            brand = %request.brand,
            location = %request.location,
            rows = result.len(),
            "scrape complete"
        );
        Ok(result)
    }

    /// Fetches and scans page one. `None` means nothing usable was found.
    async fn first_page(
        &self,
        request: &ScrapeRequest,
        url: &str,
    ) -> Result<Option<PageScan>, ResolutionError> {
        let page = match self
            .fetcher
            .fetch(url, request.location, BrowseScope::StoreOnly)
            .await
        {
            Ok(page) => page,
            Err(FetchError::UnknownStore(id)) => return Err(ResolutionError::UnknownStore(id)),
            Err(e) => {
                tracing::warn!(url, error = %e, "first page could not be fetched");
                return Ok(None);
            }
        };

        match self.extractor.scan(&page) {
            Ok(scan) if scan.batch.is_empty() => Ok(None),
            Ok(scan) => Ok(Some(scan)),
            Err(e) => {
                tracing::warn!(url, error = %e, "first page has no readable products");
                Ok(None)
            }
        }
    }

    async fn follow_pages(
        &self,
        request: &ScrapeRequest,
        target: &CategoryTarget,
        scan: PageScan,
    ) -> PageBatch {
        let mut accumulated = scan.batch;
        let Some(max_page) = scan.max_page else {
            return accumulated;
        };
        let Some(template) = target.page_template.as_ref() else {
            tracing::debug!(url = %target.page1_url, "paged listing without a page template; keeping page one");
            return accumulated;
        };

        for offset in self.offsets.follow_up(max_page) {
            if !self.inter_page_delay.is_zero() {
                tokio::time::sleep(self.inter_page_delay).await;
            }

            let url = template.url_for_offset(offset);
            let page = match self
                .fetcher
                .fetch(&url, request.location, BrowseScope::StoreOnly)
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(url, offset, error = %e, "page fetch failed; keeping earlier pages");
                    break;
                }
            };
            match self.extractor.extract(&page) {
                Ok(batch) => {
                    tracing::debug!(url, offset, products = batch.len(), "page extracted");
                    accumulated.append(batch);
                }
                Err(e) => {
                    tracing::warn!(url, offset, error = %e, "page extraction failed; keeping earlier pages");
                    break;
                }
            }
        }

        accumulated
    }

    /// Page one, or the fully expanded listing when a load-more control is
    /// present. `None` means the expanded page had no readable products.
    async fn expand(
        &self,
        request: &ScrapeRequest,
        target: &CategoryTarget,
        scan: PageScan,
    ) -> Option<PageBatch> {
        let url = target.page1_url.as_str();
        let total = match scan.load_more {
            LoadMore::Absent => return Some(scan.batch),
            LoadMore::Present { total: None } => {
                tracing::warn!(url, "load-more control without a result count; keeping first page");
                return Some(scan.batch);
            }
            LoadMore::Present { total: Some(total) } => total,
        };

        let page = match self.renderer.render_fully(url, request.location, total).await {
            Ok(page) => page,
            Err(RenderError::Unavailable) => {
                tracing::info!(url, total, "page expansion disabled; keeping first page");
                return Some(scan.batch);
            }
            Err(e) => {
                tracing::warn!(url, total, error = %e, "page expansion failed; keeping first page");
                return Some(scan.batch);
            }
        };

        match self.extractor.extract(&page) {
            Ok(expanded) if !expanded.is_empty() => {
                tracing::debug!(url, total, products = expanded.len(), "expanded page extracted");
                Some(expanded)
            }
            Ok(_) => {
                tracing::warn!(url, "expanded page has no products");
                None
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "expanded page has no readable products");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follow_up_offsets_for_three_pages() {
        let offsets: Vec<u32> = PageOffsets::default().follow_up(3).collect();
        assert_eq!(offsets, vec![24, 36, 48]);
    }

    #[test]
    fn follow_up_offsets_for_six_pages() {
        let offsets: Vec<u32> = PageOffsets::default().follow_up(6).collect();
        assert_eq!(offsets, vec![24, 36, 48, 60, 72, 84]);
    }

    #[test]
    fn lone_page_link_still_probes_one_offset() {
        assert_eq!(PageOffsets::default().follow_up(1).collect::<Vec<_>>(), vec![24]);
    }

    #[test]
    fn custom_offsets() {
        let offsets = PageOffsets { start: 24, step: 24 };
        assert_eq!(offsets.follow_up(3).collect::<Vec<_>>(), vec![24, 48, 72, 96]);
    }

    #[test]
    fn zero_step_is_clamped() {
        let offsets = PageOffsets { start: 0, step: 0 };
        assert_eq!(offsets.follow_up(1).collect::<Vec<_>>(), vec![0, 1, 2]);
    }
}
