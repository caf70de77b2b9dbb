//! Pagination controller tests against in-memory fetch, resolve and render
//! capabilities.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Write as _;

use hdcrawl_core::{
    BrowseScope, PageLayout, ResultSet, ScrapeRequest, StoreId, NO_ITEMS_ON_DISPLAY,
};
use url::Url;

use hdcrawl_scraper::{
    CategoryResolver, CategoryTarget, Crawler, FetchError, PageFetcher, PageRenderer,
    PageTemplate, ProductExtractor, RawPage, RenderError, ResolutionError, ScraperError,
};

const PAGE1: &str = "https://www.homedepot.com/b/Appliances-Dishwashers/LG/N-5yc1vZc3poZ6u";
const MATTRESS_PAGE1: &str =
    "https://www.homedepot.com/b/Furniture-Bedroom-Furniture-Mattresses/Sealy/N-5yc1vZc7oeZ1z0t";
const KNOWN_STORES: [StoreId; 2] = [StoreId(10022), StoreId(75209)];

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

struct Listing<'a> {
    tag: &'a str,
    products: usize,
    max_page: Option<u32>,
    load_more_total: Option<u32>,
}

impl<'a> Listing<'a> {
    fn new(tag: &'a str, products: usize) -> Self {
        Self {
            tag,
            products,
            max_page: None,
            load_more_total: None,
        }
    }

    fn pages(mut self, max_page: u32) -> Self {
        self.max_page = Some(max_page);
        self
    }

    fn load_more(mut self, total: u32) -> Self {
        self.load_more_total = Some(total);
        self
    }

    fn html(&self) -> String {
        let mut html = String::from(r#"<html><body><div id="products">"#);
        for i in 0..self.products {
            let _ = write!(
                html,
                r#"<div class="pod-inner">
  <a data-pod-type="pr" href="/p/{tag}/{i}">
    <span class="pod-plp__brand-name">LG Electronics</span>
    {tag}-{i}
  </a>
  <div class="price__numbers">${dollars} 00</div>
  <div class="info__savings">Save $10.00</div>
</div>"#,
                tag = self.tag,
                dollars = 100 + i,
            );
        }
        html.push_str("</div>");
        if let Some(max_page) = self.max_page {
            html.push_str(r#"<ul class="hd-pagination">"#);
            for n in 1..=max_page {
                let _ = write!(html, r#"<li><a class="hd-pagination__link">{n}</a></li>"#);
            }
            html.push_str("</ul>");
        }
        if let Some(total) = self.load_more_total {
            let _ = write!(
                html,
                r#"<div id="load-more"><span>{}</span><span>{total}</span><button class="js-load-more-btn">Load More</button></div>"#,
                self.products
            );
        }
        html.push_str("</body></html>");
        html
    }
}

fn offset_url(base: &str, offset: u32) -> String {
    PageTemplate::new(base).unwrap().url_for_offset(offset)
}

#[derive(Default)]
struct MapResolver {
    targets: HashMap<String, CategoryTarget>,
}

impl MapResolver {
    fn with(mut self, brand: &str, page1_url: &str, paged: bool) -> Self {
        self.targets.insert(
            brand.to_string(),
            CategoryTarget {
                page1_url: page1_url.to_string(),
                page_template: paged.then(|| PageTemplate::new(page1_url).unwrap()),
            },
        );
        self
    }
}

impl CategoryResolver for MapResolver {
    async fn resolve(&self, request: &ScrapeRequest) -> Result<CategoryTarget, ResolutionError> {
        self.targets
            .get(&request.brand)
            .cloned()
            .ok_or_else(|| ResolutionError::UnknownBrand {
                brand: request.brand.clone(),
                department: request.department.clone(),
                sub_department: request.sub_department.clone(),
            })
    }
}

/// Serves canned pages by URL; any other URL fails as if every attempt had
/// been used up.
#[derive(Default)]
struct MockFetcher {
    pages: HashMap<String, String>,
    calls: RefCell<Vec<(String, BrowseScope)>>,
}

impl MockFetcher {
    fn page(mut self, url: &str, html: String) -> Self {
        self.pages.insert(url.to_string(), html);
        self
    }

    fn requested(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(u, _)| u.clone()).collect()
    }
}

impl PageFetcher for MockFetcher {
    async fn fetch(
        &self,
        url: &str,
        location: StoreId,
        scope: BrowseScope,
    ) -> Result<RawPage, FetchError> {
        self.calls.borrow_mut().push((url.to_string(), scope));
        if !KNOWN_STORES.contains(&location) {
            return Err(FetchError::UnknownStore(location));
        }
        self.pages
            .get(url)
            .map(|html| RawPage::new(url, html.clone()))
            .ok_or_else(|| FetchError::Exhausted {
                url: url.to_string(),
                attempts: 6,
                source: ScraperError::UnexpectedStatus {
                    status: 503,
                    url: url.to_string(),
                },
            })
    }
}

#[derive(Default)]
struct MockRenderer {
    html: Option<String>,
    calls: RefCell<Vec<(String, StoreId, u32)>>,
}

impl PageRenderer for MockRenderer {
    async fn render_fully(
        &self,
        url: &str,
        location: StoreId,
        target_count: u32,
    ) -> Result<RawPage, RenderError> {
        self.calls
            .borrow_mut()
            .push((url.to_string(), location, target_count));
        match &self.html {
            Some(html) => Ok(RawPage::new(url, html.clone())),
            None => Err(RenderError::WebDriver {
                command: "POST /session".to_string(),
                reason: "chrome not reachable".to_string(),
            }),
        }
    }
}

fn extractor() -> ProductExtractor {
    ProductExtractor::new(Url::parse("https://www.homedepot.com").unwrap())
}

fn dishwashers(location: u32) -> ScrapeRequest {
    ScrapeRequest::new("Appliances", "Dishwashers", "LG", StoreId(location))
}

fn mattresses() -> ScrapeRequest {
    ScrapeRequest::new("Bedroom Furniture", "Mattresses", "Sealy", StoreId(75209))
}

fn descriptions(set: &ResultSet) -> Vec<String> {
    set.rows().iter().map(|r| r.description.clone()).collect()
}

fn assert_sentinel(set: &ResultSet, request: &ScrapeRequest) {
    assert_eq!(set.len(), 1, "expected exactly one sentinel row: {set:?}");
    assert!(set.is_empty_result());
    let row = &set.rows()[0];
    assert_eq!(row.description, NO_ITEMS_ON_DISPLAY);
    assert_eq!(row.department, request.department);
    assert_eq!(row.sub_department, request.sub_department);
    assert_eq!(row.location, request.location);
}

// ---------------------------------------------------------------------------
// Paged layout
// ---------------------------------------------------------------------------

#[tokio::test]
async fn paged_single_page_without_pagination_links() {
    let resolver = MapResolver::default().with("LG", PAGE1, true);
    let fetcher = MockFetcher::default().page(PAGE1, Listing::new("p1", 3).html());
    let renderer = MockRenderer::default();
    let extractor = extractor();
    let crawler = Crawler::new(&resolver, &fetcher, &renderer, &extractor);

    let set = crawler.scrape(&dishwashers(10022)).await.unwrap();

    assert_eq!(descriptions(&set), vec!["p1-0", "p1-1", "p1-2"]);
    assert_eq!(fetcher.calls.borrow().len(), 1);
    assert_eq!(fetcher.calls.borrow()[0].1, BrowseScope::StoreOnly);
}

#[tokio::test]
async fn paged_collects_every_indicated_page_in_order() {
    let resolver = MapResolver::default().with("LG", PAGE1, true);
    let fetcher = MockFetcher::default()
        .page(PAGE1, Listing::new("p1", 3).pages(3).html())
        .page(&offset_url(PAGE1, 24), Listing::new("p2", 2).pages(3).html())
        .page(&offset_url(PAGE1, 36), Listing::new("p3", 2).pages(3).html())
        .page(&offset_url(PAGE1, 48), Listing::new("p4", 0).pages(3).html());
    let renderer = MockRenderer::default();
    let extractor = extractor();
    let crawler = Crawler::new(&resolver, &fetcher, &renderer, &extractor);
    let request = dishwashers(75209);

    let set = crawler.scrape(&request).await.unwrap();

    assert_eq!(
        descriptions(&set),
        vec!["p1-0", "p1-1", "p1-2", "p2-0", "p2-1", "p3-0", "p3-1"]
    );
    for row in set.rows() {
        assert_eq!(row.department, "Appliances");
        assert_eq!(row.sub_department, "Dishwashers");
        assert_eq!(row.location, StoreId(75209));
    }
    assert_eq!(
        fetcher.requested(),
        vec![
            PAGE1.to_string(),
            offset_url(PAGE1, 24),
            offset_url(PAGE1, 36),
            offset_url(PAGE1, 48),
        ]
    );
    assert!(fetcher
        .calls
        .borrow()
        .iter()
        .all(|(_, scope)| *scope == BrowseScope::StoreOnly));
}

#[tokio::test]
async fn paged_failure_on_page_three_keeps_pages_one_and_two() {
    let resolver = MapResolver::default().with("LG", PAGE1, true);
    let fetcher = MockFetcher::default()
        .page(PAGE1, Listing::new("p1", 3).pages(3).html())
        .page(&offset_url(PAGE1, 24), Listing::new("p2", 2).pages(3).html());
    let renderer = MockRenderer::default();
    let extractor = extractor();
    let crawler = Crawler::new(&resolver, &fetcher, &renderer, &extractor);

    let set = crawler.scrape(&dishwashers(10022)).await.unwrap();

    assert_eq!(set.len(), 5);
    assert!(!set.rows().iter().any(|r| r.is_empty_result()));
    assert_eq!(descriptions(&set)[3..], ["p2-0", "p2-1"]);
    // The loop stops at the failed page; later offsets are never requested.
    assert_eq!(fetcher.requested().len(), 3);
}

#[tokio::test]
async fn paged_unreadable_later_page_stops_the_loop() {
    let resolver = MapResolver::default().with("LG", PAGE1, true);
    let fetcher = MockFetcher::default()
        .page(PAGE1, Listing::new("p1", 2).pages(4).html())
        .page(&offset_url(PAGE1, 24), "<html><body>Access Denied</body></html>".to_string())
        .page(&offset_url(PAGE1, 36), Listing::new("p3", 2).html());
    let renderer = MockRenderer::default();
    let extractor = extractor();
    let crawler = Crawler::new(&resolver, &fetcher, &renderer, &extractor);

    let set = crawler.scrape(&dishwashers(10022)).await.unwrap();

    assert_eq!(descriptions(&set), vec!["p1-0", "p1-1"]);
    assert_eq!(fetcher.requested().len(), 2);
}

#[tokio::test]
async fn paged_rerun_yields_identical_result() {
    let resolver = MapResolver::default().with("LG", PAGE1, true);
    let fetcher = MockFetcher::default()
        .page(PAGE1, Listing::new("p1", 4).pages(2).html())
        .page(&offset_url(PAGE1, 24), Listing::new("p2", 4).pages(2).html())
        .page(&offset_url(PAGE1, 36), Listing::new("p3", 1).pages(2).html());
    let renderer = MockRenderer::default();
    let extractor = extractor();
    let crawler = Crawler::new(&resolver, &fetcher, &renderer, &extractor);
    let request = dishwashers(10022);

    let first = crawler.scrape(&request).await.unwrap();
    let second = crawler.scrape(&request).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 9);
}

#[tokio::test]
async fn paged_first_page_without_products_is_sentinel() {
    let resolver = MapResolver::default().with("LG", PAGE1, true);
    let fetcher = MockFetcher::default().page(PAGE1, Listing::new("p1", 0).pages(3).html());
    let renderer = MockRenderer::default();
    let extractor = extractor();
    let crawler = Crawler::new(&resolver, &fetcher, &renderer, &extractor);
    let request = dishwashers(10022);

    let set = crawler.scrape(&request).await.unwrap();

    assert_sentinel(&set, &request);
    assert_eq!(fetcher.requested().len(), 1);
}

#[tokio::test]
async fn first_page_fetch_failure_is_sentinel() {
    let resolver = MapResolver::default().with("LG", PAGE1, true);
    let fetcher = MockFetcher::default();
    let renderer = MockRenderer::default();
    let extractor = extractor();
    let crawler = Crawler::new(&resolver, &fetcher, &renderer, &extractor);
    let request = dishwashers(10022);

    let set = crawler.scrape(&request).await.unwrap();

    assert_sentinel(&set, &request);
}

#[tokio::test]
async fn first_page_without_product_container_is_sentinel() {
    let resolver = MapResolver::default().with("LG", PAGE1, true);
    let fetcher = MockFetcher::default()
        .page(PAGE1, "<html><body>Store closed</body></html>".to_string());
    let renderer = MockRenderer::default();
    let extractor = extractor();
    let crawler = Crawler::new(&resolver, &fetcher, &renderer, &extractor);
    let request = dishwashers(10022);

    let set = crawler.scrape(&request).await.unwrap();

    assert_sentinel(&set, &request);
}

// ---------------------------------------------------------------------------
// Incremental-load layout
// ---------------------------------------------------------------------------

#[tokio::test]
async fn incremental_expansion_replaces_first_page() {
    let resolver = MapResolver::default().with("Sealy", MATTRESS_PAGE1, false);
    let fetcher = MockFetcher::default().page(
        MATTRESS_PAGE1,
        Listing::new("p1", 24).load_more(50).html(),
    );
    let renderer = MockRenderer {
        html: Some(Listing::new("all", 50).html()),
        ..MockRenderer::default()
    };
    let extractor = extractor();
    let crawler = Crawler::new(&resolver, &fetcher, &renderer, &extractor);
    let request = mattresses();

    let set = crawler.scrape(&request).await.unwrap();

    assert_eq!(set.len(), 50);
    assert!(set.rows().iter().all(|r| r.description.starts_with("all-")));
    assert_eq!(
        renderer.calls.borrow().as_slice(),
        &[(MATTRESS_PAGE1.to_string(), StoreId(75209), 50)]
    );
    assert!(set
        .rows()
        .iter()
        .all(|r| r.sub_department == "Mattresses" && r.location == StoreId(75209)));
}

#[tokio::test]
async fn incremental_without_load_more_keeps_first_page() {
    let resolver = MapResolver::default().with("Sealy", MATTRESS_PAGE1, false);
    let fetcher =
        MockFetcher::default().page(MATTRESS_PAGE1, Listing::new("p1", 7).html());
    let renderer = MockRenderer {
        html: Some(Listing::new("all", 50).html()),
        ..MockRenderer::default()
    };
    let extractor = extractor();
    let crawler = Crawler::new(&resolver, &fetcher, &renderer, &extractor);

    let set = crawler.scrape(&mattresses()).await.unwrap();

    assert_eq!(set.len(), 7);
    assert!(renderer.calls.borrow().is_empty());
}

#[tokio::test]
async fn incremental_render_failure_keeps_first_page() {
    let resolver = MapResolver::default().with("Sealy", MATTRESS_PAGE1, false);
    let fetcher = MockFetcher::default().page(
        MATTRESS_PAGE1,
        Listing::new("p1", 24).load_more(50).html(),
    );
    let renderer = MockRenderer::default();
    let extractor = extractor();
    let crawler = Crawler::new(&resolver, &fetcher, &renderer, &extractor);

    let set = crawler.scrape(&mattresses()).await.unwrap();

    assert_eq!(set.len(), 24);
    assert!(set.rows().iter().all(|r| r.description.starts_with("p1-")));
    assert_eq!(renderer.calls.borrow().len(), 1);
}

#[tokio::test]
async fn incremental_without_renderer_keeps_first_page() {
    let resolver = MapResolver::default().with("Sealy", MATTRESS_PAGE1, false);
    let fetcher = MockFetcher::default().page(
        MATTRESS_PAGE1,
        Listing::new("p1", 24).load_more(50).html(),
    );
    let renderer: Option<MockRenderer> = None;
    let extractor = extractor();
    let crawler = Crawler::new(&resolver, &fetcher, &renderer, &extractor);

    let set = crawler.scrape(&mattresses()).await.unwrap();

    assert_eq!(set.len(), 24);
}

#[tokio::test]
async fn incremental_unreadable_expanded_page_is_sentinel() {
    let resolver = MapResolver::default().with("Sealy", MATTRESS_PAGE1, false);
    let fetcher = MockFetcher::default().page(
        MATTRESS_PAGE1,
        Listing::new("p1", 1).load_more(50).html(),
    );
    let renderer = MockRenderer {
        html: Some("<html><body>blocked</body></html>".to_string()),
        ..MockRenderer::default()
    };
    let extractor = extractor();
    let crawler = Crawler::new(&resolver, &fetcher, &renderer, &extractor);
    let request = mattresses();

    let set = crawler.scrape(&request).await.unwrap();

    assert_sentinel(&set, &request);
    assert_eq!(renderer.calls.borrow().len(), 1);
}

#[tokio::test]
async fn incremental_expanded_page_without_products_is_sentinel() {
    let resolver = MapResolver::default().with("Sealy", MATTRESS_PAGE1, false);
    let fetcher = MockFetcher::default().page(
        MATTRESS_PAGE1,
        Listing::new("p1", 24).load_more(50).html(),
    );
    let renderer = MockRenderer {
        html: Some(Listing::new("all", 0).html()),
        ..MockRenderer::default()
    };
    let extractor = extractor();
    let crawler = Crawler::new(&resolver, &fetcher, &renderer, &extractor);
    let request = mattresses();

    let set = crawler.scrape(&request).await.unwrap();

    assert_sentinel(&set, &request);
}

#[tokio::test]
async fn incremental_first_page_without_products_is_sentinel() {
    let resolver = MapResolver::default().with("Sealy", MATTRESS_PAGE1, false);
    let fetcher = MockFetcher::default().page(
        MATTRESS_PAGE1,
        Listing::new("p1", 0).load_more(50).html(),
    );
    let renderer = MockRenderer {
        html: Some(Listing::new("all", 50).html()),
        ..MockRenderer::default()
    };
    let extractor = extractor();
    let crawler = Crawler::new(&resolver, &fetcher, &renderer, &extractor);
    let request = mattresses();

    let set = crawler.scrape(&request).await.unwrap();

    assert_sentinel(&set, &request);
    assert!(renderer.calls.borrow().is_empty());
}

#[tokio::test]
async fn explicit_layout_overrides_sub_department() {
    let resolver = MapResolver::default().with("LG", PAGE1, true);
    let fetcher = MockFetcher::default().page(PAGE1, Listing::new("p1", 3).pages(2).html());
    let renderer = MockRenderer::default();
    let extractor = extractor();
    let crawler = Crawler::new(&resolver, &fetcher, &renderer, &extractor);

    let set = crawler
        .paginate(&dishwashers(10022), PageLayout::IncrementalLoad)
        .await
        .unwrap();

    assert_eq!(set.len(), 3);
    assert_eq!(fetcher.requested(), vec![PAGE1.to_string()]);
}

// ---------------------------------------------------------------------------
// Resolution failures and batches
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resolution_error_is_returned_without_fetching() {
    let resolver = MapResolver::default();
    let fetcher = MockFetcher::default();
    let renderer = MockRenderer::default();
    let extractor = extractor();
    let crawler = Crawler::new(&resolver, &fetcher, &renderer, &extractor);

    let err = crawler.scrape(&dishwashers(10022)).await.unwrap_err();

    assert!(matches!(err, ResolutionError::UnknownBrand { ref brand, .. } if brand == "LG"));
    assert!(fetcher.requested().is_empty());
}

#[tokio::test]
async fn unknown_location_is_resolution_error() {
    let resolver = MapResolver::default().with("LG", PAGE1, true);
    let fetcher = MockFetcher::default().page(PAGE1, Listing::new("p1", 3).html());
    let renderer = MockRenderer::default();
    let extractor = extractor();
    let crawler = Crawler::new(&resolver, &fetcher, &renderer, &extractor);

    let err = crawler.scrape(&dishwashers(90210)).await.unwrap_err();

    assert!(matches!(err, ResolutionError::UnknownStore(StoreId(90210))));
}

#[tokio::test]
async fn concatenated_batch_preserves_request_order() {
    let resolver = MapResolver::default()
        .with("LG", PAGE1, true)
        .with("Sealy", MATTRESS_PAGE1, false);
    let fetcher = MockFetcher::default()
        .page(PAGE1, Listing::new("lg", 2).html())
        .page(MATTRESS_PAGE1, Listing::new("sealy", 3).html());
    let renderer = MockRenderer::default();
    let extractor = extractor();
    let crawler = Crawler::new(&resolver, &fetcher, &renderer, &extractor);

    let requests = [
        dishwashers(10022),
        mattresses(),
        ScrapeRequest::new("Appliances", "Dishwashers", "Bosch", StoreId(10022)),
        dishwashers(75209),
    ];
    let mut sets = Vec::new();
    for request in &requests {
        if let Ok(set) = crawler.scrape(request).await {
            sets.push(set);
        }
    }
    let rows = ResultSet::concat(sets);

    assert_eq!(rows.len(), 7);
    let order: Vec<(String, StoreId)> = rows
        .iter()
        .map(|r| (r.description.clone(), r.location))
        .collect();
    assert_eq!(order[0], ("lg-0".to_string(), StoreId(10022)));
    assert_eq!(order[2], ("sealy-0".to_string(), StoreId(75209)));
    assert_eq!(order[5], ("lg-0".to_string(), StoreId(75209)));
}
