//! Resolution of scrape requests onto category listing URLs.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::LazyLock;

use hdcrawl_core::{BrandAliases, BrowseScope, PageLayout, ScrapeRequest, StoreId};
use scraper::{Html, Selector};
use url::Url;

use crate::client::PageFetcher;
use crate::error::{FetchError, ResolutionError};
use crate::sitemap::{strip_count, CategoryIndex};
use crate::types::{CategoryTarget, PageTemplate};

/// Department whose category pages list brands in a plain link list instead
/// of a `Brand` refinement.
const APPLIANCES: &str = "Appliances";
/// Position of the brand list among the plain lists of an appliance page.
const APPLIANCE_BRAND_LIST: usize = 2;

static PLAIN_LIST: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("ul.list.list--type-plain.u__text-align--left").expect("valid plain list selector")
});
static BRAND_REFINEMENT: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"ul[data-refinement="Brand"]"#).expect("valid brand refinement selector")
});
static LIST_ITEM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li").expect("valid li selector"));
static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a").expect("valid anchor selector"));

/// Maps a scrape request onto its first result page and page template.
pub trait CategoryResolver {
    fn resolve(
        &self,
        request: &ScrapeRequest,
    ) -> impl Future<Output = Result<CategoryTarget, ResolutionError>>;
}

/// Lowercased brand name → brand-filtered category URL.
pub type BrandIndex = BTreeMap<String, String>;

/// [`CategoryResolver`] backed by the site-map index and per-category brand
/// indexes fetched on demand.
pub struct SiteCatalog<'a, F> {
    index: &'a CategoryIndex,
    aliases: &'a BrandAliases,
    fetcher: &'a F,
    base: Url,
}

impl<'a, F: PageFetcher> SiteCatalog<'a, F> {
    #[must_use]
    pub fn new(
        index: &'a CategoryIndex,
        aliases: &'a BrandAliases,
        fetcher: &'a F,
        base: Url,
    ) -> Self {
        Self {
            index,
            aliases,
            fetcher,
            base,
        }
    }

    /// Fetches the category page across all stores and reads its brand list.
    ///
    /// The page is requested with `location`'s session so the listing matches
    /// what that store's shoppers see.
    ///
    /// # Errors
    ///
    /// - [`ResolutionError::UnknownDepartment`] / [`ResolutionError::UnknownSubDepartment`]
    ///   when the category is not in the index.
    /// - [`ResolutionError::UnknownStore`] when `location` is not configured.
    /// - [`ResolutionError::BrandIndexFetch`] when the page cannot be fetched.
    /// - [`ResolutionError::BrandIndexMarkup`] when the page has no brand list.
    pub async fn brand_index(
        &self,
        department: &str,
        sub_department: &str,
        location: StoreId,
    ) -> Result<BrandIndex, ResolutionError> {
        let url = self.index.lookup(department, sub_department)?;
        let page = self
            .fetcher
            .fetch(url, location, BrowseScope::AllStores)
            .await
            .map_err(|e| match e {
                FetchError::UnknownStore(id) => ResolutionError::UnknownStore(id),
                other => ResolutionError::BrandIndexFetch {
                    url: url.to_string(),
                    source: other,
                },
            })?;

        let brands = parse_brand_index(&page.html, department, &self.base).map_err(|reason| {
            ResolutionError::BrandIndexMarkup {
                url: url.to_string(),
                reason,
            }
        })?;
        tracing::debug!(department, sub_department, brands = brands.len(), "loaded brand index");
        Ok(brands)
    }
}

impl<F: PageFetcher> CategoryResolver for SiteCatalog<'_, F> {
    async fn resolve(&self, request: &ScrapeRequest) -> Result<CategoryTarget, ResolutionError> {
        let brands = self
            .brand_index(&request.department, &request.sub_department, request.location)
            .await?;

        let key = self.aliases.resolve(&request.brand);
        let page1_url = brands
            .get(&key)
            .cloned()
            .ok_or_else(|| ResolutionError::UnknownBrand {
                brand: request.brand.clone(),
                department: request.department.clone(),
                sub_department: request.sub_department.clone(),
            })?;

        let page_template = match request.layout() {
            PageLayout::Paged => Some(PageTemplate::new(&page1_url).map_err(|e| {
                ResolutionError::InvalidUrl {
                    url: page1_url.clone(),
                    reason: e.to_string(),
                }
            })?),
            PageLayout::IncrementalLoad => None,
        };

        Ok(CategoryTarget {
            page1_url,
            page_template,
        })
    }
}

/// Reads the brand list of a category page.
///
/// Appliance pages carry brands as the anchors of the third plain list; other
/// departments use the `Brand` refinement list, whose entries end in a
/// `(count)` suffix.
///
/// # Errors
///
/// Returns a description of the missing markup when no brand list is present.
pub fn parse_brand_index(html: &str, department: &str, base: &Url) -> Result<BrandIndex, String> {
    let document = Html::parse_document(html);
    let mut brands = BrandIndex::new();

    if department == APPLIANCES {
        let list = document
            .select(&PLAIN_LIST)
            .nth(APPLIANCE_BRAND_LIST)
            .ok_or_else(|| "appliance brand list not found".to_string())?;
        for anchor in list.select(&ANCHOR) {
            let name = anchor.text().collect::<String>().trim().to_lowercase();
            if let Some(url) = join_href(anchor.value().attr("href"), base) {
                if !name.is_empty() {
                    brands.insert(name, url);
                }
            }
        }
    } else {
        let list = document
            .select(&BRAND_REFINEMENT)
            .next()
            .ok_or_else(|| "brand refinement list not found".to_string())?;
        for item in list.select(&LIST_ITEM) {
            let Some(anchor) = item.select(&ANCHOR).next() else {
                continue;
            };
            let name = strip_count(&item.text().collect::<String>().replace('\n', "")).to_lowercase();
            if let Some(url) = join_href(anchor.value().attr("href"), base) {
                if !name.is_empty() {
                    brands.insert(name, url);
                }
            }
        }
    }

    Ok(brands)
}

fn join_href(href: Option<&str>, base: &Url) -> Option<String> {
    let href = href?.trim();
    if href.is_empty() {
        return None;
    }
    base.join(href).ok().map(String::from)
}
