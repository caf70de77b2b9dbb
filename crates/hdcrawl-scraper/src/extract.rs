//! Product extraction from category listing pages.
//!
//! Each product pod on a listing page yields one entry in a [`PageBatch`].
//! The same pass reads the pagination signals the controller needs: the
//! numbered page links of paged listings and the load-more control of
//! incremental listings.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::ExtractionError;
use crate::price::{parse_current_price, parse_price_saving, zero};
use crate::types::{LoadMore, PageBatch, RawPage};

/// CSS selectors locating product fields on a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorConfig {
    pub container: String,
    pub pod: String,
    pub link: String,
    pub brand: String,
    pub price: String,
    pub savings: String,
    pub pagination: String,
    pub load_more: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            container: "div#products".to_string(),
            pod: "div.pod-inner".to_string(),
            link: r#"a[data-pod-type="pr"]"#.to_string(),
            brand: "span.pod-plp__brand-name".to_string(),
            price: "div.price__numbers".to_string(),
            savings: "div.info__savings".to_string(),
            pagination: "a.hd-pagination__link".to_string(),
            load_more: "div#load-more".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledSelectors {
    container: Selector,
    pod: Selector,
    link: Selector,
    brand: Selector,
    price: Selector,
    savings: Selector,
    pagination: Selector,
    load_more: Selector,
    span: Selector,
}

fn compile(selector: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(selector).map_err(|_| ExtractionError::InvalidSelector {
        selector: selector.to_string(),
    })
}

impl CompiledSelectors {
    fn new(config: &SelectorConfig) -> Result<Self, ExtractionError> {
        Ok(Self {
            container: compile(&config.container)?,
            pod: compile(&config.pod)?,
            link: compile(&config.link)?,
            brand: compile(&config.brand)?,
            price: compile(&config.price)?,
            savings: compile(&config.savings)?,
            pagination: compile(&config.pagination)?,
            load_more: compile(&config.load_more)?,
            span: compile("span")?,
        })
    }
}

/// Everything the pagination controller reads from a first result page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageScan {
    pub batch: PageBatch,
    /// Highest page number linked from the pagination bar, if any.
    pub max_page: Option<u32>,
    pub load_more: LoadMore,
}

/// Extracts product batches and pagination signals from listing pages.
#[derive(Debug, Clone)]
pub struct ProductExtractor {
    base: Url,
    selectors: CompiledSelectors,
    container_selector: String,
}

impl ProductExtractor {
    /// Extractor using the default listing selectors. Relative product links
    /// are resolved against `base`.
    #[must_use]
    pub fn new(base: Url) -> Self {
        Self::with_selectors(base, &SelectorConfig::default())
            .expect("default listing selectors are valid")
    }

    /// # Errors
    ///
    /// Returns [`ExtractionError::InvalidSelector`] if any selector in
    /// `config` does not parse.
    pub fn with_selectors(base: Url, config: &SelectorConfig) -> Result<Self, ExtractionError> {
        Ok(Self {
            base,
            selectors: CompiledSelectors::new(config)?,
            container_selector: config.container.clone(),
        })
    }

    /// Extracts the products on `page`. A page whose product container holds
    /// no pods yields an empty batch.
    ///
    /// # Errors
    ///
    /// - [`ExtractionError::MissingContainer`] if the page has no product container.
    /// - [`ExtractionError::MalformedProduct`] if a product link has no usable `href`.
    /// - [`ExtractionError::InvalidPrice`] if a product's current price has no digits.
    pub fn extract(&self, page: &RawPage) -> Result<PageBatch, ExtractionError> {
        let document = Html::parse_document(&page.html);
        self.extract_document(&document, &page.url)
    }

    /// Extracts products plus the page-number and load-more signals.
    ///
    /// # Errors
    ///
    /// Same as [`ProductExtractor::extract`].
    pub fn scan(&self, page: &RawPage) -> Result<PageScan, ExtractionError> {
        let document = Html::parse_document(&page.html);
        let batch = self.extract_document(&document, &page.url)?;
        Ok(PageScan {
            batch,
            max_page: self.max_page(&document),
            load_more: self.load_more(&document),
        })
    }

    fn extract_document(&self, document: &Html, url: &str) -> Result<PageBatch, ExtractionError> {
        let container = document.select(&self.selectors.container).next().ok_or_else(|| {
            ExtractionError::MissingContainer {
                selector: self.container_selector.clone(),
                url: url.to_string(),
            }
        })?;

        let mut prices = Vec::new();
        let mut savings = Vec::new();
        let mut brands = Vec::new();
        let mut descriptions = Vec::new();
        let mut urls = Vec::new();

        for (index, pod) in container.select(&self.selectors.pod).enumerate() {
            let Some(link) = pod.select(&self.selectors.link).next() else {
                tracing::debug!(index, url, "skipping pod without a product link");
                continue;
            };

            let href = link
                .value()
                .attr("href")
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .ok_or_else(|| ExtractionError::MalformedProduct {
                    index,
                    url: url.to_string(),
                    reason: "product link has no href".to_string(),
                })?;
            let product_url =
                self.base
                    .join(href)
                    .map_err(|e| ExtractionError::MalformedProduct {
                        index,
                        url: url.to_string(),
                        reason: format!("bad product href \"{href}\": {e}"),
                    })?;

            let price_el = pod.select(&self.selectors.price).next().ok_or_else(|| {
                ExtractionError::MalformedProduct {
                    index,
                    url: url.to_string(),
                    reason: "no current price".to_string(),
                }
            })?;

            let brand = link
                .select(&self.selectors.brand)
                .next()
                .map(|b| element_text(b).trim().to_string())
                .unwrap_or_default();

            prices.push(parse_current_price(&element_text(price_el))?);
            savings.push(
                pod.select(&self.selectors.savings)
                    .next()
                    .map_or_else(zero, |s| parse_price_saving(&element_text(s))),
            );
            brands.push(brand);
            descriptions.push(last_line(&element_text(link)));
            urls.push(product_url.to_string());
        }

        PageBatch::new(prices, savings, brands, descriptions, urls)
    }

    fn max_page(&self, document: &Html) -> Option<u32> {
        document
            .select(&self.selectors.pagination)
            .filter_map(|a| element_text(a).trim().parse::<u32>().ok())
            .max()
    }

    fn load_more(&self, document: &Html) -> LoadMore {
        match document.select(&self.selectors.load_more).next() {
            None => LoadMore::Absent,
            Some(control) => LoadMore::Present {
                total: control
                    .select(&self.selectors.span)
                    .filter_map(|s| element_text(s).trim().parse::<u32>().ok())
                    .last(),
            },
        }
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// Product link text carries the brand and model lines before the title; the
/// title is the last non-empty line.
fn last_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .rfind(|l| !l.is_empty())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
