//! Value types passed between the fetcher, extractor, and pagination loop.

use rust_decimal::Decimal;
use url::Url;

use crate::error::ExtractionError;

/// Query parameter carrying the result offset on paged category URLs.
pub const OFFSET_PARAM: &str = "Nao";

/// Raw HTML of one fetched (or rendered) page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    pub url: String,
    pub html: String,
}

impl RawPage {
    #[must_use]
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }
}

/// URL of a paged category listing with a substitutable offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTemplate {
    base: Url,
}

impl PageTemplate {
    /// # Errors
    ///
    /// Returns [`url::ParseError`] when `page1_url` is not an absolute URL.
    pub fn new(page1_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            base: Url::parse(page1_url)?,
        })
    }

    /// The listing URL with `Nao=<offset>`, replacing any offset already
    /// present on the base URL. Other query segments are kept byte for byte.
    #[must_use]
    pub fn url_for_offset(&self, offset: u32) -> String {
        let mut url = self.base.clone();
        set_query_param(&mut url, OFFSET_PARAM, &offset.to_string());
        url.to_string()
    }
}

/// Appends `key=value` to the raw query of `url`, dropping earlier `key`
/// segments. The remaining segments are not re-encoded, so valueless keys
/// such as `NCNI-5` and literal `|` survive.
pub(crate) fn set_query_param(url: &mut Url, key: &str, value: &str) {
    let appended = format!("{key}={value}");
    let query = url
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|segment| !segment.is_empty() && segment.split('=').next() != Some(key))
        .chain(std::iter::once(appended.as_str()))
        .collect::<Vec<_>>()
        .join("&");
    url.set_query(Some(&query));
}

/// Where a scrape request starts: the first result page, plus the offset
/// template when the listing is paged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTarget {
    pub page1_url: String,
    pub page_template: Option<PageTemplate>,
}

/// State of the "load more" control on an incremental-load page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMore {
    Absent,
    /// Control present; carries the advertised total result count when it
    /// could be read.
    Present { total: Option<u32> },
}

/// Product fields extracted from one page, as five parallel lists. Index `i`
/// across all lists describes one product.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageBatch {
    prices: Vec<Decimal>,
    savings: Vec<Decimal>,
    brands: Vec<String>,
    descriptions: Vec<String>,
    urls: Vec<String>,
}

impl PageBatch {
    /// # Errors
    ///
    /// Returns [`ExtractionError::LengthMismatch`] unless all five lists have
    /// the same length.
    pub fn new(
        prices: Vec<Decimal>,
        savings: Vec<Decimal>,
        brands: Vec<String>,
        descriptions: Vec<String>,
        urls: Vec<String>,
    ) -> Result<Self, ExtractionError> {
        let lens = [
            prices.len(),
            savings.len(),
            brands.len(),
            descriptions.len(),
            urls.len(),
        ];
        if lens.iter().any(|&n| n != lens[0]) {
            return Err(ExtractionError::LengthMismatch {
                detail: format!(
                    "prices={}, savings={}, brands={}, descriptions={}, urls={}",
                    lens[0], lens[1], lens[2], lens[3], lens[4]
                ),
            });
        }
        Ok(Self {
            prices,
            savings,
            brands,
            descriptions,
            urls,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Appends `other` after the products already held.
    pub fn append(&mut self, mut other: PageBatch) {
        self.prices.append(&mut other.prices);
        self.savings.append(&mut other.savings);
        self.brands.append(&mut other.brands);
        self.descriptions.append(&mut other.descriptions);
        self.urls.append(&mut other.urls);
    }

    #[must_use]
    pub fn prices(&self) -> &[Decimal] {
        &self.prices
    }

    #[must_use]
    pub fn savings(&self) -> &[Decimal] {
        &self.savings
    }

    #[must_use]
    pub fn brands(&self) -> &[String] {
        &self.brands
    }

    #[must_use]
    pub fn descriptions(&self) -> &[String] {
        &self.descriptions
    }

    #[must_use]
    pub fn urls(&self) -> &[String] {
        &self.urls
    }
}
