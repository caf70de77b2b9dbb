use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Marker written into the text columns of the placeholder row emitted when a
/// request yields no products.
pub const NO_ITEMS_ON_DISPLAY: &str = "No items on display";

/// Sub-department whose result pages grow through a "load more" control
/// instead of separate paginated URLs.
const INCREMENTAL_LOAD_SUB_DEPARTMENT: &str = "Mattresses";

/// Store identifier. The site keys stores by their ZIP code (e.g. `10022`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreId(pub u32);

impl std::fmt::Display for StoreId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One unit of scrape work: a brand inside a department/sub-department, as
/// stocked by a single store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeRequest {
    pub department: String,
    pub sub_department: String,
    pub brand: String,
    pub location: StoreId,
}

impl ScrapeRequest {
    #[must_use]
    pub fn new(
        department: impl Into<String>,
        sub_department: impl Into<String>,
        brand: impl Into<String>,
        location: StoreId,
    ) -> Self {
        Self {
            department: department.into(),
            sub_department: sub_department.into(),
            brand: brand.into(),
            location,
        }
    }

    /// Layout family of the category pages this request will walk.
    #[must_use]
    pub fn layout(&self) -> PageLayout {
        PageLayout::for_sub_department(&self.sub_department)
    }
}

/// Result-page layout family. Decides which pagination algorithm runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLayout {
    /// Numbered result pages addressed through an offset query parameter.
    Paged,
    /// A single page that grows in place through a "load more" control.
    IncrementalLoad,
}

impl PageLayout {
    #[must_use]
    pub fn for_sub_department(sub_department: &str) -> Self {
        if sub_department == INCREMENTAL_LOAD_SUB_DEPARTMENT {
            PageLayout::IncrementalLoad
        } else {
            PageLayout::Paged
        }
    }
}

/// Whether a category page lists only the selected store's on-hand inventory
/// or products from every store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseScope {
    StoreOnly,
    AllStores,
}

impl BrowseScope {
    /// Value of the `browsestoreoption` query parameter.
    #[must_use]
    pub fn query_value(self) -> &'static str {
        match self {
            BrowseScope::StoreOnly => "1",
            BrowseScope::AllStores => "2",
        }
    }
}

/// One output row. Field order and renames define the CSV column layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRow {
    #[serde(rename = "Department")]
    pub department: String,
    #[serde(rename = "Sub Department")]
    pub sub_department: String,
    #[serde(rename = "Current price")]
    pub current_price: Decimal,
    #[serde(rename = "Price saving")]
    pub price_saving: Decimal,
    #[serde(rename = "Brand")]
    pub brand: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Product link")]
    pub product_url: String,
    #[serde(rename = "Location")]
    pub location: StoreId,
}

impl ProductRow {
    /// The placeholder row for a request that produced no products.
    #[must_use]
    pub fn empty_result(request: &ScrapeRequest) -> Self {
        Self {
            department: request.department.clone(),
            sub_department: request.sub_department.clone(),
            current_price: Decimal::new(0, 2),
            price_saving: Decimal::new(0, 2),
            brand: NO_ITEMS_ON_DISPLAY.to_string(),
            description: NO_ITEMS_ON_DISPLAY.to_string(),
            product_url: NO_ITEMS_ON_DISPLAY.to_string(),
            location: request.location,
        }
    }

    #[must_use]
    pub fn is_empty_result(&self) -> bool {
        self.product_url == NO_ITEMS_ON_DISPLAY
            && self.brand == NO_ITEMS_ON_DISPLAY
            && self.description == NO_ITEMS_ON_DISPLAY
    }
}

/// Ordered rows produced for a single [`ScrapeRequest`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    rows: Vec<ProductRow>,
}

impl ResultSet {
    #[must_use]
    pub fn from_rows(rows: Vec<ProductRow>) -> Self {
        Self { rows }
    }

    /// A result set holding only the placeholder row for `request`.
    #[must_use]
    pub fn empty_result(request: &ScrapeRequest) -> Self {
        Self {
            rows: vec![ProductRow::empty_result(request)],
        }
    }

    #[must_use]
    pub fn rows(&self) -> &[ProductRow] {
        &self.rows
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<ProductRow> {
        self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `true` when this set is exactly the single placeholder row.
    #[must_use]
    pub fn is_empty_result(&self) -> bool {
        matches!(self.rows.as_slice(), [only] if only.is_empty_result())
    }

    /// Concatenates per-request result sets into one table, preserving the
    /// order of the sets and of the rows inside each set.
    #[must_use]
    pub fn concat(sets: impl IntoIterator<Item = ResultSet>) -> Vec<ProductRow> {
        sets.into_iter().flat_map(ResultSet::into_rows).collect()
    }
}
