use hdcrawl_core::StoreId;
use thiserror::Error;

/// Failure of a single HTTP attempt.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {url}")]
    RateLimited { url: String },

    #[error("page not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("proxy pool is empty")]
    NoProxy,

    #[error("invalid proxy \"{proxy}\": {reason}")]
    InvalidProxy { proxy: String, reason: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// A page could not be fetched at all.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Every proxied attempt and the final direct attempt failed.
    #[error("giving up on {url} after {attempts} attempts: {source}")]
    Exhausted {
        url: String,
        attempts: u32,
        #[source]
        source: ScraperError,
    },

    #[error("no session cookie configured for store {0}")]
    UnknownStore(StoreId),

    #[error("invalid page URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// A page was fetched but its product markup is absent or malformed.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("product container `{selector}` not found on {url}")]
    MissingContainer { selector: String, url: String },

    #[error("product #{index} on {url}: {reason}")]
    MalformedProduct {
        index: usize,
        url: String,
        reason: String,
    },

    #[error("invalid price \"{raw}\": {reason}")]
    InvalidPrice { raw: String, reason: String },

    #[error("field lists differ in length: {detail}")]
    LengthMismatch { detail: String },

    #[error("invalid CSS selector `{selector}`")]
    InvalidSelector { selector: String },
}

/// A scrape request cannot be mapped onto a category URL. Fatal for that
/// request only.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("unknown department \"{department}\"")]
    UnknownDepartment { department: String },

    #[error("unknown sub-department \"{sub_department}\" in \"{department}\"")]
    UnknownSubDepartment {
        department: String,
        sub_department: String,
    },

    #[error("brand \"{brand}\" not listed for {department} / {sub_department}")]
    UnknownBrand {
        brand: String,
        department: String,
        sub_department: String,
    },

    #[error("store {0} is not configured")]
    UnknownStore(StoreId),

    #[error("brand index for {url} could not be fetched: {source}")]
    BrandIndexFetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("brand index for {url} could not be parsed: {reason}")]
    BrandIndexMarkup { url: String, reason: String },

    #[error("invalid category URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// The load-more expansion of a page failed.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("page expansion is not configured")]
    Unavailable,

    #[error("HTTP error talking to WebDriver: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WebDriver command {command} failed: {reason}")]
    WebDriver { command: String, reason: String },

    #[error("invalid page URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("no session cookie configured for store {0}")]
    UnknownStore(StoreId),
}
