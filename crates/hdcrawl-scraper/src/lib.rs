pub mod assemble;
pub mod client;
pub mod error;
pub mod extract;
pub mod identity;
pub mod pagination;
pub mod price;
pub mod render;
pub mod resolver;
mod retry;
pub mod sitemap;
pub mod types;
pub mod webdriver;

pub use assemble::assemble;
pub use client::{HttpPageFetcher, PageFetcher};
pub use error::{ExtractionError, FetchError, RenderError, ResolutionError, ScraperError};
pub use extract::{PageScan, ProductExtractor, SelectorConfig};
pub use identity::{parse_gatherproxy, IdentityPool, IdentitySupplier};
pub use pagination::{Crawler, PageOffsets};
pub use price::{parse_current_price, parse_price_saving};
pub use render::PageRenderer;
pub use resolver::{parse_brand_index, BrandIndex, CategoryResolver, SiteCatalog};
pub use sitemap::{build_category_index, parse_site_map, CategoryIndex, CategoryNode};
pub use types::{CategoryTarget, LoadMore, PageBatch, PageTemplate, RawPage};
pub use webdriver::WebDriverRenderer;
