use std::future::Future;

use hdcrawl_core::StoreId;

use crate::error::RenderError;
use crate::types::RawPage;

/// Expands an incremental-load page until it shows every result.
pub trait PageRenderer {
    /// Loads `url` for `location` and keeps triggering the load-more control
    /// until about `target_count` products are on the page, then returns the
    /// final markup.
    fn render_fully(
        &self,
        url: &str,
        location: StoreId,
        target_count: u32,
    ) -> impl Future<Output = Result<RawPage, RenderError>>;
}

/// An absent renderer reports [`RenderError::Unavailable`], so callers keep
/// the unexpanded page.
impl<P: PageRenderer> PageRenderer for Option<P> {
    async fn render_fully(
        &self,
        url: &str,
        location: StoreId,
        target_count: u32,
    ) -> Result<RawPage, RenderError> {
        match self {
            Some(renderer) => renderer.render_fully(url, location, target_count).await,
            None => Err(RenderError::Unavailable),
        }
    }
}
