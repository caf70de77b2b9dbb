use hdcrawl_core::{ProductRow, ResultSet, ScrapeRequest};

use crate::types::PageBatch;

/// Turns accumulated product fields into output rows for `request`.
///
/// Every row carries the request's department, sub-department and location.
/// An empty batch yields an empty set; the sentinel row is the pagination
/// controller's decision, not this function's.
#[must_use]
pub fn assemble(request: &ScrapeRequest, batch: &PageBatch) -> ResultSet {
    let rows = batch
        .prices()
        .iter()
        .zip(batch.savings())
        .zip(batch.brands())
        .zip(batch.descriptions())
        .zip(batch.urls())
        .map(|((((price, saving), brand), description), url)| ProductRow {
            department: request.department.clone(),
            sub_department: request.sub_department.clone(),
            current_price: *price,
            price_saving: *saving,
            brand: brand.clone(),
            description: description.clone(),
            product_url: url.clone(),
            location: request.location,
        })
        .collect();
    ResultSet::from_rows(rows)
}
