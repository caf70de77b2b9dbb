//! CSV export of scraped rows.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use hdcrawl_core::ProductRow;

/// Output columns, in file order. Must match the serde renames on
/// [`ProductRow`].
const COLUMNS: [&str; 8] = [
    "Department",
    "Sub Department",
    "Current price",
    "Price saving",
    "Brand",
    "Description",
    "Product link",
    "Location",
];

/// Writes the header and one record per row. The header is written even when
/// there are no rows.
pub(crate) fn write_rows<W: Write>(writer: W, rows: &[ProductRow]) -> anyhow::Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv.write_record(COLUMNS)?;
    for row in rows {
        csv.serialize(row)?;
    }
    csv.flush()?;
    Ok(())
}

/// Creates (or truncates) `path` and writes `rows` to it.
pub(crate) fn write_csv(path: &Path, rows: &[ProductRow]) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_rows(file, rows).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), rows = rows.len(), "wrote csv");
    Ok(())
}
