//! Header discovery for the product catalog tab.
//!
//! The setup tab mixes a key/value settings block with the catalog table,
//! so the catalog header row has to be located by content rather than by
//! position.

use crate::cell::RawRow;

/// Rows scanned from the top before giving up on content-based discovery.
pub const HEADER_SCAN_WINDOW: usize = 15;

/// Location of a discovered catalog header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLocation {
    /// Index of the header row itself; catalog data starts on the next row.
    pub row_index: usize,
    /// Column key whose header cell reads exactly `sku`.
    pub sku_key: String,
    /// Column key whose header cell contains `product`.
    pub product_key: String,
}

/// Scan the first [`HEADER_SCAN_WINDOW`] rows for a row carrying both a
/// cell equal to `sku` and a cell containing `product` (case-insensitive,
/// trimmed). The first qualifying row wins, and within it the first
/// matching cell for each token.
pub fn find_header_row(rows: &[RawRow]) -> Option<HeaderLocation> {
    for (row_index, row) in rows.iter().take(HEADER_SCAN_WINDOW).enumerate() {
        let mut sku_key = None;
        let mut product_key = None;
        for (key, cell) in row.iter() {
            let value = cell.display_string().trim().to_lowercase();
            if sku_key.is_none() && value == "sku" {
                sku_key = Some(key.to_string());
            }
            if product_key.is_none() && value.contains("product") {
                product_key = Some(key.to_string());
            }
        }
        if let (Some(sku_key), Some(product_key)) = (sku_key, product_key) {
            log::debug!(
                "catalog header found at row {row_index} (sku={sku_key:?}, product={product_key:?})"
            );
            return Some(HeaderLocation {
                row_index,
                sku_key,
                product_key,
            });
        }
    }
    None
}

/// Fallback for tabs whose rows are already keyed by real column names:
/// look for `sku` and `product` keys (case-insensitive, exact) on the
/// first row.
pub fn first_row_key_fallback(rows: &[RawRow]) -> Option<(String, String)> {
    let first = rows.first()?;
    let sku = first
        .keys()
        .find(|k| k.trim().eq_ignore_ascii_case("sku"))?
        .to_string();
    let product = first
        .keys()
        .find(|k| k.trim().eq_ignore_ascii_case("product"))?
        .to_string();
    Some((sku, product))
}
