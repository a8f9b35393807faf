//! Product catalog built from the setup tab.
//!
//! Maps SKU codes to display names. Each pair is stored under both the
//! code as given and its lowercased form, so lookups tolerate the casing
//! drift that shows up in hand-entered order rows.

use std::collections::HashMap;

use crate::cell::RawRow;
use crate::header;

/// SKU → product name lookup.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: HashMap<String, String>,
}

impl Catalog {
    /// Build a catalog from raw setup-tab rows.
    ///
    /// When a header row is discovered ([`header::find_header_row`]), data
    /// rows below it feed the catalog through the discovered column keys.
    /// Otherwise the first-row key fallback applies over all rows. Rows
    /// that restate the header, carry a blank code or name, or belong to
    /// the settings block (codes containing `global`, names containing
    /// `settings`) are skipped.
    pub fn build(rows: &[RawRow]) -> Catalog {
        let mut catalog = Catalog::default();

        if let Some(loc) = header::find_header_row(rows) {
            for row in &rows[loc.row_index + 1..] {
                let code = cell_text(row, &loc.sku_key);
                let name = cell_text(row, &loc.product_key);
                catalog.insert_pair(&code, &name);
            }
        } else if let Some((sku_key, product_key)) = header::first_row_key_fallback(rows) {
            for row in rows {
                let code = cell_text(row, &sku_key);
                let name = cell_text(row, &product_key);
                catalog.insert_pair(&code, &name);
            }
        }

        if catalog.is_empty() && !rows.is_empty() {
            log::warn!("catalog is empty after scanning {} setup rows", rows.len());
        }
        catalog
    }

    fn insert_pair(&mut self, code: &str, name: &str) {
        if code.is_empty() || name.is_empty() {
            return;
        }
        let code_lower = code.to_lowercase();
        let name_lower = name.to_lowercase();
        // Skip restated headers and settings-block rows. Either field
        // matching its header token disqualifies the row on its own.
        if code_lower == "sku" || name_lower == "product" {
            return;
        }
        if code_lower.contains("global") || name_lower.contains("settings") {
            return;
        }
        self.entries.insert(code_lower, name.to_string());
        self.entries.insert(code.to_string(), name.to_string());
    }

    /// Resolve a SKU to its product name: exact match, then lowercased,
    /// then a case-insensitive scan as a last resort.
    pub fn resolve(&self, sku: &str) -> Option<&str> {
        if let Some(name) = self.entries.get(sku) {
            return Some(name);
        }
        if let Some(name) = self.entries.get(&sku.to_lowercase()) {
            return Some(name);
        }
        self.entries
            .iter()
            .find(|(code, _)| code.eq_ignore_ascii_case(sku))
            .map(|(_, name)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn cell_text(row: &RawRow, key: &str) -> String {
    row.get(key)
        .map(|cell| cell.display_string().trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Cell::text(*v)))
            .collect()
    }

    fn setup_rows() -> Vec<RawRow> {
        vec![
            row(&[("A", "GLOBAL_FEE"), ("B", "Settings value")]),
            row(&[("A", ""), ("B", "")]),
            row(&[("A", "SKU"), ("B", "Product Name")]),
            row(&[("A", "A1"), ("B", "Widget")]),
            row(&[("A", "B2"), ("B", "Gadget")]),
            row(&[("A", ""), ("B", "Orphan name")]),
        ]
    }

    #[test]
    fn builds_from_discovered_header() {
        let catalog = Catalog::build(&setup_rows());
        assert_eq!(catalog.resolve("A1"), Some("Widget"));
        assert_eq!(catalog.resolve("B2"), Some("Gadget"));
        assert_eq!(catalog.resolve("C3"), None);
    }

    #[test]
    fn resolve_is_case_insensitive() {
        let catalog = Catalog::build(&setup_rows());
        assert_eq!(catalog.resolve("a1"), Some("Widget"));
        assert_eq!(catalog.resolve("b2"), Some("Gadget"));
    }

    #[test]
    fn skips_settings_and_blank_rows() {
        let catalog = Catalog::build(&setup_rows());
        assert_eq!(catalog.resolve("GLOBAL_FEE"), None);
        // Two products, each under two keys.
        assert_eq!(catalog.len(), 4);
    }

    #[test]
    fn restated_header_row_is_not_an_entry() {
        let rows = vec![
            row(&[("A", "SKU"), ("B", "Product")]),
            row(&[("A", "SKU"), ("B", "Product")]),
            row(&[("A", "A1"), ("B", "Widget")]),
        ];
        let catalog = Catalog::build(&rows);
        assert_eq!(catalog.resolve("SKU"), None);
        assert_eq!(catalog.resolve("A1"), Some("Widget"));
    }

    #[test]
    fn either_header_token_disqualifies_a_row() {
        let rows = vec![
            row(&[("A", "SKU"), ("B", "Product Name")]),
            row(&[("A", "sku"), ("B", "Widget")]),
            row(&[("A", "A1"), ("B", "Product")]),
            row(&[("A", "B2"), ("B", "Gadget")]),
        ];
        let catalog = Catalog::build(&rows);
        assert_eq!(catalog.resolve("sku"), None);
        assert_eq!(catalog.resolve("A1"), None);
        assert_eq!(catalog.resolve("B2"), Some("Gadget"));
    }

    #[test]
    fn key_fallback_when_no_header_row() {
        let rows = vec![
            row(&[("sku", "A1"), ("product", "Widget")]),
            row(&[("sku", "B2"), ("product", "Gadget")]),
        ];
        let catalog = Catalog::build(&rows);
        assert_eq!(catalog.resolve("A1"), Some("Widget"));
        assert_eq!(catalog.resolve("b2"), Some("Gadget"));
    }

    #[test]
    fn empty_input_yields_empty_catalog() {
        let catalog = Catalog::build(&[]);
        assert!(catalog.is_empty());
        assert_eq!(catalog.resolve("A1"), None);
    }

    #[test]
    fn rebuild_is_idempotent() {
        let first = Catalog::build(&setup_rows());
        let second = Catalog::build(&setup_rows());
        assert_eq!(first.len(), second.len());
        assert_eq!(first.resolve("A1"), second.resolve("A1"));
    }
}
