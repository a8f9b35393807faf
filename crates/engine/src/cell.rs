use std::fmt;

use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeMap, Serializer};

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

/// A single untyped sheet value.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    /// True for `Empty` and for text that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Render the value the way the sheet displayed it. Integral numbers
    /// print without a trailing `.0`.
    pub fn display_string(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_string())
    }
}

// ---------------------------------------------------------------------------
// RawRow
// ---------------------------------------------------------------------------

/// One spreadsheet row: an ordered label → value mapping.
///
/// Key order is preserved because header discovery scans entries in
/// encounter order (the first matching column wins). Key sets vary row to
/// row; there is no schema guarantee.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: Vec<(String, Cell)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: Cell) {
        self.cells.push((key.into(), value));
    }

    /// First cell stored under `key`, if the key is present at all.
    pub fn get(&self, key: &str) -> Option<&Cell> {
        self.cells.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.cells.iter().any(|(k, _)| k == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// True when every cell in the row is blank.
    pub fn is_all_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.is_blank())
    }
}

impl FromIterator<(String, Cell)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (String, Cell)>>(iter: I) -> Self {
        RawRow {
            cells: iter.into_iter().collect(),
        }
    }
}

impl Serialize for RawRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (key, value) in &self.cells {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_string_drops_integral_fraction() {
        assert_eq!(Cell::Number(1004.0).display_string(), "1004");
        assert_eq!(Cell::Number(2.5).display_string(), "2.5");
        assert_eq!(Cell::Number(-3.0).display_string(), "-3");
    }

    #[test]
    fn blankness() {
        assert!(Cell::Empty.is_blank());
        assert!(Cell::text("   ").is_blank());
        assert!(!Cell::text("x").is_blank());
        assert!(!Cell::Number(0.0).is_blank());
    }

    #[test]
    fn get_returns_first_match_in_encounter_order() {
        let mut row = RawRow::new();
        row.push("A", Cell::text("first"));
        row.push("A", Cell::text("second"));
        assert_eq!(row.get("A"), Some(&Cell::text("first")));
        assert_eq!(row.get("B"), None);
    }

    #[test]
    fn all_blank_row() {
        let mut row = RawRow::new();
        row.push("A", Cell::Empty);
        row.push("B", Cell::text(""));
        assert!(row.is_all_blank());
        row.push("C", Cell::Number(1.0));
        assert!(!row.is_all_blank());
    }

    #[test]
    fn row_serializes_as_map() {
        let mut row = RawRow::new();
        row.push("OrderID", Cell::text("#100"));
        row.push("Qty", Cell::Number(2.0));
        row.push("Notes", Cell::Empty);
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "OrderID": "#100", "Qty": 2.0, "Notes": null })
        );
    }
}
