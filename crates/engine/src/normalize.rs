//! Field normalization — alias resolution, date canonicalization, and
//! currency-tolerant numeric parsing.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::cell::{Cell, RawRow};

// ── Column aliases ──────────────────────────────────────────────────
//
// The upstream sheets are hand-maintained; the same logical field shows up
// under several header spellings. Each logical field gets an ordered list
// of candidate keys and the first key present on a row wins, so the policy
// stays auditable in one place instead of scattered conditionals.

pub const ORDER_ID_ALIASES: &[&str] = &["OrderID", "Order Number", "order_number", "Order #"];

pub const ORDER_DATE_ALIASES: &[&str] = &["OrderDate", "Order Date", "order_date", "Order date"];

pub const FULFILLED_DATE_ALIASES: &[&str] = &[
    "FulfilmentDate",
    "Fulfilment Date",
    "Fulfilled Date",
    "fulfilled_date",
    "Fulfilled date",
    "Fulfilled",
];

pub const SKU_ALIASES: &[&str] = &["SKU", "sku", "Sku"];

pub const QTY_ALIASES: &[&str] = &["Qty", "Quantity", "quantity"];

/// Free-text product name columns, consulted only when no SKU column is
/// present on the row.
pub const PRODUCT_NAME_ALIASES: &[&str] = &[
    "Product Name",
    "ProductName",
    "product_name",
    "Product",
    "Title",
    "Name",
    "Items",
    "items",
    "Line Items",
];

pub const MONTH_ALIASES: &[&str] = &["Month", "month", "Month Name"];

pub const MONTH_KEY_ALIASES: &[&str] = &["MonthKey", "monthKey", "Month Key"];

pub const PACKS_ALIASES: &[&str] = &["Packs", "packs", "Pack", "Total Packs", "totalPacks"];

pub const AMOUNT_OWED_ALIASES: &[&str] = &[
    "AmountOwed",
    "amountOwed",
    "Amount Owed",
    "Payout",
    "payout",
    "Total Payout",
    "totalPayout",
    "Amount",
    "amount",
];

/// First alias present on the row wins, even if its value is blank.
pub fn resolve<'a>(row: &'a RawRow, aliases: &[&str]) -> Option<&'a Cell> {
    aliases.iter().find_map(|name| row.get(name))
}

/// Resolved value as trimmed display text; empty when no alias is present.
pub fn resolve_text(row: &RawRow, aliases: &[&str]) -> String {
    resolve(row, aliases)
        .map(|cell| cell.display_string().trim().to_string())
        .unwrap_or_default()
}

// ── Date canonicalization ───────────────────────────────────────────

/// Sentinel for an absent or blank date field.
pub const DATE_MISSING: &str = "N/A";

const CANONICAL_FORMAT: &str = "%d/%m/%Y";

/// Canonicalize a cell into `DD/MM/YYYY` (or `"N/A"` when blank).
///
/// A native date formats directly. Text goes through a general parse
/// first; if that fails, a three-part split fallback disambiguates
/// `YYYY-MM-DD`, `DD/MM/YYYY`, and `MM/DD/YYYY`. Anything else is
/// returned unmodified — best effort, not an error.
pub fn to_canonical_date(value: &Cell) -> String {
    match value {
        Cell::Date(d) => d.format(CANONICAL_FORMAT).to_string(),
        _ if value.is_blank() => DATE_MISSING.to_string(),
        _ => canonicalize_text(&value.display_string()),
    }
}

/// Canonicalize a date field resolved through an alias list; a missing
/// column behaves like a blank cell.
pub fn canonical_date_field(row: &RawRow, aliases: &[&str]) -> String {
    match resolve(row, aliases) {
        Some(cell) => to_canonical_date(cell),
        None => DATE_MISSING.to_string(),
    }
}

fn canonicalize_text(raw: &str) -> String {
    let s = raw.trim();
    if s.is_empty() {
        return DATE_MISSING.to_string();
    }
    if let Some(date) = general_parse(s) {
        return date.format(CANONICAL_FORMAT).to_string();
    }

    let parts: Vec<&str> = s.split(['-', '/']).collect();
    if parts.len() != 3 {
        return s.to_string();
    }
    let (a, b, c) = (parts[0], parts[1], parts[2]);

    if a.len() == 4 {
        // YYYY-MM-DD with an out-of-range component: reorder as-is.
        return format!("{}/{}/{}", pad2(c), pad2(b), a);
    }
    match a.parse::<u32>() {
        // First part can't be a month, so it must be a day.
        Ok(n) if n > 12 => format!("{}/{}/{}", pad2(a), pad2(b), c),
        // Ambiguous or non-numeric: assume MM/DD and swap.
        _ => format!("{}/{}/{}", pad2(b), pad2(a), c),
    }
}

/// General parse: ISO dates and datetimes plus the canonical day-first
/// form itself, so canonical strings round-trip. Ambiguous slash dates
/// therefore read day-first; the split fallback above only sees strings
/// whose day-first reading is invalid.
fn general_parse(s: &str) -> Option<NaiveDate> {
    for format in ["%Y-%m-%d", CANONICAL_FORMAT] {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.date());
        }
    }
    None
}

fn pad2(s: &str) -> String {
    if s.len() >= 2 {
        s.to_string()
    } else {
        format!("0{s}")
    }
}

/// Parse a canonical `DD/MM/YYYY` string back into a point in time, used
/// only as a sort key. `"N/A"` and unparsable strings yield `None`
/// (callers sort those as the earliest possible instant).
pub fn parse_canonical(s: &str) -> Option<NaiveDate> {
    if s.is_empty() || s == DATE_MISSING {
        return None;
    }
    NaiveDate::parse_from_str(s, CANONICAL_FORMAT).ok()
}

// ── Numeric / currency parsing ──────────────────────────────────────

/// Currency-tolerant numeric parse. Strips `£`/`$`, commas, and
/// whitespace; unparsable input degrades to 0 rather than failing the
/// batch.
pub fn to_number(value: &Cell) -> f64 {
    match value {
        Cell::Number(n) => *n,
        Cell::Text(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !matches!(c, '£' | '$' | ',') && !c.is_whitespace())
                .collect();
            cleaned.parse::<f64>().unwrap_or(0.0)
        }
        _ => 0.0,
    }
}
