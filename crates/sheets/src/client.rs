//! Sheet reader: v4 values API with a public gviz export fallback.

use std::thread;
use std::time::Duration;

use chrono::NaiveDate;
use orderdesk_engine::{Cell, RawRow};

use crate::error::SheetsError;

const MAX_RETRIES: u32 = 3;
const V4_BASE: &str = "https://sheets.googleapis.com";
const GVIZ_BASE: &str = "https://docs.google.com";

/// Read-only client for a single spreadsheet.
///
/// When an API key is configured, tabs are read through the v4 values API.
/// Without a key, or when the v4 read fails, the client falls back to the
/// public gviz JSON export, which works for any link-shared sheet.
#[derive(Clone)]
pub struct SheetsClient {
    http: reqwest::blocking::Client,
    sheet_id: String,
    api_key: Option<String>,
    v4_base: String,
    gviz_base: String,
}

impl SheetsClient {
    pub fn new(sheet_id: &str, api_key: Option<&str>) -> Result<Self, SheetsError> {
        if sheet_id.trim().is_empty() {
            return Err(SheetsError::NotConfigured("sheet id is empty".into()));
        }
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("orderdesk/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SheetsError::Network(e.to_string()))?;
        Ok(Self {
            http,
            sheet_id: sheet_id.to_string(),
            api_key: api_key.map(str::to_string),
            v4_base: V4_BASE.to_string(),
            gviz_base: GVIZ_BASE.to_string(),
        })
    }

    /// Point both endpoints at a test server.
    #[doc(hidden)]
    pub fn with_base_urls(mut self, v4_base: &str, gviz_base: &str) -> Self {
        self.v4_base = v4_base.trim_end_matches('/').to_string();
        self.gviz_base = gviz_base.trim_end_matches('/').to_string();
        self
    }

    /// Fetch one tab as header-keyed rows.
    pub fn fetch_rows(&self, tab: &str) -> Result<Vec<RawRow>, SheetsError> {
        if self.api_key.is_some() {
            match self.fetch_v4(tab) {
                Ok(rows) => return Ok(rows),
                Err(err) => {
                    log::warn!("v4 read of {tab:?} failed ({err}); falling back to gviz export");
                }
            }
        }
        self.fetch_gviz(tab)
    }

    /// Fetch the raw grid of one tab, without header keying. Used for tabs
    /// where the header row is not the first row.
    pub fn fetch_grid(&self, tab: &str) -> Result<Vec<RawRow>, SheetsError> {
        if self.api_key.is_some() {
            match self.fetch_v4_grid(tab) {
                Ok(rows) => return Ok(rows),
                Err(err) => {
                    log::warn!("v4 read of {tab:?} failed ({err}); falling back to gviz export");
                }
            }
        }
        self.fetch_gviz_grid(tab)
    }

    // ── v4 values API ───────────────────────────────────────────────

    fn v4_values(&self, tab: &str) -> Result<Vec<Vec<String>>, SheetsError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| SheetsError::NotConfigured("no API key for v4 read".into()))?;
        let url = format!(
            "{}/v4/spreadsheets/{}/values/{}?key={}",
            self.v4_base,
            self.sheet_id,
            urlencoding::encode(tab),
            urlencoding::encode(key),
        );
        let json = self.get_with_retry(&url)?;
        if let Some(error) = json.get("error") {
            let message = error["message"].as_str().unwrap_or("unknown error");
            return Err(SheetsError::Api(message.to_string()));
        }
        let values = json["values"]
            .as_array()
            .ok_or_else(|| SheetsError::Parse("missing values array in v4 response".into()))?;
        Ok(values
            .iter()
            .map(|row| {
                row.as_array()
                    .map(|cells| {
                        cells
                            .iter()
                            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                            .collect()
                    })
                    .unwrap_or_default()
            })
            .collect())
    }

    fn fetch_v4(&self, tab: &str) -> Result<Vec<RawRow>, SheetsError> {
        let values = self.v4_values(tab)?;
        let mut iter = values.into_iter();
        let headers = match iter.next() {
            Some(h) => h,
            None => return Ok(Vec::new()),
        };
        Ok(iter
            .map(|row| keyed_row(&headers, row))
            .filter(|row| !row.is_all_blank())
            .collect())
    }

    fn fetch_v4_grid(&self, tab: &str) -> Result<Vec<RawRow>, SheetsError> {
        let values = self.v4_values(tab)?;
        Ok(values
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .enumerate()
                    .map(|(i, v)| (column_letter(i), text_cell(v)))
                    .collect()
            })
            .collect())
    }

    // ── gviz export fallback ────────────────────────────────────────

    fn gviz_table(&self, tab: &str) -> Result<serde_json::Value, SheetsError> {
        let url = format!(
            "{}/spreadsheets/d/{}/gviz/tq?tqx=out:json&sheet={}",
            self.gviz_base,
            self.sheet_id,
            urlencoding::encode(tab),
        );
        let body = self.get_text_with_retry(&url)?;
        let json = extract_gviz_json(&body)?;
        if json["status"].as_str() == Some("error") {
            let detail = json["errors"][0]["detailed_message"]
                .as_str()
                .or_else(|| json["errors"][0]["message"].as_str())
                .unwrap_or("unknown gviz error");
            return Err(SheetsError::Api(detail.to_string()));
        }
        Ok(json["table"].clone())
    }

    fn fetch_gviz(&self, tab: &str) -> Result<Vec<RawRow>, SheetsError> {
        let table = self.gviz_table(tab)?;
        let headers = gviz_headers(&table);
        Ok(gviz_rows(&table)
            .into_iter()
            .map(|cells| {
                headers
                    .iter()
                    .cloned()
                    .zip(cells.into_iter().chain(std::iter::repeat(Cell::Empty)))
                    .collect::<RawRow>()
            })
            .filter(|row| !row.is_all_blank())
            .collect())
    }

    fn fetch_gviz_grid(&self, tab: &str) -> Result<Vec<RawRow>, SheetsError> {
        let table = self.gviz_table(tab)?;
        Ok(gviz_rows(&table)
            .into_iter()
            .map(|cells| {
                cells
                    .into_iter()
                    .enumerate()
                    .map(|(i, cell)| (column_letter(i), cell))
                    .collect()
            })
            .collect())
    }

    // ── HTTP plumbing ───────────────────────────────────────────────

    fn get_with_retry(&self, url: &str) -> Result<serde_json::Value, SheetsError> {
        let body = self.get_text_with_retry(url)?;
        serde_json::from_str(&body).map_err(|e| SheetsError::Parse(e.to_string()))
    }

    fn get_text_with_retry(&self, url: &str) -> Result<String, SheetsError> {
        let mut backoff_secs = 1u64;
        let mut last_err = SheetsError::Network("no attempts made".into());

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                thread::sleep(Duration::from_secs(backoff_secs));
                backoff_secs *= 2;
            }
            match self.http.get(url).send() {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if resp.status().is_success() {
                        return resp.text().map_err(|e| SheetsError::Network(e.to_string()));
                    }
                    let body = resp.text().unwrap_or_default();
                    // Retry rate limits and server errors; everything else
                    // is a real answer.
                    if status == 429 || status >= 500 {
                        log::debug!("retryable HTTP {status} from sheet endpoint (attempt {attempt})");
                        last_err = SheetsError::Http(status, body);
                        continue;
                    }
                    return Err(SheetsError::Http(status, body));
                }
                Err(e) => {
                    log::debug!("network error on attempt {attempt}: {e}");
                    last_err = SheetsError::Network(e.to_string());
                }
            }
        }
        Err(last_err)
    }
}

// ── gviz parsing ────────────────────────────────────────────────────

/// The gviz endpoint wraps its JSON in a JS callback
/// (`google.visualization.Query.setResponse({...});`). Scan for the
/// outermost brace pair instead of trusting the exact wrapper text.
fn extract_gviz_json(body: &str) -> Result<serde_json::Value, SheetsError> {
    let start = body
        .find('{')
        .ok_or_else(|| SheetsError::Parse("no JSON object in gviz response".into()))?;
    let end = body
        .rfind('}')
        .ok_or_else(|| SheetsError::Parse("no JSON object in gviz response".into()))?;
    if end < start {
        return Err(SheetsError::Parse("malformed gviz response".into()));
    }
    serde_json::from_str(&body[start..=end]).map_err(|e| SheetsError::Parse(e.to_string()))
}

fn gviz_headers(table: &serde_json::Value) -> Vec<String> {
    table["cols"]
        .as_array()
        .map(|cols| {
            cols.iter()
                .enumerate()
                .map(|(i, col)| {
                    let label = col["label"].as_str().unwrap_or("").trim();
                    if label.is_empty() {
                        column_letter(i)
                    } else {
                        label.to_string()
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}

fn gviz_rows(table: &serde_json::Value) -> Vec<Vec<Cell>> {
    table["rows"]
        .as_array()
        .map(|rows| {
            rows.iter()
                .map(|row| {
                    row["c"]
                        .as_array()
                        .map(|cells| cells.iter().map(gviz_cell).collect())
                        .unwrap_or_default()
                })
                .collect()
        })
        .unwrap_or_default()
}

fn gviz_cell(cell: &serde_json::Value) -> Cell {
    let value = &cell["v"];
    match value {
        serde_json::Value::Null => Cell::Empty,
        serde_json::Value::Number(n) => Cell::Number(n.as_f64().unwrap_or(0.0)),
        serde_json::Value::Bool(b) => Cell::text(if *b { "TRUE" } else { "FALSE" }),
        serde_json::Value::String(s) => match parse_gviz_date(s) {
            Some(date) => Cell::Date(date),
            None => Cell::text(s.clone()),
        },
        other => Cell::text(other.to_string()),
    }
}

/// gviz encodes dates as `Date(year,month,day[,...])` with a zero-based
/// month.
fn parse_gviz_date(s: &str) -> Option<NaiveDate> {
    let inner = s.strip_prefix("Date(")?.strip_suffix(')')?;
    let mut parts = inner.split(',').map(str::trim);
    let year: i32 = parts.next()?.parse().ok()?;
    let month0: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next()?.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month0 + 1, day)
}

// ── Shared helpers ──────────────────────────────────────────────────

fn keyed_row(headers: &[String], cells: Vec<String>) -> RawRow {
    headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            let key = if header.trim().is_empty() {
                column_letter(i)
            } else {
                header.clone()
            };
            let value = cells.get(i).cloned().unwrap_or_default();
            (key, text_cell(value))
        })
        .collect()
}

fn text_cell(value: String) -> Cell {
    if value.is_empty() {
        Cell::Empty
    } else {
        Cell::Text(value)
    }
}

/// Spreadsheet-style column name for a zero-based index (A, B, …, AA).
fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut name = String::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        name.insert(0, (b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    name
}
