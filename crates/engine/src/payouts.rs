//! Payout aggregation over the settlement tab.
//!
//! The settlement sheet is already one row per month; aggregation here is
//! filtering and ordering, not summing across rows.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::cell::RawRow;
use crate::normalize::{self, AMOUNT_OWED_ALIASES, MONTH_ALIASES, MONTH_KEY_ALIASES, PACKS_ALIASES};

/// One settled month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayoutSummary {
    /// Human-readable month label, as entered.
    pub month: String,
    /// Sortable `YYYY-MM` key.
    pub month_key: String,
    pub total_packs: f64,
    pub total_payout: f64,
}

/// Summarize settlement rows relative to `reference_date`.
///
/// Rows missing either the month label or the month key are dropped, as
/// are months at or after the month following `reference_date` (the
/// current month is still provisional upstream but is included; only
/// future months are excluded). Output is newest month first.
pub fn aggregate(rows: &[RawRow], reference_date: NaiveDate) -> Vec<PayoutSummary> {
    let cutoff = next_month_key(reference_date);
    let mut summaries: Vec<PayoutSummary> = rows
        .iter()
        .filter_map(|row| {
            let month = normalize::resolve_text(row, MONTH_ALIASES);
            let month_key = normalize::resolve_text(row, MONTH_KEY_ALIASES);
            if month.is_empty() || month_key.is_empty() {
                return None;
            }
            if month_key.as_str() >= cutoff.as_str() {
                log::debug!("excluding future settlement month {month_key}");
                return None;
            }
            let total_packs = normalize::resolve(row, PACKS_ALIASES)
                .map(normalize::to_number)
                .unwrap_or(0.0);
            let total_payout = normalize::resolve(row, AMOUNT_OWED_ALIASES)
                .map(normalize::to_number)
                .unwrap_or(0.0);
            Some(PayoutSummary {
                month,
                month_key,
                total_packs,
                total_payout,
            })
        })
        .collect();

    summaries.sort_by(|a, b| b.month_key.cmp(&a.month_key));
    summaries
}

/// `YYYY-MM` key of the month after `date`, used as the exclusion cutoff.
fn next_month_key(date: NaiveDate) -> String {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    format!("{year:04}-{month:02}")
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

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn filters_future_months_and_sorts_desc() {
        let rows = vec![
            row(&[("Month", "Dec 2023"), ("MonthKey", "2023-12"), ("Packs", "10"), ("AmountOwed", "£100.00")]),
            row(&[("Month", "Jan 2024"), ("MonthKey", "2024-01"), ("Packs", "5"), ("AmountOwed", "£50.00")]),
            row(&[("Month", "Feb 2024"), ("MonthKey", "2024-02"), ("Packs", "7"), ("AmountOwed", "£70.00")]),
        ];
        let summaries = aggregate(&rows, reference());
        let keys: Vec<&str> = summaries.iter().map(|s| s.month_key.as_str()).collect();
        // The current month stays; February is excluded as future.
        assert_eq!(keys, ["2024-01", "2023-12"]);
        assert_eq!(summaries[0].total_payout, 50.0);
        assert_eq!(summaries[1].total_packs, 10.0);
    }

    #[test]
    fn rows_missing_month_or_key_are_dropped() {
        let rows = vec![
            row(&[("Month", ""), ("MonthKey", "2023-11"), ("Packs", "1")]),
            row(&[("Month", "Nov 2023"), ("MonthKey", ""), ("Packs", "1")]),
            row(&[("Month", "Oct 2023"), ("MonthKey", "2023-10"), ("Packs", "3"), ("AmountOwed", "30")]),
        ];
        let summaries = aggregate(&rows, reference());
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].month, "Oct 2023");
    }

    #[test]
    fn missing_amounts_default_to_zero() {
        let rows = vec![row(&[("Month", "Oct 2023"), ("MonthKey", "2023-10")])];
        let summaries = aggregate(&rows, reference());
        assert_eq!(summaries[0].total_packs, 0.0);
        assert_eq!(summaries[0].total_payout, 0.0);
    }

    #[test]
    fn december_rolls_the_cutoff_into_january() {
        let december = NaiveDate::from_ymd_opt(2023, 12, 5).unwrap();
        assert_eq!(next_month_key(december), "2024-01");
        let rows = vec![
            row(&[("Month", "Dec 2023"), ("MonthKey", "2023-12"), ("Packs", "2"), ("AmountOwed", "20")]),
            row(&[("Month", "Jan 2024"), ("MonthKey", "2024-01"), ("Packs", "2"), ("AmountOwed", "20")]),
        ];
        let summaries = aggregate(&rows, december);
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].month_key, "2023-12");
    }

    #[test]
    fn currency_amounts_parse_through_normalizer() {
        let rows = vec![row(&[
            ("Month", "Oct 2023"),
            ("MonthKey", "2023-10"),
            ("Packs", "1,200"),
            ("AmountOwed", "£3,456.78"),
        ])];
        let summaries = aggregate(&rows, reference());
        assert_eq!(summaries[0].total_packs, 1200.0);
        assert_eq!(summaries[0].total_payout, 3456.78);
    }
}
