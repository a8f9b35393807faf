//! Order aggregation: one spreadsheet row per line item, grouped into one
//! aggregate per order.

use std::collections::HashMap;

use serde::Serialize;

use crate::catalog::Catalog;
use crate::cell::RawRow;
use crate::normalize::{
    self, FULFILLED_DATE_ALIASES, ORDER_DATE_ALIASES, ORDER_ID_ALIASES, PRODUCT_NAME_ALIASES,
    QTY_ALIASES, SKU_ALIASES,
};

/// Display name for line items whose product cannot be resolved.
pub const UNKNOWN_PRODUCT: &str = "Unknown Product";

/// One line item within an aggregated order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItem {
    pub name: String,
    pub sku: String,
    pub quantity: f64,
}

/// All line items of a single order, with canonical dates and a quantity
/// total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderAggregate {
    pub order_id: String,
    /// Canonical `DD/MM/YYYY`, or `"N/A"`.
    pub order_date: String,
    /// Canonical `DD/MM/YYYY`, or `"N/A"`.
    pub fulfilled_date: String,
    pub items: Vec<LineItem>,
    pub total_quantity: f64,
    /// The source rows that fed this aggregate, unmodified.
    #[serde(skip)]
    pub source_rows: Vec<RawRow>,
}

/// The three standard views over the same row set.
///
/// Membership is decided per row before grouping, so an order whose rows
/// disagree on fulfilment can appear in both `to_fulfill` and `completed`,
/// each view seeing only its own rows.
#[derive(Debug, Clone, Default)]
pub struct OrderPartitions {
    /// Rows with an order date and no fulfilled date, original row order.
    pub to_fulfill: Vec<OrderAggregate>,
    /// Rows with a fulfilled date, newest fulfilment first.
    pub completed: Vec<OrderAggregate>,
    /// Every aggregatable row, newest order first (fulfilled date as a
    /// fallback sort key).
    pub all: Vec<OrderAggregate>,
}

/// Group rows into one aggregate per order id, in first-appearance order.
/// Rows with no resolvable order id are dropped.
pub fn aggregate(rows: &[RawRow], catalog: &Catalog) -> Vec<OrderAggregate> {
    let mut orders: Vec<OrderAggregate> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut dropped = 0usize;

    for row in rows {
        let order_id = normalize::resolve_text(row, ORDER_ID_ALIASES);
        if order_id.is_empty() {
            dropped += 1;
            continue;
        }

        let item = line_item(row, catalog);

        match index.get(&order_id) {
            Some(&at) => {
                let order = &mut orders[at];
                order.total_quantity += item.quantity;
                order.items.push(item);
                order.source_rows.push(row.clone());
            }
            None => {
                // Dates come from the order's first row only; later rows
                // never amend them.
                index.insert(order_id.clone(), orders.len());
                orders.push(OrderAggregate {
                    order_id,
                    order_date: normalize::canonical_date_field(row, ORDER_DATE_ALIASES),
                    fulfilled_date: normalize::canonical_date_field(row, FULFILLED_DATE_ALIASES),
                    total_quantity: item.quantity,
                    items: vec![item],
                    source_rows: vec![row.clone()],
                });
            }
        }
    }

    if dropped > 0 {
        log::debug!("dropped {dropped} rows with no order id");
    }
    orders
}

fn line_item(row: &RawRow, catalog: &Catalog) -> LineItem {
    let quantity = normalize::resolve(row, QTY_ALIASES)
        .map(normalize::to_number)
        .unwrap_or(0.0);

    // A blank SKU cell counts as absent: fetched rows carry every header
    // key, so presence of the key alone means nothing.
    let sku = normalize::resolve_text(row, SKU_ALIASES);
    if sku.is_empty() {
        let name = normalize::resolve_text(row, PRODUCT_NAME_ALIASES);
        let name = if name.is_empty() {
            UNKNOWN_PRODUCT.to_string()
        } else {
            name
        };
        return LineItem {
            name,
            sku,
            quantity,
        };
    }

    let name = catalog
        .resolve(&sku)
        .unwrap_or(UNKNOWN_PRODUCT)
        .to_string();
    LineItem { name, sku, quantity }
}

/// Build the three standard views by filtering rows first, then grouping
/// each filtered set independently.
pub fn partition(rows: &[RawRow], catalog: &Catalog) -> OrderPartitions {
    let to_fulfill_rows: Vec<RawRow> = rows
        .iter()
        .filter(|r| has_order_date(r) && !has_fulfilled_date(r))
        .cloned()
        .collect();
    let completed_rows: Vec<RawRow> = rows
        .iter()
        .filter(|r| has_fulfilled_date(r))
        .cloned()
        .collect();

    let to_fulfill = aggregate(&to_fulfill_rows, catalog);
    let mut completed = aggregate(&completed_rows, catalog);
    let mut all = aggregate(rows, catalog);

    completed.sort_by(|a, b| fulfilled_sort_key(b).cmp(&fulfilled_sort_key(a)));
    all.sort_by(|a, b| all_sort_key(b).cmp(&all_sort_key(a)));

    OrderPartitions {
        to_fulfill,
        completed,
        all,
    }
}

fn has_order_date(row: &RawRow) -> bool {
    normalize::resolve(row, ORDER_DATE_ALIASES).is_some_and(|c| !c.is_blank())
}

fn has_fulfilled_date(row: &RawRow) -> bool {
    normalize::resolve(row, FULFILLED_DATE_ALIASES).is_some_and(|c| !c.is_blank())
}

fn fulfilled_sort_key(order: &OrderAggregate) -> chrono::NaiveDate {
    normalize::parse_canonical(&order.fulfilled_date).unwrap_or(chrono::NaiveDate::MIN)
}

fn all_sort_key(order: &OrderAggregate) -> chrono::NaiveDate {
    normalize::parse_canonical(&order.order_date)
        .or_else(|| normalize::parse_canonical(&order.fulfilled_date))
        .unwrap_or(chrono::NaiveDate::MIN)
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

    fn catalog() -> Catalog {
        Catalog::build(&[
            row(&[("A", "SKU"), ("B", "Product Name")]),
            row(&[("A", "A1"), ("B", "Widget")]),
            row(&[("A", "B2"), ("B", "Gadget")]),
        ])
    }

    #[test]
    fn groups_rows_by_order_id() {
        let rows = vec![
            row(&[
                ("OrderID", "#100"),
                ("OrderDate", "2024-03-07"),
                ("SKU", "A1"),
                ("Qty", "2"),
            ]),
            row(&[
                ("OrderID", "#100"),
                ("OrderDate", "2024-03-07"),
                ("SKU", "B2"),
                ("Qty", "3"),
            ]),
        ];
        let orders = aggregate(&rows, &catalog());
        assert_eq!(orders.len(), 1);
        let order = &orders[0];
        assert_eq!(order.order_id, "#100");
        assert_eq!(order.order_date, "07/03/2024");
        assert_eq!(order.total_quantity, 5.0);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].name, "Widget");
        assert_eq!(order.items[1].name, "Gadget");
        assert_eq!(order.source_rows.len(), 2);
    }

    #[test]
    fn rows_without_order_id_are_dropped() {
        let rows = vec![
            row(&[("SKU", "A1"), ("Qty", "2")]),
            row(&[("OrderID", ""), ("SKU", "B2"), ("Qty", "1")]),
            row(&[("OrderID", "#101"), ("SKU", "A1"), ("Qty", "1")]),
        ];
        let orders = aggregate(&rows, &catalog());
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].order_id, "#101");
    }

    #[test]
    fn unresolvable_sku_gets_unknown_product() {
        let rows = vec![row(&[("OrderID", "#1"), ("SKU", "ZZ"), ("Qty", "1")])];
        let orders = aggregate(&rows, &catalog());
        assert_eq!(orders[0].items[0].name, UNKNOWN_PRODUCT);
        assert_eq!(orders[0].items[0].sku, "ZZ");
    }

    #[test]
    fn missing_sku_column_falls_back_to_product_name() {
        let rows = vec![
            row(&[("OrderID", "#1"), ("Product Name", "Custom Thing"), ("Qty", "4")]),
            row(&[("OrderID", "#2"), ("Qty", "1")]),
        ];
        let orders = aggregate(&rows, &catalog());
        assert_eq!(orders[0].items[0].name, "Custom Thing");
        assert_eq!(orders[0].items[0].sku, "");
        assert_eq!(orders[1].items[0].name, UNKNOWN_PRODUCT);
    }

    #[test]
    fn blank_sku_cell_falls_back_to_product_name() {
        // Fetched rows carry every header key, so a blank SKU cell must
        // behave like a missing column.
        let mut r = RawRow::new();
        r.push("OrderID", Cell::text("#1"));
        r.push("SKU", Cell::Empty);
        r.push("Product Name", Cell::text("Custom Thing"));
        r.push("Qty", Cell::text("2"));
        let orders = aggregate(&[r], &Catalog::default());
        assert_eq!(orders[0].items[0].name, "Custom Thing");
        assert_eq!(orders[0].items[0].sku, "");
        assert_eq!(orders[0].items[0].quantity, 2.0);
    }

    #[test]
    fn dates_freeze_on_first_encounter() {
        let rows = vec![
            row(&[("OrderID", "#1"), ("SKU", "A1"), ("Qty", "1")]),
            row(&[
                ("OrderID", "#1"),
                ("OrderDate", "01/02/2024"),
                ("FulfilmentDate", "03/02/2024"),
                ("SKU", "B2"),
                ("Qty", "1"),
            ]),
        ];
        let orders = aggregate(&rows, &catalog());
        // The first row had no dates; later rows never amend them.
        assert_eq!(orders[0].order_date, "N/A");
        assert_eq!(orders[0].fulfilled_date, "N/A");
        assert_eq!(orders[0].total_quantity, 2.0);
    }

    #[test]
    fn first_appearance_order_is_preserved() {
        let rows = vec![
            row(&[("OrderID", "#2"), ("SKU", "A1"), ("Qty", "1")]),
            row(&[("OrderID", "#1"), ("SKU", "A1"), ("Qty", "1")]),
            row(&[("OrderID", "#2"), ("SKU", "B2"), ("Qty", "1")]),
        ];
        let orders = aggregate(&rows, &catalog());
        assert_eq!(orders[0].order_id, "#2");
        assert_eq!(orders[1].order_id, "#1");
    }

    #[test]
    fn partition_membership_is_per_row() {
        // #1's rows disagree on fulfilment: one row each side.
        let rows = vec![
            row(&[
                ("OrderID", "#1"),
                ("OrderDate", "01/03/2024"),
                ("SKU", "A1"),
                ("Qty", "1"),
            ]),
            row(&[
                ("OrderID", "#1"),
                ("OrderDate", "01/03/2024"),
                ("FulfilmentDate", "05/03/2024"),
                ("SKU", "B2"),
                ("Qty", "2"),
            ]),
        ];
        let parts = partition(&rows, &catalog());
        assert_eq!(parts.to_fulfill.len(), 1);
        assert_eq!(parts.to_fulfill[0].items[0].name, "Widget");
        assert_eq!(parts.completed.len(), 1);
        assert_eq!(parts.completed[0].items[0].name, "Gadget");
        assert_eq!(parts.all.len(), 1);
        assert_eq!(parts.all[0].items.len(), 2);
    }

    #[test]
    fn completed_sorted_by_fulfilled_date_desc() {
        let rows = vec![
            row(&[("OrderID", "#1"), ("FulfilmentDate", "01/01/2024"), ("SKU", "A1"), ("Qty", "1")]),
            row(&[("OrderID", "#2"), ("FulfilmentDate", "15/02/2024"), ("SKU", "A1"), ("Qty", "1")]),
            row(&[("OrderID", "#3"), ("FulfilmentDate", "10/01/2024"), ("SKU", "A1"), ("Qty", "1")]),
        ];
        let parts = partition(&rows, &catalog());
        let ids: Vec<&str> = parts.completed.iter().map(|o| o.order_id.as_str()).collect();
        assert_eq!(ids, ["#2", "#3", "#1"]);
    }

    #[test]
    fn all_sorts_by_order_date_with_fulfilled_fallback() {
        let rows = vec![
            row(&[("OrderID", "#1"), ("OrderDate", "01/01/2024"), ("SKU", "A1"), ("Qty", "1")]),
            // No order date; its fulfilled date is the newest instant here.
            row(&[("OrderID", "#2"), ("FulfilmentDate", "20/03/2024"), ("SKU", "A1"), ("Qty", "1")]),
            row(&[("OrderID", "#3"), ("OrderDate", "10/02/2024"), ("SKU", "A1"), ("Qty", "1")]),
        ];
        let parts = partition(&rows, &catalog());
        let ids: Vec<&str> = parts.all.iter().map(|o| o.order_id.as_str()).collect();
        assert_eq!(ids, ["#2", "#3", "#1"]);
    }

    #[test]
    fn undated_orders_sort_last() {
        let rows = vec![
            row(&[("OrderID", "#1"), ("SKU", "A1"), ("Qty", "1")]),
            row(&[("OrderID", "#2"), ("OrderDate", "01/01/2024"), ("SKU", "A1"), ("Qty", "1")]),
        ];
        let parts = partition(&rows, &catalog());
        let ids: Vec<&str> = parts.all.iter().map(|o| o.order_id.as_str()).collect();
        assert_eq!(ids, ["#2", "#1"]);
    }
}
