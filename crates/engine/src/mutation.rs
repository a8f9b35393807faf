//! Mutation request shapes for the write-back webhook.
//!
//! The engine only builds and validates the payloads; transport belongs to
//! the sheets crate.

use std::error::Error;
use std::fmt;

use serde::Serialize;

/// Partner recorded on new orders when none is given.
pub const DEFAULT_FULFILMENT_PARTNER: &str = "CHATHAM";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    MissingOrderId,
    NoLineItems,
}

impl fmt::Display for MutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationError::MissingOrderId => write!(f, "order id must not be empty"),
            MutationError::NoLineItems => {
                write!(f, "at least one line item with a SKU is required")
            }
        }
    }
}

impl Error for MutationError {}

/// One line of a new order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub sku: String,
    pub qty: f64,
    pub line_revenue: f64,
}

/// Payload for appending a new order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub order_id: String,
    pub order_date: String,
    pub fulfilment_partner: String,
    pub order_total: f64,
    pub line_items: Vec<OrderLine>,
}

impl CreateOrderRequest {
    /// Validate and assemble a create-order payload.
    ///
    /// Lines with a blank SKU are discarded before validation. When no
    /// explicit total is given it is derived from line revenues, rounded
    /// to two decimal places.
    pub fn build(
        order_id: &str,
        order_date: &str,
        fulfilment_partner: Option<&str>,
        order_total: Option<f64>,
        lines: Vec<OrderLine>,
    ) -> Result<CreateOrderRequest, MutationError> {
        let order_id = order_id.trim();
        if order_id.is_empty() {
            return Err(MutationError::MissingOrderId);
        }

        let line_items: Vec<OrderLine> = lines
            .into_iter()
            .map(|mut line| {
                line.sku = line.sku.trim().to_string();
                line
            })
            .filter(|line| !line.sku.is_empty())
            .collect();
        if line_items.is_empty() {
            return Err(MutationError::NoLineItems);
        }

        let order_total = order_total.unwrap_or_else(|| {
            let sum: f64 = line_items.iter().map(|l| l.line_revenue).sum();
            (sum * 100.0).round() / 100.0
        });

        Ok(CreateOrderRequest {
            order_id: order_id.to_string(),
            order_date: order_date.to_string(),
            fulfilment_partner: fulfilment_partner
                .unwrap_or(DEFAULT_FULFILMENT_PARTNER)
                .to_string(),
            order_total,
            line_items,
        })
    }
}

/// Payload for stamping an existing order as fulfilled.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkFulfilledRequest {
    pub action: String,
    pub order_id: String,
    pub fulfilment_date: String,
}

impl MarkFulfilledRequest {
    pub fn new(order_id: &str, fulfilment_date: &str) -> Result<MarkFulfilledRequest, MutationError> {
        let order_id = order_id.trim();
        if order_id.is_empty() {
            return Err(MutationError::MissingOrderId);
        }
        Ok(MarkFulfilledRequest {
            action: "markFulfilled".to_string(),
            order_id: order_id.to_string(),
            fulfilment_date: fulfilment_date.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(sku: &str, qty: f64, revenue: f64) -> OrderLine {
        OrderLine {
            sku: sku.to_string(),
            qty,
            line_revenue: revenue,
        }
    }

    #[test]
    fn builds_with_derived_total() {
        let req = CreateOrderRequest::build(
            " #100 ",
            "07/03/2024",
            None,
            None,
            vec![line("A1", 2.0, 10.004), line("B2", 1.0, 5.0)],
        )
        .unwrap();
        assert_eq!(req.order_id, "#100");
        assert_eq!(req.fulfilment_partner, DEFAULT_FULFILMENT_PARTNER);
        assert_eq!(req.order_total, 15.0);
        assert_eq!(req.line_items.len(), 2);
    }

    #[test]
    fn explicit_total_wins_over_derived() {
        let req =
            CreateOrderRequest::build("#1", "N/A", Some("ACME"), Some(99.5), vec![line("A1", 1.0, 10.0)])
                .unwrap();
        assert_eq!(req.order_total, 99.5);
        assert_eq!(req.fulfilment_partner, "ACME");
    }

    #[test]
    fn blank_sku_lines_are_discarded() {
        let req = CreateOrderRequest::build(
            "#1",
            "N/A",
            None,
            None,
            vec![line("  ", 1.0, 10.0), line("A1", 1.0, 2.5)],
        )
        .unwrap();
        assert_eq!(req.line_items.len(), 1);
        assert_eq!(req.line_items[0].sku, "A1");
        assert_eq!(req.order_total, 2.5);
    }

    #[test]
    fn rejects_empty_id_and_empty_lines() {
        assert_eq!(
            CreateOrderRequest::build("  ", "N/A", None, None, vec![line("A1", 1.0, 1.0)]),
            Err(MutationError::MissingOrderId)
        );
        assert_eq!(
            CreateOrderRequest::build("#1", "N/A", None, None, vec![line(" ", 1.0, 1.0)]),
            Err(MutationError::NoLineItems)
        );
    }

    #[test]
    fn create_order_wire_shape() {
        let req =
            CreateOrderRequest::build("#1", "07/03/2024", None, None, vec![line("A1", 2.0, 10.0)])
                .unwrap();
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "orderId": "#1",
                "orderDate": "07/03/2024",
                "fulfilmentPartner": "CHATHAM",
                "orderTotal": 10.0,
                "lineItems": [{ "sku": "A1", "qty": 2.0, "lineRevenue": 10.0 }],
            })
        );
    }

    #[test]
    fn mark_fulfilled_wire_shape() {
        let req = MarkFulfilledRequest::new("#1", "08/03/2024").unwrap();
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "action": "markFulfilled",
                "orderId": "#1",
                "fulfilmentDate": "08/03/2024",
            })
        );
        assert_eq!(
            MarkFulfilledRequest::new("", "08/03/2024"),
            Err(MutationError::MissingOrderId)
        );
    }
}
