//! `orderdesk-engine` — reconciliation and normalization for sheet-backed
//! order data.
//!
//! Pure engine crate: receives pre-loaded rows, returns normalized,
//! grouped, sorted aggregates. No IO, no HTTP, no CLI concepts.

pub mod catalog;
pub mod cell;
pub mod header;
pub mod mutation;
pub mod normalize;
pub mod orders;
pub mod payouts;

pub use catalog::Catalog;
pub use cell::{Cell, RawRow};
pub use header::HeaderLocation;
pub use mutation::{CreateOrderRequest, MarkFulfilledRequest, MutationError, OrderLine};
pub use orders::{LineItem, OrderAggregate, OrderPartitions};
pub use payouts::PayoutSummary;
