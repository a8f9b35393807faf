//! `orderdesk-sheets` — Google Sheets row source and Apps Script mutation
//! sink.
//!
//! Blocking reqwest clients (no Tokio runtime required). Reads come from
//! the Sheets v4 values API with a public gviz export fallback; writes go
//! through an Apps Script webhook.

mod appscript;
mod client;
mod error;

pub use appscript::{AppsScriptClient, MutationOutcome};
pub use client::SheetsClient;
pub use error::SheetsError;
