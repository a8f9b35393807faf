//! Apps Script webhook client — the write path.
//!
//! Mutations (append an order, stamp a fulfilment) go through a deployed
//! Apps Script web app rather than the Sheets API, so the sheet's owner
//! controls what writes are allowed.

use std::time::Duration;

use serde::Serialize;

use crate::error::SheetsError;

/// Result reported by the webhook for one mutation.
///
/// A reachable server always yields an outcome, even for a rejected
/// mutation; only transport failures surface as [`SheetsError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationOutcome {
    pub ok: bool,
    pub message: String,
}

/// Blocking client for the mutation webhook.
#[derive(Clone)]
pub struct AppsScriptClient {
    http: reqwest::blocking::Client,
    script_url: String,
}

impl AppsScriptClient {
    pub fn new(script_url: &str) -> Result<Self, SheetsError> {
        if script_url.trim().is_empty() {
            return Err(SheetsError::NotConfigured("script url is empty".into()));
        }
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("orderdesk/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SheetsError::Network(e.to_string()))?;
        Ok(Self {
            http,
            script_url: script_url.to_string(),
        })
    }

    /// POST one mutation payload and interpret the webhook's answer.
    ///
    /// The script reports `{"success": bool, "error": "..."}`; absence of
    /// the `success` field counts as success, matching the deployed
    /// script's happy path. Non-2xx statuses become failed outcomes with
    /// the server's error text when it sent any.
    pub fn post(&self, payload: &impl Serialize) -> Result<MutationOutcome, SheetsError> {
        let body =
            serde_json::to_string(payload).map_err(|e| SheetsError::Parse(e.to_string()))?;
        log::debug!("posting mutation to webhook: {body}");

        let response = self
            .http
            .post(&self.script_url)
            // Apps Script web apps reject preflighted content types; plain
            // text sidesteps that and the script parses the body itself.
            .header("Content-Type", "text/plain;charset=utf-8")
            .body(body)
            .send()
            .map_err(|e| SheetsError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let success_status = response.status().is_success();
        let text = response.text().unwrap_or_default();
        let data: serde_json::Value = serde_json::from_str(&text).unwrap_or(serde_json::Value::Null);

        if !success_status {
            let message = data["error"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| format!("Server returned {status}"));
            return Ok(MutationOutcome { ok: false, message });
        }

        let ok = data["success"].as_bool() != Some(false);
        let message = if ok {
            data["message"].as_str().unwrap_or("OK").to_string()
        } else {
            data["error"].as_str().unwrap_or("Rejected by server").to_string()
        };
        Ok(MutationOutcome { ok, message })
    }
}
