//! Configuration loading: flags > environment > config file.
//!
//! The env layer is handled by clap (`env = "ORDERDESK_…"` on the flags),
//! so by the time values reach [`DeskConfig::resolve`] the flag layer
//! already folds the environment in. The file layer fills whatever is
//! still missing.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::exit_codes;
use crate::CliError;

pub const CONFIG_FILE_NAME: &str = "orderdesk.toml";

/// Tab names within the spreadsheet.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TabsConfig {
    pub orders: String,
    pub settlement: String,
    pub setup: String,
}

impl Default for TabsConfig {
    fn default() -> Self {
        Self {
            orders: "orders_raw".to_string(),
            settlement: "Chatham_Settlement".to_string(),
            setup: "Setup".to_string(),
        }
    }
}

/// On-disk config file shape. Every field is optional; flags and env
/// fill the gaps.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub sheet_id: Option<String>,
    pub api_key: Option<String>,
    pub script_url: Option<String>,
    pub tabs: TabsConfig,
}

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct DeskConfig {
    pub sheet_id: String,
    pub api_key: Option<String>,
    pub script_url: Option<String>,
    pub tabs: TabsConfig,
}

impl DeskConfig {
    /// Merge flag/env values over the config file.
    ///
    /// `sheet_id` is the only hard requirement; the API key and script
    /// URL are checked lazily by the commands that need them.
    pub fn resolve(
        config_path: Option<&Path>,
        sheet_id: Option<String>,
        api_key: Option<String>,
        script_url: Option<String>,
    ) -> Result<DeskConfig, CliError> {
        let file = load_file(config_path)?;

        let sheet_id = sheet_id
            .or(file.sheet_id)
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                CliError {
                    code: exit_codes::EXIT_CONFIG_MISSING,
                    message: "no sheet id configured".to_string(),
                    hint: Some(format!(
                        "pass --sheet-id, set ORDERDESK_SHEET_ID, or add sheet_id to {}",
                        default_path()
                            .map(|p| p.display().to_string())
                            .unwrap_or_else(|| CONFIG_FILE_NAME.to_string()),
                    )),
                }
            })?;

        Ok(DeskConfig {
            sheet_id,
            api_key: api_key.or(file.api_key).filter(|s| !s.trim().is_empty()),
            script_url: script_url
                .or(file.script_url)
                .filter(|s| !s.trim().is_empty()),
            tabs: file.tabs,
        })
    }

    /// The script URL, required for mutation commands.
    pub fn require_script_url(&self) -> Result<&str, CliError> {
        self.script_url.as_deref().ok_or_else(|| CliError {
            code: exit_codes::EXIT_CONFIG_MISSING,
            message: "no Apps Script webhook URL configured".to_string(),
            hint: Some(
                "pass --script-url, set ORDERDESK_SCRIPT_URL, or add script_url to the config file"
                    .to_string(),
            ),
        })
    }
}

fn load_file(explicit: Option<&Path>) -> Result<ConfigFile, CliError> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match default_path() {
            Some(p) if p.exists() => p,
            // No config file is fine; flags and env may cover everything.
            _ => return Ok(ConfigFile::default()),
        },
    };

    let contents = std::fs::read_to_string(&path).map_err(|e| CliError {
        code: exit_codes::EXIT_CONFIG_PARSE,
        message: format!("cannot read {}: {}", path.display(), e),
        hint: None,
    })?;
    toml::from_str(&contents).map_err(|e| CliError {
        code: exit_codes::EXIT_CONFIG_PARSE,
        message: format!("cannot parse {}: {}", path.display(), e),
        hint: None,
    })
}

fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("orderdesk").join(CONFIG_FILE_NAME))
}
