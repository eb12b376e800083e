pub mod charts;
pub mod config;
pub mod export;
pub mod report;
pub mod view;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::api::{HttpInventoryApi, InventoryApi};
use crate::error::{MandiError, Result};
use crate::models::{InventoryKind, Tab};
use crate::settings::{load_settings, Settings};

/// Validate a `--today` override, falling back to the current UTC date.
pub(crate) fn parse_today(today: &Option<String>) -> Result<String> {
    match today {
        Some(t) => chrono::NaiveDate::parse_from_str(t.trim(), "%Y-%m-%d")
            .map(|d| d.format("%Y-%m-%d").to_string())
            .map_err(|_| MandiError::Other(format!("--today expects YYYY-MM-DD, got '{t}'"))),
        None => Ok(crate::reports::today()),
    }
}

#[derive(Parser)]
#[command(name = "mandi", about = "Inventory reports for Apni Mandi stores.")]
pub struct Cli {
    /// Inventory API base URL (overrides settings and MANDI_API_URL)
    #[arg(long = "api-url", global = true)]
    pub api_url: Option<String>,
    /// Treat this date (YYYY-MM-DD) as today when splitting records
    #[arg(long, global = true)]
    pub today: Option<String>,
    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Browse a page of inventory records interactively.
    View {
        /// Inventory type
        #[arg(value_enum)]
        kind: InventoryKind,
        /// Page to open
        #[arg(long, default_value = "1")]
        page: u32,
        /// Tab to open
        #[arg(long, value_enum, default_value = "today")]
        tab: Tab,
    },
    /// Print a page of inventory records as a text report.
    Report {
        #[arg(value_enum)]
        kind: InventoryKind,
        #[arg(long, default_value = "1")]
        page: u32,
        #[arg(long, value_enum, default_value = "today")]
        tab: Tab,
    },
    /// Export the records of one tab of one page to CSV.
    Export {
        #[arg(value_enum)]
        kind: InventoryKind,
        #[arg(long, default_value = "1")]
        page: u32,
        #[arg(long, value_enum, default_value = "today")]
        tab: Tab,
        /// Output file path (default: <export_dir>/<kind>_inventory_<tab>.csv)
        #[arg(long)]
        output: Option<String>,
    },
    /// Write waste chart datasets (store totals, date totals) as JSON.
    Charts {
        #[arg(long, default_value = "1")]
        page: u32,
        /// Output file path (default: stdout)
        #[arg(long)]
        output: Option<String>,
    },
    /// Show or change settings.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the current settings.
    Show,
    /// Update one or more settings.
    Set {
        /// Inventory API base URL
        #[arg(long = "api-url")]
        api_url: Option<String>,
        /// Directory CSV exports are written to
        #[arg(long = "export-dir")]
        export_dir: Option<String>,
        /// Records requested per page
        #[arg(long = "page-size")]
        page_size: Option<u32>,
        /// HTTP timeout in seconds
        #[arg(long = "timeout")]
        timeout_secs: Option<u64>,
    },
}

/// Everything a command needs to talk to the inventory API.
pub struct Session {
    pub settings: Settings,
    pub api_url: String,
    pub today: String,
}

impl Session {
    pub fn new(api_url: Option<&str>, today: &Option<String>) -> Result<Self> {
        let settings = load_settings();
        let api_url = settings.resolve_api_url(api_url);
        let today = parse_today(today)?;
        log::debug!("using API {api_url}, today {today}");
        Ok(Self {
            settings,
            api_url,
            today,
        })
    }

    pub fn api(&self) -> Arc<dyn InventoryApi> {
        Arc::new(HttpInventoryApi::new(
            self.api_url.clone(),
            Duration::from_secs(self.settings.timeout_secs),
        ))
    }

    pub fn page_size(&self) -> u32 {
        self.settings.page_size.max(1)
    }
}
