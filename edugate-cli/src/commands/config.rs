//! Config command - show and change settings

use anyhow::Result;
use clap::Subcommand;
use comfy_table::{ContentArrangement, Table};

use edugate_core::adapters::http::HttpGateway;
use edugate_core::config::Config;

use super::get_edugate_dir;
use crate::output;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Point the client at another backend
    SetUrl {
        /// Base URL, e.g. https://api.example.com
        url: String,
    },
}

pub fn run(command: ConfigCommands) -> Result<()> {
    let dir = get_edugate_dir()?;
    std::fs::create_dir_all(&dir)?;

    match command {
        ConfigCommands::Show { json } => {
            let config = Config::load(&dir)?;
            if json {
                let body = serde_json::json!({
                    "apiBaseUrl": config.api_base_url,
                    "requestTimeoutSecs": config.request_timeout_secs,
                    "reconcileAfterWrite": config.reconcile_after_write,
                    "coursesPerPage": config.courses_per_page,
                    "directory": dir.display().to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
                return Ok(());
            }
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.add_row(vec!["API base URL", config.api_base_url.as_str()]);
            table.add_row(vec!["Request timeout", &format!("{}s", config.request_timeout_secs)]);
            table.add_row(vec!["Reconcile after write", &config.reconcile_after_write.to_string()]);
            table.add_row(vec!["Courses per page", &config.courses_per_page.to_string()]);
            table.add_row(vec!["Directory", &dir.display().to_string()]);
            println!("{}", table);
        }
        ConfigCommands::SetUrl { url } => {
            let mut config = Config::load(&dir)?;
            // Same validation the gateway applies at startup
            HttpGateway::new_with_base_url(&url, config.request_timeout())?;
            config.api_base_url = url.trim_end_matches('/').to_string();
            config.save(&dir)?;
            output::success(&format!("API base URL set to {}", config.api_base_url));
        }
    }

    Ok(())
}
