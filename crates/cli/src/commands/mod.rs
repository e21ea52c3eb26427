pub mod archive;
pub mod config_cmd;
pub mod doctor;
pub mod find;
pub mod low;
pub mod move_cmd;
pub mod orders;
pub mod plan;
pub mod prompt;
pub mod use_cmd;

use spoolctl_config::AppConfig;
use spoolctl_core::Inventory;
use spoolctl_inventory::SpoolmanClient;
use spoolctl_planner::DestinationResolver;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Load the config from `--config` when given, else the default location.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => AppConfig::load_with_overrides(path),
        None => AppConfig::load(),
    };
    config.map_err(|e| format!("Failed to load config: {e}").into())
}

pub fn config_file(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_path)
}

/// Build the inventory client from `api_base`.
pub fn connect(config: &AppConfig) -> Result<Arc<dyn Inventory>, Box<dyn std::error::Error>> {
    let client = spoolman(config)?;
    Ok(Arc::new(client))
}

pub fn spoolman(config: &AppConfig) -> Result<SpoolmanClient, Box<dyn std::error::Error>> {
    let base = config.require_api_base()?;
    debug!(base, timeout = config.http.timeout_secs, "Connecting to inventory");
    let client = SpoolmanClient::new(base, Duration::from_secs(config.http.timeout_secs))?;
    Ok(client)
}

pub fn resolver(config: &AppConfig) -> DestinationResolver {
    DestinationResolver::new(&config.location_aliases)
}
