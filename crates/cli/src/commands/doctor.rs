//! `spoolctl doctor`: Diagnose configuration and inventory health.

use spoolctl_config::AppConfig;
use spoolctl_planner::OrderStore;
use std::path::Path;
use std::sync::Arc;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 spoolctl Doctor: System Diagnostics");
    println!("========================================\n");

    let mut issues = 0;

    // Check config
    let path = super::config_file(config_path);
    if !path.exists() {
        println!("  ⚠️  No config file at {}; run `spoolctl config path`", path.display());
        issues += 1;
    }
    let config = match super::load_config(config_path) {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ {e}");
            println!();
            println!("  ⚠️  1 blocking issue found. Fix the config and run again.");
            return Ok(());
        }
    };

    if config.printers.is_empty() {
        println!("  ⚠️  No printers configured");
        issues += 1;
    } else {
        println!("  ✅ {} printer(s) configured", config.printers.len());
    }

    issues += check_inventory(&config).await;

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

/// Reachability of the inventory service and readability of the stored order.
async fn check_inventory(config: &AppConfig) -> usize {
    let client = match super::spoolman(config) {
        Ok(client) => client,
        Err(e) => {
            println!("  ❌ Inventory client: {e}");
            return 1;
        }
    };

    if let Err(e) = client.health().await {
        println!("  ❌ Inventory unreachable at {}: {e}", client.base_url());
        return 1;
    }
    println!("  ✅ Inventory reachable at {}", client.base_url());

    match OrderStore::new(Arc::new(client)).load().await {
        Ok(orders) => {
            println!("  ✅ Location order readable ({} location(s))", orders.iter().count());
            0
        }
        Err(e) => {
            println!("  ❌ Location order unreadable: {e}");
            1
        }
    }
}
