//! `spoolctl low`: Report filaments running low so you know what to reorder.

use spoolctl_config::AppConfig;
use spoolctl_core::{Inventory, SpoolQuery};
use spoolctl_planner::search::{self, SpoolFilter};
use spoolctl_planner::stock::{self, LowGroup, LowStockRules};
use std::path::Path;

pub struct LowOptions {
    /// Default threshold in grams; 0 disables the report
    pub max_remaining: f64,
    pub manufacturer: Option<String>,
    pub diameter: Option<f64>,
}

pub async fn run(
    config_path: Option<&Path>,
    selectors: &[String],
    options: LowOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let inventory = super::connect(&config)?;
    let rules = rules(&config, &options);

    let wildcard = ["*".to_string()];
    let selectors = if selectors.is_empty() { &wildcard[..] } else { selectors };
    for selector in selectors {
        let groups = report(inventory.as_ref(), selector, &rules, &options).await?;
        println!("Filaments running low matching '{selector}': {}", groups.len());
        for group in &groups {
            for spool in &group.spools {
                println!(" - {spool}");
            }
            println!(
                "   total {:.1}g (threshold {:.1}g)",
                group.remaining, group.threshold
            );
        }
        println!();
    }
    Ok(())
}

fn rules(config: &AppConfig, options: &LowOptions) -> LowStockRules {
    LowStockRules {
        threshold: options.max_remaining,
        overrides: config.low_thresholds.clone(),
        ignore: config.low_ignore.clone(),
    }
}

/// Low filament groups for one selector.
///
/// An id selector judges that spool alone; a name selector groups every
/// matching spool by filament product.
pub(crate) async fn report(
    inventory: &dyn Inventory,
    selector: &str,
    rules: &LowStockRules,
    options: &LowOptions,
) -> Result<Vec<LowGroup>, Box<dyn std::error::Error>> {
    let mut query = SpoolQuery::all();
    if let Some(vendor) = &options.manufacturer {
        query = query.with_vendor(vendor.as_str());
    }
    let filter = SpoolFilter {
        diameter: options.diameter,
        ..SpoolFilter::default()
    };
    let spools = search::find_spools(inventory, selector, &query, &filter).await?;

    if selector.trim().parse::<u64>().is_ok() {
        return Ok(spools
            .iter()
            .filter(|s| filter.matches(s))
            .filter_map(|s| stock::low_spool(s, rules))
            .collect());
    }
    Ok(stock::low_stock(&spools, rules))
}
