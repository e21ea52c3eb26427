//! `spoolctl find`: Search spools by name or id.

use spoolctl_core::{Inventory, Spool, SpoolQuery};
use spoolctl_planner::search::{self, Recency, SpoolFilter};
use spoolctl_planner::{DestinationResolver, OrderStore};
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

pub struct FindOptions {
    pub location: Option<String>,
    pub manufacturer: Option<String>,
    pub allow_archived: bool,
    pub filter: SpoolFilter,
    /// `None` sorts by the stored location order
    pub recency: Option<Recency>,
}

/// Spools found for one selector.
pub(crate) struct Found {
    pub selector: String,
    pub spools: Vec<Spool>,
}

pub async fn run(
    config_path: Option<&Path>,
    selectors: &[String],
    options: FindOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let inventory = super::connect(&config)?;
    let resolver = super::resolver(&config);

    for found in lookup(inventory, &resolver, selectors, &options).await? {
        print_found(&found);
    }
    Ok(())
}

pub(crate) async fn lookup(
    inventory: Arc<dyn Inventory>,
    resolver: &DestinationResolver,
    selectors: &[String],
    options: &FindOptions,
) -> Result<Vec<Found>, Box<dyn std::error::Error>> {
    let mut query = SpoolQuery::all();
    if let Some(location) = &options.location {
        let location = resolver.alias(location);
        println!("Filtering by location: {location}");
        query = query.with_location(location);
    }
    if let Some(vendor) = &options.manufacturer {
        query = query.with_vendor(vendor.as_str());
    }
    if options.allow_archived {
        query = query.including_archived();
    }

    // Ordering by location is a nicety; an unreadable order is not fatal.
    let orders = match options.recency {
        Some(_) => None,
        None => match OrderStore::new(inventory.clone()).load().await {
            Ok(orders) => Some(orders),
            Err(e) => {
                warn!("Ignoring location order: {e}");
                None
            }
        },
    };

    let wildcard = ["*".to_string()];
    let selectors = if selectors.is_empty() { &wildcard[..] } else { selectors };

    let mut results = Vec::with_capacity(selectors.len());
    for selector in selectors {
        let mut spools =
            search::find_spools(inventory.as_ref(), selector, &query, &options.filter).await?;
        match (options.recency, &orders) {
            (Some(recency), _) => search::sort_by_recency(&mut spools, recency),
            (None, Some(orders)) => search::sort_by_location_order(&mut spools, orders),
            (None, None) => {}
        }
        results.push(Found {
            selector: selector.clone(),
            spools,
        });
    }
    Ok(results)
}

fn print_found(found: &Found) {
    let count = found.spools.len();
    if found.selector.trim().parse::<u64>().is_ok() {
        println!("Found {count} spool with ID #{}:", found.selector);
    } else {
        println!("Found {count} spools matching '{}':", found.selector);
    }
    if count == 0 {
        println!();
        return;
    }

    let (mut remaining, mut used) = (0.0, 0.0);
    for spool in &found.spools {
        println!(" - {spool}");
        remaining += spool.remaining_weight;
        used += spool.used_weight;
    }
    let noun = if count == 1 { "spool" } else { "spools" };
    println!("Summary: {count} {noun}, Remaining: {remaining:.1}g, Used: {used:.1}g");
    println!();
}
