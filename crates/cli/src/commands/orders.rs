//! `spoolctl orders`: Show or clean the stored location order.

use spoolctl_core::{Inventory, SpoolQuery, location_label};
use spoolctl_planner::{ORDERS_SETTING_KEY, OrderStore, clean_orders};
use std::path::Path;
use std::sync::Arc;

pub async fn show(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let inventory = super::connect(&config)?;
    let orders = OrderStore::new(inventory).load().await?;

    if orders.is_empty() {
        println!("No location order stored yet.");
        return Ok(());
    }
    for (location, ids) in orders.iter() {
        println!("{}: {:?}", location_label(location), ids);
    }
    Ok(())
}

pub async fn clean(
    config_path: Option<&Path>,
    write: bool,
    add_missing: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let inventory = super::connect(&config)?;
    run_clean(inventory, write, add_missing).await
}

pub(crate) async fn run_clean(
    inventory: Arc<dyn Inventory>,
    write: bool,
    add_missing: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = OrderStore::new(inventory.clone());
    let orders = store.load().await?;
    let spools = inventory
        .list_spools(&SpoolQuery::all().including_archived())
        .await?;

    let report = clean_orders(&orders, &spools, add_missing);
    for change in &report.changes {
        let location = location_label(&change.location);
        if !change.removed.is_empty() {
            println!(
                "{location}: removing {} stale id(s): {:?}",
                change.removed.len(),
                change.removed
            );
        }
        if !change.added.is_empty() {
            println!(
                "{location}: adding {} missing id(s): {:?}",
                change.added.len(),
                change.added
            );
        }
    }

    if report.is_noop() {
        println!("No changes needed; nothing to clean or add.");
        return Ok(());
    }

    if !write {
        println!();
        println!(
            "Dry run: would remove {} and add {} id(s). Use --write to apply changes.",
            report.removed_total(),
            report.added_total()
        );
        return Ok(());
    }

    store.save(&report.cleaned).await?;
    println!(
        "✅ Updated {ORDERS_SETTING_KEY}; removed {} and added {} id(s).",
        report.removed_total(),
        report.added_total()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use spoolctl_core::{Filament, Spool};
    use spoolctl_inventory::InMemoryInventory;
    use spoolctl_planner::OrderList;
    use std::collections::BTreeMap;

    async fn seeded() -> InMemoryInventory {
        let inv = InMemoryInventory::with_spools([
            Spool::new(1, Filament::new(1, "Black", "PLA")).with_location("Shelf"),
            Spool::new(2, Filament::new(2, "White", "PLA")).with_location("AMS A"),
            Spool::new(3, Filament::new(3, "Red", "PLA")).with_location("Shelf"),
        ]);
        let mut lists = BTreeMap::new();
        lists.insert("Shelf".to_string(), vec![2, 1]);
        OrderStore::new(Arc::new(inv.clone()))
            .save(&OrderList::from(lists))
            .await
            .unwrap();
        inv
    }

    #[tokio::test]
    async fn dry_run_leaves_order_untouched() {
        let inv = seeded().await;
        run_clean(Arc::new(inv.clone()), false, true).await.unwrap();
        assert_eq!(inv.setting_writes(), 1);
    }

    #[tokio::test]
    async fn write_saves_cleaned_order() {
        let inv = seeded().await;
        run_clean(Arc::new(inv.clone()), true, true).await.unwrap();

        let orders = OrderStore::new(Arc::new(inv.clone())).load().await.unwrap();
        assert_eq!(orders.get("Shelf"), &[1, 3]);
        assert_eq!(orders.get("AMS A"), &[2]);
    }
}
