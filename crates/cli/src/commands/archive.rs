//! `spoolctl archive` / `spoolctl unarchive`: Retire spools or bring them back.

use super::prompt::LinePrompter;
use spoolctl_core::{Inventory, MoveError, Spool, SpoolId, SpoolPatch, SpoolQuery};
use spoolctl_planner::{DestinationResolver, OrderStore, Prompter, relocate};
use std::path::Path;
use std::sync::Arc;

pub struct ArchiveOptions {
    pub from: Option<String>,
    pub dry_run: bool,
    pub interactive: bool,
}

pub async fn archive(
    config_path: Option<&Path>,
    selectors: &[String],
    options: ArchiveOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let inventory = super::connect(&config)?;
    let mut prompter = LinePrompter::stdin();
    execute_archive(inventory, &super::resolver(&config), selectors, &options, &mut prompter).await
}

pub(crate) async fn execute_archive(
    inventory: Arc<dyn Inventory>,
    resolver: &DestinationResolver,
    selectors: &[String],
    options: &ArchiveOptions,
    prompter: &mut dyn Prompter,
) -> Result<(), Box<dyn std::error::Error>> {
    let from = options.from.as_deref().map(|loc| resolver.alias(loc));
    if options.dry_run {
        println!("Dry run mode enabled. Nothing will be changed.");
    }

    let mut failures = 0;
    let mut spools: Vec<Spool> = Vec::with_capacity(selectors.len());
    for selector in selectors {
        match relocate::resolve_selector(
            inventory.as_ref(),
            selector,
            from,
            options.interactive,
            prompter,
        )
        .await
        {
            Ok(spool) if spools.iter().any(|s| s.id == spool.id) => {}
            Ok(spool) => spools.push(spool),
            Err(e) => {
                println!("❌ {selector}: {e}");
                failures += 1;
            }
        }
    }

    if options.dry_run {
        for spool in &spools {
            println!("Would archive {spool} and remove it from the location order.");
        }
    } else if !spools.is_empty() {
        let store = OrderStore::new(inventory.clone());
        let results = relocate::archive_spools(inventory.as_ref(), &store, &spools).await?;
        for (spool, (_, result)) in spools.iter().zip(results) {
            match result {
                Ok(()) => println!("✅ Archived {spool}"),
                Err(e) => {
                    println!("❌ Failed to archive #{}: {e}", spool.id);
                    failures += 1;
                }
            }
        }
    }

    if failures > 0 {
        return Err(format!("{failures} spool(s) not archived").into());
    }
    Ok(())
}

pub async fn unarchive(
    config_path: Option<&Path>,
    selectors: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let inventory = super::connect(&config)?;
    execute_unarchive(inventory.as_ref(), selectors).await
}

/// Restored spools stay unplaced; `move` puts them somewhere.
pub(crate) async fn execute_unarchive(
    inventory: &dyn Inventory,
    selectors: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut failures = 0;
    for selector in selectors {
        let result = match find_archived(inventory, selector).await {
            Ok(spool) => inventory
                .patch_spool(spool.id, &SpoolPatch::unarchive())
                .await
                .map(|()| spool)
                .map_err(Into::into),
            Err(e) => Err(e),
        };
        match result {
            Ok(spool) => println!("✅ Restored #{} {}", spool.id, spool.filament.name),
            Err(e) => {
                println!("❌ {selector}: {e}");
                failures += 1;
            }
        }
    }
    if failures > 0 {
        return Err(format!("{failures} spool(s) not restored").into());
    }
    Ok(())
}

async fn find_archived(
    inventory: &dyn Inventory,
    selector: &str,
) -> Result<Spool, Box<dyn std::error::Error>> {
    if let Ok(id) = selector.trim().parse::<SpoolId>() {
        return Ok(inventory.get_spool(id).await?);
    }
    let mut matches: Vec<Spool> = inventory
        .list_spools(&SpoolQuery::by_name(selector).including_archived())
        .await?
        .into_iter()
        .filter(|s| s.archived)
        .collect();
    match matches.len() {
        0 => Err(MoveError::NoMatch(selector.to_string()).into()),
        1 => Ok(matches.remove(0)),
        count => Err(MoveError::Ambiguous {
            selector: selector.to_string(),
            count,
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spoolctl_core::Filament;
    use spoolctl_inventory::InMemoryInventory;
    use spoolctl_planner::{OrderList, ScriptedPrompter};
    use std::collections::HashMap;

    async fn seeded() -> InMemoryInventory {
        let inv = InMemoryInventory::with_spools([
            Spool::new(1, Filament::new(1, "PLA Black", "PLA")).with_location("Shelf"),
            Spool::new(2, Filament::new(2, "PLA White", "PLA")).with_location("Shelf"),
            Spool::new(3, Filament::new(3, "PETG Red", "PETG")).archived(),
        ]);
        let mut orders = OrderList::new();
        orders.set("Shelf", vec![2, 1]);
        OrderStore::new(Arc::new(inv.clone())).save(&orders).await.unwrap();
        inv
    }

    fn options(dry_run: bool) -> ArchiveOptions {
        ArchiveOptions {
            from: None,
            dry_run,
            interactive: false,
        }
    }

    fn resolver() -> DestinationResolver {
        DestinationResolver::new(&HashMap::new())
    }

    #[tokio::test]
    async fn archive_clears_location_and_order() {
        let inv = seeded().await;
        let mut prompter = ScriptedPrompter::new();
        execute_archive(Arc::new(inv.clone()), &resolver(), &["white".into()], &options(false), &mut prompter)
            .await
            .unwrap();

        let spool = inv.get_spool(2).await.unwrap();
        assert!(spool.archived);
        assert_eq!(spool.location, "");
        let orders = OrderStore::new(Arc::new(inv.clone())).load().await.unwrap();
        assert_eq!(orders.get("Shelf"), &[1]);
    }

    #[tokio::test]
    async fn dry_run_archives_nothing() {
        let inv = seeded().await;
        let mut prompter = ScriptedPrompter::new();
        execute_archive(Arc::new(inv.clone()), &resolver(), &["1".into()], &options(true), &mut prompter)
            .await
            .unwrap();
        assert!(!inv.get_spool(1).await.unwrap().archived);
        assert_eq!(inv.setting_writes(), 1);
    }

    #[tokio::test]
    async fn unknown_selector_fails_but_others_are_archived() {
        let inv = seeded().await;
        let mut prompter = ScriptedPrompter::new();
        let err = execute_archive(
            Arc::new(inv.clone()),
            &resolver(),
            &["1".into(), "nylon".into()],
            &options(false),
            &mut prompter,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("1 spool(s) not archived"));
        assert!(inv.get_spool(1).await.unwrap().archived);
    }

    #[tokio::test]
    async fn unarchive_by_name_finds_archived_spools() {
        let inv = seeded().await;
        execute_unarchive(&inv, &["red".into()]).await.unwrap();
        let spool = inv.get_spool(3).await.unwrap();
        assert!(!spool.archived);
        assert_eq!(spool.location, "");

        let err = execute_unarchive(&inv, &["black".into()]).await.unwrap_err();
        assert!(err.to_string().contains("1 spool(s) not restored"));
    }
}
