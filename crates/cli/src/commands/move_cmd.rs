//! `spoolctl move`: Relocate spools and keep the location order in sync.

use super::prompt::LinePrompter;
use spoolctl_core::{Inventory, location_label};
use spoolctl_planner::relocate::{self, OrderDiff, PlannedMove};
use spoolctl_planner::{OrderStore, Prompter};
use std::path::Path;
use std::sync::Arc;

pub struct MoveOptions {
    pub dest: Option<String>,
    pub from: Option<String>,
    pub dry_run: bool,
    pub interactive: bool,
}

pub async fn run(
    config_path: Option<&Path>,
    args: &[String],
    options: MoveOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let inventory = super::connect(&config)?;
    let mut prompter = LinePrompter::stdin();
    execute(inventory, &super::resolver(&config), args, &options, &mut prompter).await
}

pub(crate) async fn execute(
    inventory: Arc<dyn Inventory>,
    resolver: &spoolctl_planner::DestinationResolver,
    args: &[String],
    options: &MoveOptions,
    prompter: &mut dyn Prompter,
) -> Result<(), Box<dyn std::error::Error>> {
    let requests = relocate::parse_move_args(args, options.dest.as_deref(), resolver)?;

    let mut moves = Vec::with_capacity(requests.len());
    for request in requests {
        let spool = relocate::resolve_selector(
            inventory.as_ref(),
            &request.selector,
            options.from.as_deref(),
            options.interactive,
            prompter,
        )
        .await?;
        moves.push(PlannedMove {
            spool,
            dest: request.dest,
        });
    }

    let store = OrderStore::new(inventory.clone());
    let mut orders = store.load().await?;
    let diffs = relocate::apply_moves(&mut orders, &moves);

    if options.dry_run {
        println!("Dry run:");
        for mv in &moves {
            println!("  {} -> {}", mv.spool, describe(&mv.dest.location, mv.dest.position));
        }
        print_diffs(&diffs);
        return Ok(());
    }

    let results = relocate::execute_moves(inventory.as_ref(), &store, &orders, &moves).await?;
    let mut failures = 0;
    for (mv, (_, result)) in moves.iter().zip(results) {
        match result {
            Ok(()) => println!(
                "✅ Moved {} to {}",
                mv.spool,
                describe(&mv.dest.location, mv.dest.position)
            ),
            Err(e) => {
                println!("❌ Failed to move #{}: {e}", mv.spool.id);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(format!("{failures} move(s) failed").into());
    }
    Ok(())
}

fn describe(location: &str, position: Option<i64>) -> String {
    let label = if location.is_empty() {
        "nowhere"
    } else {
        location_label(location)
    };
    match position {
        Some(slot) => format!("{label} slot {slot}"),
        None => label.to_string(),
    }
}

fn print_diffs(diffs: &[OrderDiff]) {
    for diff in diffs {
        println!("  {}:", location_label(&diff.location));
        println!("    before: {:?}", diff.before);
        println!("    after:  {:?}", diff.after);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spoolctl_core::{Filament, Spool};
    use spoolctl_inventory::InMemoryInventory;
    use spoolctl_planner::{DestinationResolver, ORDERS_SETTING_KEY, ScriptedPrompter};
    use std::collections::HashMap;

    fn inventory() -> InMemoryInventory {
        InMemoryInventory::with_spools([
            Spool::new(1, Filament::new(1, "PLA Black", "PLA")).with_location("Shelf"),
            Spool::new(2, Filament::new(2, "PLA White", "PLA")).with_location("Shelf"),
        ])
    }

    fn resolver() -> DestinationResolver {
        let mut aliases = HashMap::new();
        aliases.insert("A".to_string(), "AMS A".to_string());
        DestinationResolver::new(&aliases)
    }

    fn options(dry_run: bool) -> MoveOptions {
        MoveOptions {
            dest: None,
            from: None,
            dry_run,
            interactive: false,
        }
    }

    #[tokio::test]
    async fn moves_spool_and_saves_order() {
        let inv = inventory();
        let args = vec!["1".to_string(), "A:1".to_string()];
        let mut prompter = ScriptedPrompter::new();
        execute(Arc::new(inv.clone()), &resolver(), &args, &options(false), &mut prompter)
            .await
            .unwrap();

        assert_eq!(inv.locations().await[&1], "AMS A");
        assert_eq!(inv.setting_writes(), 1);
        let settings = inv.get_settings().await.unwrap();
        assert!(settings.contains_key(ORDERS_SETTING_KEY));
    }

    #[tokio::test]
    async fn dry_run_writes_nothing() {
        let inv = inventory();
        let args = vec!["white".to_string(), "A".to_string()];
        let mut prompter = ScriptedPrompter::new();
        execute(Arc::new(inv.clone()), &resolver(), &args, &options(true), &mut prompter)
            .await
            .unwrap();

        assert_eq!(inv.locations().await[&2], "Shelf");
        assert_eq!(inv.setting_writes(), 0);
    }

    #[tokio::test]
    async fn ambiguous_name_fails_non_interactive() {
        let inv = inventory();
        let args = vec!["pla".to_string(), "A".to_string()];
        let mut prompter = ScriptedPrompter::new();
        let err = execute(Arc::new(inv.clone()), &resolver(), &args, &options(false), &mut prompter)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("multiple spools found (2)"));
        assert_eq!(inv.setting_writes(), 0);
    }

    #[test]
    fn empty_destination_reads_nowhere() {
        assert_eq!(describe("", None), "nowhere");
        assert_eq!(describe("AMS A", Some(2)), "AMS A slot 2");
    }
}
