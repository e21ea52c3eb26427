//! Moving spools between locations by hand.

use crate::destination::{DestSpec, DestinationResolver};
use crate::orders::{OrderList, OrderStore};
use crate::placement;
use crate::prompt::Prompter;
use spoolctl_core::error::{Error, InventoryError, MoveError};
use spoolctl_core::inventory::{Inventory, SpoolPatch, SpoolQuery};
use spoolctl_core::spool::{Spool, SpoolId};
use tracing::debug;

/// A spool selector (id or name fragment) and where it should go.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveRequest {
    pub selector: String,
    pub token: String,
    pub dest: DestSpec,
}

/// Pair up `selector destination` arguments, or apply `default_dest` to every selector.
pub fn parse_move_args(
    args: &[String],
    default_dest: Option<&str>,
    resolver: &DestinationResolver,
) -> Result<Vec<MoveRequest>, MoveError> {
    let mut requests = Vec::new();
    let mut args = args.iter();
    while let Some(selector) = args.next() {
        let token = match default_dest {
            Some(dest) => dest.to_string(),
            None => args.next().ok_or(MoveError::MissingDestination)?.clone(),
        };
        requests.push(MoveRequest {
            selector: selector.clone(),
            dest: resolver.resolve(&token),
            token,
        });
    }
    Ok(requests)
}

/// Find the one spool a selector refers to.
///
/// Numeric selectors are spool ids. Anything else is matched against filament
/// names, optionally limited to `from`. Several matches are offered to the
/// prompter when `interactive`, otherwise they are an error.
pub async fn resolve_selector(
    inventory: &dyn Inventory,
    selector: &str,
    from: Option<&str>,
    interactive: bool,
    prompter: &mut dyn Prompter,
) -> Result<Spool, Error> {
    if let Ok(id) = selector.trim().parse::<SpoolId>() {
        return Ok(inventory.get_spool(id).await?);
    }

    let mut query = SpoolQuery::by_name(selector);
    if let Some(from) = from {
        query = query.with_location(from);
    }
    let mut matches = inventory.list_spools(&query).await?;
    debug!(selector, count = matches.len(), "Resolved spool selector");

    match matches.len() {
        0 => Err(MoveError::NoMatch(selector.to_string()).into()),
        1 => Ok(matches.remove(0)),
        count if !interactive => Err(MoveError::Ambiguous {
            selector: selector.to_string(),
            count,
        }
        .into()),
        _ => {
            let labels: Vec<String> = matches.iter().map(|s| s.to_string()).collect();
            let chosen = prompter
                .choose(&format!("Select spool for '{selector}'"), &labels)
                .ok_or(MoveError::Cancelled)?;
            Ok(matches.swap_remove(chosen))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedMove {
    pub spool: Spool,
    pub dest: DestSpec,
}

/// Before/after order of one location touched by a batch of moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDiff {
    pub location: String,
    pub before: Vec<SpoolId>,
    pub after: Vec<SpoolId>,
}

/// Apply `moves` to `orders` in sequence and report touched destinations.
pub fn apply_moves(orders: &mut OrderList, moves: &[PlannedMove]) -> Vec<OrderDiff> {
    let mut diffs: Vec<OrderDiff> = Vec::new();
    for mv in moves {
        if !diffs.iter().any(|d| d.location == mv.dest.location) {
            diffs.push(OrderDiff {
                location: mv.dest.location.clone(),
                before: orders.get(&mv.dest.location).to_vec(),
                after: Vec::new(),
            });
        }
        placement::place(orders, mv.spool.id, &mv.dest);
    }
    for diff in &mut diffs {
        diff.after = orders.get(&diff.location).to_vec();
    }
    diffs
}

/// Persist `orders` first, then relocate each spool.
///
/// A failed save aborts before any spool moves. Individual relocation
/// failures are returned per spool so the rest still go through.
pub async fn execute_moves(
    inventory: &dyn Inventory,
    store: &OrderStore,
    orders: &OrderList,
    moves: &[PlannedMove],
) -> Result<Vec<(SpoolId, Result<(), InventoryError>)>, Error> {
    store.save(orders).await?;
    let mut results = Vec::with_capacity(moves.len());
    for mv in moves {
        let result = inventory.move_spool(mv.spool.id, &mv.dest.location).await;
        results.push((mv.spool.id, result));
    }
    Ok(results)
}

/// Take `spools` out of every location list, save, then archive each one.
///
/// Like [`execute_moves`], a failed save stops before any spool changes and
/// per-spool failures are returned alongside the successes.
pub async fn archive_spools(
    inventory: &dyn Inventory,
    store: &OrderStore,
    spools: &[Spool],
) -> Result<Vec<(SpoolId, Result<(), InventoryError>)>, Error> {
    let mut orders = store.load().await?;
    for spool in spools {
        placement::remove_from_all(&mut orders, spool.id);
    }
    store.save(&orders).await?;

    let mut results = Vec::with_capacity(spools.len());
    for spool in spools {
        let result = inventory.patch_spool(spool.id, &SpoolPatch::archive()).await;
        results.push((spool.id, result));
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompter;
    use spoolctl_core::spool::Filament;
    use spoolctl_inventory::InMemoryInventory;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn resolver() -> DestinationResolver {
        let mut aliases = HashMap::new();
        aliases.insert("A".to_string(), "AMS A".to_string());
        DestinationResolver::new(&aliases)
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn spool(id: SpoolId, name: &str, location: &str) -> Spool {
        Spool::new(id, Filament::new(id, name, "PLA")).with_location(location)
    }

    #[test]
    fn pairs_selectors_with_destinations() {
        let requests = parse_move_args(&args(&["12", "A:1", "black", "Shelf"]), None, &resolver()).unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].dest, DestSpec::at("AMS A", 1));
        assert_eq!(requests[1].selector, "black");
        assert_eq!(requests[1].dest, DestSpec::location("Shelf"));
    }

    #[test]
    fn default_destination_applies_to_all() {
        let requests = parse_move_args(&args(&["1", "2", "3"]), Some("<empty>"), &resolver()).unwrap();
        assert_eq!(requests.len(), 3);
        assert!(requests.iter().all(|r| r.dest == DestSpec::location("")));
    }

    #[test]
    fn dangling_selector_is_an_error() {
        let err = parse_move_args(&args(&["1", "A", "2"]), None, &resolver()).unwrap_err();
        assert!(matches!(err, MoveError::MissingDestination));
    }

    #[tokio::test]
    async fn selectors_by_id_and_name() {
        let inventory = InMemoryInventory::with_spools([
            spool(1, "Galaxy Black", "Shelf"),
            spool(2, "Jet Black", "AMS A"),
            spool(3, "White", "Shelf"),
        ]);
        let mut prompter = ScriptedPrompter::new();

        let by_id = resolve_selector(&inventory, "3", None, false, &mut prompter).await.unwrap();
        assert_eq!(by_id.id, 3);

        let by_name = resolve_selector(&inventory, "white", None, false, &mut prompter).await.unwrap();
        assert_eq!(by_name.id, 3);

        let narrowed = resolve_selector(&inventory, "black", Some("Shelf"), false, &mut prompter)
            .await
            .unwrap();
        assert_eq!(narrowed.id, 1);

        let err = resolve_selector(&inventory, "black", None, false, &mut prompter)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Move(MoveError::Ambiguous { count: 2, .. })));

        let err = resolve_selector(&inventory, "99", None, false, &mut prompter)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Inventory(InventoryError::SpoolNotFound(99))));
    }

    #[tokio::test]
    async fn ambiguous_selector_prompts_when_interactive() {
        let inventory = InMemoryInventory::with_spools([
            spool(1, "Galaxy Black", "Shelf"),
            spool(2, "Jet Black", "AMS A"),
        ]);
        let mut prompter = ScriptedPrompter::new().choose_index(Some(0));
        let chosen = resolve_selector(&inventory, "black", None, true, &mut prompter)
            .await
            .unwrap();
        // listing is sorted by location first
        assert_eq!(chosen.id, 2);

        let err = resolve_selector(&inventory, "black", None, true, &mut prompter)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Move(MoveError::Cancelled)));
    }

    #[test]
    fn batch_diff_reports_touched_locations() {
        let mut orders = OrderList::new();
        orders.set("AMS A", vec![10, 20]);
        orders.set("Shelf 1", vec![30]);
        let moves = vec![
            PlannedMove { spool: spool(20, "x", "AMS A"), dest: DestSpec::at("AMS A", 1) },
            PlannedMove { spool: spool(30, "y", "Shelf 1"), dest: DestSpec::location("AMS A") },
        ];
        let diffs = apply_moves(&mut orders, &moves);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].before, vec![10, 20]);
        assert_eq!(diffs[0].after, vec![20, 10, 30]);
        assert!(orders.get("Shelf 1").is_empty());
    }

    #[tokio::test]
    async fn execute_saves_orders_then_moves() {
        let inventory = InMemoryInventory::with_spools([spool(20, "x", "AMS A")]);
        let store = OrderStore::new(Arc::new(inventory.clone()));
        let mut orders = OrderList::new();
        orders.set("AMS A", vec![10, 20]);
        let moves = vec![
            PlannedMove { spool: spool(20, "x", "AMS A"), dest: DestSpec::location("Shelf") },
            PlannedMove { spool: spool(77, "ghost", "Shelf"), dest: DestSpec::location("AMS A") },
        ];
        apply_moves(&mut orders, &moves);

        let results = execute_moves(&inventory, &store, &orders, &moves).await.unwrap();
        assert!(results[0].1.is_ok());
        assert!(results[1].1.as_ref().unwrap_err().is_not_found());
        assert_eq!(inventory.locations().await[&20], "Shelf");
        assert_eq!(store.load().await.unwrap().get("Shelf"), &[20]);
    }

    #[tokio::test]
    async fn archiving_drops_spool_from_every_list() {
        let inventory = InMemoryInventory::with_spools([
            spool(20, "x", "AMS A"),
            spool(30, "y", "Shelf 1"),
        ]);
        let store = OrderStore::new(Arc::new(inventory.clone()));
        let mut orders = OrderList::new();
        orders.set("AMS A", vec![10, 20]);
        orders.set("Shelf 1", vec![30, 20]);
        store.save(&orders).await.unwrap();

        let results = archive_spools(&inventory, &store, &[spool(20, "x", "AMS A")])
            .await
            .unwrap();
        assert!(results[0].1.is_ok());

        let after = inventory.get_spool(20).await.unwrap();
        assert!(after.archived);
        assert_eq!(after.location, "");
        let orders = store.load().await.unwrap();
        assert_eq!(orders.get("AMS A"), &[10]);
        assert_eq!(orders.get("Shelf 1"), &[30]);
        assert_eq!(inventory.locations().await[&30], "Shelf 1");
    }
}
