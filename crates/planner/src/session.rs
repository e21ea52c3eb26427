//! The swap planning session.
//!
//! For each requirement of the chosen plate the planner decides whether the
//! printer already holds enough of that filament, which spool to load, which
//! slot it goes into and, when every slot is full, which loaded spool comes
//! out. Each requirement commits on its own: order list update, relocation
//! requests, then one order list save.

use crate::destination::{DestSpec, DestinationResolver};
use crate::discovery::DiscoveredPlan;
use crate::layout::PrinterLayout;
use crate::needs::{needed_set, plate_filaments};
use crate::orders::OrderStore;
use crate::placement;
use crate::prompt::{Decision, Prompter};
use crate::ranking::{PlateOption, rank_plates, recommended};
use crate::selection::{SlotChoice, best_spool, select_slot, substitute};
use spoolctl_core::error::{Error, PlanError};
use spoolctl_core::inventory::{Inventory, SpoolQuery};
use spoolctl_core::plan::{Plate, PlateRequirement};
use spoolctl_core::spool::{FilamentId, Spool, SpoolId};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// What was done to satisfy one requirement by loading a spool.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapDecision {
    pub load: Spool,
    pub target_slot: String,
    pub evict: Option<Spool>,
    /// Where the evicted spool sat in the slot's order list
    pub evict_index: Option<usize>,
    /// Where the evicted spool went; `None` leaves it unplaced
    pub relocation: Option<DestSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequirementOutcome {
    AlreadyLoaded {
        spool: SpoolId,
        location: String,
        remaining: f64,
    },
    Swapped(SwapDecision),
    /// A loaded spool falls short and no substitute was loaded
    Insufficient { spool: SpoolId, remaining: f64 },
    NoSpoolFound,
    /// The requirement names no filament id
    Unresolved,
    /// The printer has no slots to load into
    NoSlot,
    /// Declined by the user
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequirementReport {
    pub requirement: PlateRequirement,
    pub outcome: RequirementOutcome,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionReport {
    pub requirements: Vec<RequirementReport>,
    pub aborted: bool,
}

impl SessionReport {
    pub fn swaps(&self) -> usize {
        self.requirements
            .iter()
            .filter(|r| matches!(r.outcome, RequirementOutcome::Swapped(_)))
            .count()
    }
}

/// Result of the full "what do I print next" flow.
#[derive(Debug, Clone, PartialEq)]
pub enum NextOutcome {
    NothingPending,
    Cancelled,
    Ran {
        option: PlateOption,
        report: SessionReport,
    },
}

enum Step {
    Done(RequirementOutcome),
    Abort,
}

pub struct SwapPlanner {
    inventory: Arc<dyn Inventory>,
    store: OrderStore,
    layout: PrinterLayout,
    resolver: DestinationResolver,
}

impl SwapPlanner {
    pub fn new(
        inventory: Arc<dyn Inventory>,
        layout: PrinterLayout,
        resolver: DestinationResolver,
    ) -> Self {
        Self {
            store: OrderStore::new(inventory.clone()),
            inventory,
            layout,
            resolver,
        }
    }

    pub fn layout(&self) -> &PrinterLayout {
        &self.layout
    }

    /// Rank pending plates, let the user pick one, then run a session for it.
    pub async fn plan_next(
        &self,
        plans: &[DiscoveredPlan],
        printer: &str,
        prompter: &mut dyn Prompter,
    ) -> Result<NextOutcome, Error> {
        if plans.is_empty() {
            return Err(PlanError::NoPlans.into());
        }
        let slots = self.layout.slots(printer)?;
        let spools = self.inventory.list_spools(&SpoolQuery::all()).await?;

        let options = rank_plates(plans, slots, &spools);
        if options.is_empty() {
            prompter.notify("No pending plates found.");
            return Ok(NextOutcome::NothingPending);
        }

        let best = recommended(&options);
        let labels: Vec<String> = options
            .iter()
            .enumerate()
            .map(|(i, o)| o.label(Some(i) == best))
            .collect();
        let Some(chosen) = prompter.choose("Select plate to print", &labels) else {
            return Ok(NextOutcome::Cancelled);
        };
        let option = options[chosen].clone();

        let plan = &plans[option.plan].plan;
        let Some(plate) = plan.plate(option.project, option.plate) else {
            return Err(PlanError::PlateNotFound {
                project: option.project,
                plate: option.plate,
            }
            .into());
        };
        prompter.notify(&format!(
            "Preparing to print: {} - {}",
            option.project_name, option.plate_name
        ));

        let needed = needed_set(plan, option.project, option.plate);
        let report = self.run(printer, plate, &needed, prompter).await?;
        Ok(NextOutcome::Ran { option, report })
    }

    /// Resolve every requirement of `plate` against `printer`'s slots.
    ///
    /// `needed` holds filament ids wanted by this and upcoming plates; spools
    /// of those filaments are evicted only when nothing else can go.
    pub async fn run(
        &self,
        printer: &str,
        plate: &Plate,
        needed: &HashSet<FilamentId>,
        prompter: &mut dyn Prompter,
    ) -> Result<SessionReport, Error> {
        let slots = self.layout.slots(printer)?.to_vec();
        let mut spools = self.inventory.list_spools(&SpoolQuery::all()).await?;

        let mut protected = needed.clone();
        protected.extend(plate_filaments(plate));

        let mut report = SessionReport::default();
        for requirement in &plate.needs {
            let step = self
                .resolve(requirement, &slots, &mut spools, &protected, prompter)
                .await?;
            match step {
                Step::Done(outcome) => {
                    debug!(requirement = %requirement.label(), ?outcome, "Requirement resolved");
                    report.requirements.push(RequirementReport {
                        requirement: requirement.clone(),
                        outcome,
                    });
                }
                Step::Abort => {
                    info!("Session aborted");
                    report.aborted = true;
                    break;
                }
            }
        }

        if !report.aborted {
            if report.swaps() > 0 {
                prompter.notify("Swaps complete. Happy printing!");
            } else {
                prompter.notify("Everything ready. Happy printing!");
            }
        }
        Ok(report)
    }

    /// Asks before taking a spool out of another printer's slot.
    /// `None` means go ahead with the load.
    fn confirm_cross_printer(&self, spool: &Spool, prompter: &mut dyn Prompter) -> Option<Step> {
        let other = self.layout.printer_of(&spool.location)?;
        prompter.notify(&format!(
            "! WARNING: Spool #{} ({}) is already in {} (Printer: {other})",
            spool.id, spool.filament.name, spool.location
        ));
        match prompter.confirm("Do you want to move it to this printer anyway?") {
            Decision::Proceed => None,
            Decision::Skip => {
                prompter.notify("Skipping this swap.");
                Some(Step::Done(RequirementOutcome::Skipped))
            }
            Decision::Abort => Some(Step::Abort),
        }
    }

    async fn resolve(
        &self,
        requirement: &PlateRequirement,
        slots: &[String],
        spools: &mut Vec<Spool>,
        protected: &HashSet<FilamentId>,
        prompter: &mut dyn Prompter,
    ) -> Result<Step, Error> {
        let label = requirement.label();
        if !requirement.is_resolved() {
            prompter.notify(&format!("! {label} has no filament id; resolve the plan first"));
            return Ok(Step::Done(RequirementOutcome::Unresolved));
        }
        let filament = requirement.filament_id;

        let loaded = spools
            .iter()
            .filter(|s| s.filament_id() == filament && slots.contains(&s.location))
            .max_by(|a, b| {
                a.remaining_weight
                    .total_cmp(&b.remaining_weight)
                    .then(b.id.cmp(&a.id))
            });

        let load = match loaded {
            Some(loaded) if loaded.remaining_weight >= requirement.amount => {
                prompter.notify(&format!(
                    " {label} is already loaded in {} ({:.1}g remaining)",
                    loaded.location, loaded.remaining_weight
                ));
                return Ok(Step::Done(RequirementOutcome::AlreadyLoaded {
                    spool: loaded.id,
                    location: loaded.location.clone(),
                    remaining: loaded.remaining_weight,
                }));
            }
            Some(loaded) => {
                prompter.notify(&format!(
                    "! WARNING: Loaded spool #{} ({label}) only has {:.1}g remaining, but this plate requires {:.1}g",
                    loaded.id, loaded.remaining_weight, requirement.amount
                ));
                let insufficient = RequirementOutcome::Insufficient {
                    spool: loaded.id,
                    remaining: loaded.remaining_weight,
                };
                let Some(next) = substitute(spools, filament, slots, &self.layout) else {
                    return Ok(Step::Done(insufficient));
                };
                prompter.notify(&format!(
                    "  Suggestion: load spool #{} ({:.1}g remaining) into another slot",
                    next.id, next.remaining_weight
                ));
                match prompter.confirm("Do you want to load this spool now?") {
                    Decision::Proceed => {}
                    Decision::Skip => return Ok(Step::Done(insufficient)),
                    Decision::Abort => return Ok(Step::Abort),
                }
                if let Some(step) = self.confirm_cross_printer(next, prompter) {
                    return Ok(step);
                }
                next.clone()
            }
            None => {
                let Some(best) = best_spool(spools, filament, &self.layout) else {
                    prompter.notify(&format!("! Could not find any spool for {label}"));
                    return Ok(Step::Done(RequirementOutcome::NoSpoolFound));
                };
                if let Some(step) = self.confirm_cross_printer(best, prompter) {
                    return Ok(step);
                }
                best.clone()
            }
        };

        let (target, evict) = match select_slot(slots, spools, &self.layout, protected) {
            SlotChoice::Free(slot) => (slot.to_string(), None),
            SlotChoice::Evict { location, spool } => (location.to_string(), Some(spool.clone())),
            SlotChoice::NoSlots => {
                prompter.notify("! The printer has no slots configured");
                return Ok(Step::Done(RequirementOutcome::NoSlot));
            }
        };

        let relocation = match &evict {
            Some(evicted) => {
                prompter.notify(&format!(
                    " UNLOAD #{} ({}) from {target}",
                    evicted.id, evicted.filament.name
                ));
                prompter
                    .relocation_target(evicted, &target)
                    .filter(|t| !t.trim().is_empty())
                    .map(|t| self.resolver.resolve(&t))
            }
            None => None,
        };

        prompter.notify(&format!(
            " LOAD #{} ({}) into {target} (currently at {})",
            load.id,
            load.filament.name,
            load.location_label()
        ));
        match prompter.wait_for_swap(&load, &target) {
            Decision::Proceed => {}
            Decision::Skip => return Ok(Step::Done(RequirementOutcome::Skipped)),
            Decision::Abort => return Ok(Step::Abort),
        }

        let decision = self
            .commit(load, target, evict, relocation, spools)
            .await?;
        Ok(Step::Done(RequirementOutcome::Swapped(decision)))
    }

    async fn commit(
        &self,
        load: Spool,
        target: String,
        evict: Option<Spool>,
        relocation: Option<DestSpec>,
        spools: &mut [Spool],
    ) -> Result<SwapDecision, Error> {
        let mut orders = self.store.load().await?;

        let evict_index = evict
            .as_ref()
            .and_then(|e| orders.position(&target, e.id));
        if let Some(evicted) = &evict {
            match &relocation {
                Some(dest) => {
                    placement::place(&mut orders, evicted.id, dest);
                }
                None => placement::remove_from_all(&mut orders, evicted.id),
            }
        }
        placement::place_at_index(&mut orders, load.id, &target, evict_index);

        let evict_destination = relocation
            .as_ref()
            .map(|d| d.location.clone())
            .unwrap_or_default();
        if let Some(evicted) = &evict {
            self.inventory
                .move_spool(evicted.id, &evict_destination)
                .await?;
        }
        self.inventory.move_spool(load.id, &target).await?;
        self.store.save(&orders).await?;

        for spool in spools.iter_mut() {
            if Some(spool.id) == evict.as_ref().map(|e| e.id) {
                spool.location = evict_destination.clone();
            } else if spool.id == load.id {
                spool.location = target.clone();
            }
        }

        info!(
            load = load.id,
            slot = %target,
            evict = ?evict.as_ref().map(|e| e.id),
            "Swap committed"
        );
        Ok(SwapDecision {
            load,
            target_slot: target,
            evict,
            evict_index,
            relocation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::OrderList;
    use crate::prompt::ScriptedPrompter;
    use chrono::{TimeZone, Utc};
    use spoolctl_core::plan::{PlanFile, Project, Status};
    use spoolctl_core::spool::Filament;
    use spoolctl_inventory::InMemoryInventory;
    use std::collections::{BTreeMap, HashMap};
    use std::path::PathBuf;

    fn layout(capacity: &[(&str, u32)]) -> PrinterLayout {
        let mut printers = BTreeMap::new();
        printers.insert("P1".to_string(), vec!["S1".to_string(), "S2".to_string()]);
        printers.insert("P2".to_string(), vec!["Other".to_string()]);
        let capacity: HashMap<String, u32> =
            capacity.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        PrinterLayout::new(printers, capacity)
    }

    fn planner(inventory: &InMemoryInventory, capacity: &[(&str, u32)]) -> SwapPlanner {
        let mut aliases = HashMap::new();
        aliases.insert("SH".to_string(), "Shelf 1".to_string());
        SwapPlanner::new(
            Arc::new(inventory.clone()),
            layout(capacity),
            DestinationResolver::new(&aliases),
        )
    }

    fn spool(id: SpoolId, filament: FilamentId, location: &str) -> Spool {
        Spool::new(id, Filament::new(filament, format!("F{filament}"), "PLA"))
            .with_location(location)
            .with_remaining(1000.0)
    }

    fn plate(needs: &[(FilamentId, f64)]) -> Plate {
        Plate {
            name: "plate".into(),
            status: Status::Todo,
            needs: needs
                .iter()
                .map(|(id, g)| PlateRequirement::new(*id, *g))
                .collect(),
        }
    }

    async fn seed_orders(inventory: &InMemoryInventory, lists: &[(&str, &[SpoolId])]) {
        let mut orders = OrderList::new();
        for (loc, ids) in lists {
            orders.set(*loc, ids.to_vec());
        }
        OrderStore::new(Arc::new(inventory.clone()))
            .save(&orders)
            .await
            .unwrap();
    }

    async fn orders(inventory: &InMemoryInventory) -> OrderList {
        OrderStore::new(Arc::new(inventory.clone())).load().await.unwrap()
    }

    #[tokio::test]
    async fn full_printer_evicts_unneeded_spool() {
        let inventory = InMemoryInventory::with_spools([
            spool(1, 1, "S1"),
            spool(2, 2, "S2"),
            spool(30, 3, "Shelf 1"),
        ]);
        seed_orders(&inventory, &[("S1", &[1]), ("S2", &[2]), ("Shelf 1", &[30])]).await;
        let planner = planner(&inventory, &[]);
        let mut prompter = ScriptedPrompter::new();

        let report = planner
            .run("P1", &plate(&[(3, 50.0)]), &HashSet::from([3]), &mut prompter)
            .await
            .unwrap();

        let RequirementOutcome::Swapped(decision) = &report.requirements[0].outcome else {
            panic!("expected a swap, got {:?}", report.requirements[0].outcome);
        };
        let evicted = decision.evict.as_ref().unwrap();
        assert!(evicted.id == 1 || evicted.id == 2);
        assert_eq!(decision.target_slot, evicted.location);
        assert_eq!(decision.load.id, 30);

        let locations = inventory.locations().await;
        assert_eq!(locations[&30], decision.target_slot);
        assert_eq!(locations[&evicted.id], "");

        let orders = orders(&inventory).await;
        assert_eq!(orders.get(&decision.target_slot), &[30]);
        assert_eq!(orders.location_of(evicted.id), None);
        assert!(orders.get("Shelf 1").is_empty());
        assert!(prompter.was_told("Swaps complete"));
    }

    #[tokio::test]
    async fn loaded_spool_with_enough_filament_needs_nothing() {
        let inventory = InMemoryInventory::with_spools([spool(1, 1, "S2"), spool(2, 1, "Shelf 1")]);
        let planner = planner(&inventory, &[]);
        let mut prompter = ScriptedPrompter::new();

        let report = planner
            .run("P1", &plate(&[(1, 200.0)]), &HashSet::new(), &mut prompter)
            .await
            .unwrap();

        assert!(matches!(
            report.requirements[0].outcome,
            RequirementOutcome::AlreadyLoaded { spool: 1, .. }
        ));
        assert_eq!(inventory.setting_writes(), 0);
        assert!(prompter.was_told("Everything ready"));
    }

    #[tokio::test]
    async fn short_loaded_spool_offers_fullest_substitute() {
        let inventory = InMemoryInventory::with_spools([
            spool(1, 1, "S1").with_remaining(20.0),
            spool(2, 1, "Shelf 1").with_remaining(300.0),
            spool(3, 1, "Shelf 1").with_remaining(900.0),
        ]);
        let planner = planner(&inventory, &[]);
        let mut prompter = ScriptedPrompter::new().confirm_with(Decision::Proceed);

        let report = planner
            .run("P1", &plate(&[(1, 100.0)]), &HashSet::new(), &mut prompter)
            .await
            .unwrap();

        let RequirementOutcome::Swapped(decision) = &report.requirements[0].outcome else {
            panic!("expected a swap");
        };
        assert_eq!(decision.load.id, 3);
        assert_eq!(decision.target_slot, "S2");
        assert!(decision.evict.is_none());
        assert!(prompter.was_told("only has 20.0g remaining"));
    }

    #[tokio::test]
    async fn declined_substitute_reports_insufficient() {
        let inventory = InMemoryInventory::with_spools([
            spool(1, 1, "S1").with_remaining(20.0),
            spool(2, 1, "Shelf 1"),
        ]);
        let planner = planner(&inventory, &[]);
        let mut prompter = ScriptedPrompter::new().confirm_with(Decision::Skip);

        let report = planner
            .run("P1", &plate(&[(1, 100.0)]), &HashSet::new(), &mut prompter)
            .await
            .unwrap();

        assert!(matches!(
            report.requirements[0].outcome,
            RequirementOutcome::Insufficient { spool: 1, .. }
        ));
        assert_eq!(inventory.locations().await[&2], "Shelf 1");
        assert_eq!(inventory.setting_writes(), 0);
    }

    #[tokio::test]
    async fn substitute_comes_from_storage_before_other_printer() {
        let inventory = InMemoryInventory::with_spools([
            spool(1, 1, "S1").with_remaining(20.0),
            spool(2, 1, "Other").with_remaining(900.0),
            spool(3, 1, "Shelf 1").with_remaining(300.0),
        ]);
        let planner = planner(&inventory, &[]);
        let mut prompter = ScriptedPrompter::new().confirm_with(Decision::Proceed);

        let report = planner
            .run("P1", &plate(&[(1, 100.0)]), &HashSet::new(), &mut prompter)
            .await
            .unwrap();

        let RequirementOutcome::Swapped(decision) = &report.requirements[0].outcome else {
            panic!("expected a swap");
        };
        assert_eq!(decision.load.id, 3);
        assert!(!prompter.was_told("Printer: P2"));
        assert_eq!(inventory.locations().await[&2], "Other");
        assert_eq!(inventory.locations().await[&3], "S2");
    }

    #[tokio::test]
    async fn substitute_in_other_printer_needs_confirmation() {
        let inventory = InMemoryInventory::with_spools([
            spool(1, 1, "S1").with_remaining(20.0),
            spool(2, 1, "Other").with_remaining(900.0),
        ]);
        let planner = planner(&inventory, &[]);

        let mut decline = ScriptedPrompter::new()
            .confirm_with(Decision::Proceed)
            .confirm_with(Decision::Skip);
        let report = planner
            .run("P1", &plate(&[(1, 100.0)]), &HashSet::new(), &mut decline)
            .await
            .unwrap();
        assert_eq!(report.requirements[0].outcome, RequirementOutcome::Skipped);
        assert!(decline.was_told("Printer: P2"));
        assert_eq!(inventory.locations().await[&2], "Other");

        let mut accept = ScriptedPrompter::new()
            .confirm_with(Decision::Proceed)
            .confirm_with(Decision::Proceed);
        let report = planner
            .run("P1", &plate(&[(1, 100.0)]), &HashSet::new(), &mut accept)
            .await
            .unwrap();
        assert_eq!(report.swaps(), 1);
        assert_eq!(inventory.locations().await[&2], "S2");
    }

    #[tokio::test]
    async fn missing_filament_reported_and_session_continues() {
        let inventory = InMemoryInventory::with_spools([spool(5, 5, "Shelf 1")]);
        let planner = planner(&inventory, &[]);
        let mut prompter = ScriptedPrompter::new();

        let report = planner
            .run("P1", &plate(&[(9, 10.0), (5, 10.0)]), &HashSet::new(), &mut prompter)
            .await
            .unwrap();

        assert_eq!(report.requirements[0].outcome, RequirementOutcome::NoSpoolFound);
        assert!(matches!(report.requirements[1].outcome, RequirementOutcome::Swapped(_)));
        assert!(prompter.was_told("Could not find any spool"));
    }

    #[tokio::test]
    async fn spool_in_other_printer_needs_confirmation() {
        let inventory = InMemoryInventory::with_spools([spool(7, 4, "Other")]);
        let planner = planner(&inventory, &[]);

        let mut decline = ScriptedPrompter::new().confirm_with(Decision::Skip);
        let report = planner
            .run("P1", &plate(&[(4, 10.0)]), &HashSet::new(), &mut decline)
            .await
            .unwrap();
        assert_eq!(report.requirements[0].outcome, RequirementOutcome::Skipped);
        assert_eq!(inventory.locations().await[&7], "Other");
        assert!(decline.was_told("Printer: P2"));

        let mut accept = ScriptedPrompter::new().confirm_with(Decision::Proceed);
        let report = planner
            .run("P1", &plate(&[(4, 10.0)]), &HashSet::new(), &mut accept)
            .await
            .unwrap();
        assert_eq!(report.swaps(), 1);
        assert_eq!(inventory.locations().await[&7], "S1");
    }

    #[tokio::test]
    async fn plate_filaments_are_never_evicted_when_alternative_exists() {
        let inventory = InMemoryInventory::with_spools([
            spool(1, 1, "S1").with_used(5.0).with_last_used(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()),
            spool(2, 2, "S2").with_used(5.0).with_last_used(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()),
            spool(3, 3, "Shelf 1"),
        ]);
        let planner = planner(&inventory, &[]);
        let mut prompter = ScriptedPrompter::new();

        // filament 1 is the LRU one, but this plate uses it
        let report = planner
            .run("P1", &plate(&[(1, 10.0), (3, 10.0)]), &HashSet::new(), &mut prompter)
            .await
            .unwrap();

        let RequirementOutcome::Swapped(decision) = &report.requirements[1].outcome else {
            panic!("expected a swap");
        };
        assert_eq!(decision.evict.as_ref().unwrap().id, 2);
        assert_eq!(decision.target_slot, "S2");
    }

    #[tokio::test]
    async fn loaded_spool_takes_evicted_spools_order_position() {
        let inventory = InMemoryInventory::with_spools([
            spool(5, 1, "S1").with_used(5.0).with_last_used(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()),
            spool(6, 2, "S1"),
            spool(8, 8, "S2"),
            spool(9, 3, ""),
        ]);
        seed_orders(&inventory, &[("S1", &[5, 6]), ("S2", &[8]), ("Shelf 1", &[40])]).await;
        let planner = planner(&inventory, &[("S1", 2)]);
        let mut prompter = ScriptedPrompter::new().relocate_to(Some("sh:1"));

        let report = planner
            .run("P1", &plate(&[(3, 10.0)]), &HashSet::from([8]), &mut prompter)
            .await
            .unwrap();

        let RequirementOutcome::Swapped(decision) = &report.requirements[0].outcome else {
            panic!("expected a swap");
        };
        assert_eq!(decision.evict.as_ref().unwrap().id, 5);
        assert_eq!(decision.evict_index, Some(0));
        assert_eq!(decision.relocation, Some(DestSpec::at("Shelf 1", 1)));

        let orders = orders(&inventory).await;
        assert_eq!(orders.get("S1"), &[9, 6]);
        assert_eq!(orders.get("Shelf 1"), &[5, 40]);
        assert_eq!(inventory.locations().await[&5], "Shelf 1");
    }

    #[tokio::test]
    async fn declined_swap_changes_nothing() {
        let inventory = InMemoryInventory::with_spools([spool(1, 1, "S1"), spool(2, 2, "S2"), spool(3, 3, "Shelf 1")]);
        let planner = planner(&inventory, &[]);
        let before = inventory.locations().await;
        let mut prompter = ScriptedPrompter::new().swap_with(Decision::Skip);

        let report = planner
            .run("P1", &plate(&[(3, 10.0)]), &HashSet::new(), &mut prompter)
            .await
            .unwrap();

        assert_eq!(report.requirements[0].outcome, RequirementOutcome::Skipped);
        assert_eq!(inventory.locations().await, before);
        assert_eq!(inventory.setting_writes(), 0);
    }

    #[tokio::test]
    async fn abort_keeps_earlier_commits_and_stops() {
        let inventory = InMemoryInventory::with_spools([spool(3, 3, "Shelf 1"), spool(4, 4, "Shelf 1")]);
        let planner = planner(&inventory, &[]);
        let mut prompter = ScriptedPrompter::new()
            .swap_with(Decision::Proceed)
            .swap_with(Decision::Abort);

        let report = planner
            .run("P1", &plate(&[(3, 10.0), (4, 10.0), (5, 1.0)]), &HashSet::new(), &mut prompter)
            .await
            .unwrap();

        assert!(report.aborted);
        assert_eq!(report.requirements.len(), 1);
        assert_eq!(report.swaps(), 1);
        let locations = inventory.locations().await;
        assert_eq!(locations[&3], "S1");
        assert_eq!(locations[&4], "Shelf 1");
    }

    #[tokio::test]
    async fn second_load_goes_to_remaining_free_slot() {
        let inventory = InMemoryInventory::with_spools([spool(3, 3, "Shelf 1"), spool(4, 4, "Shelf 1")]);
        let planner = planner(&inventory, &[]);
        let mut prompter = ScriptedPrompter::new();

        let report = planner
            .run("P1", &plate(&[(3, 10.0), (4, 10.0)]), &HashSet::new(), &mut prompter)
            .await
            .unwrap();

        assert_eq!(report.swaps(), 2);
        let locations = inventory.locations().await;
        assert_eq!(locations[&3], "S1");
        assert_eq!(locations[&4], "S2");
    }

    #[tokio::test]
    async fn unresolved_requirement_is_reported() {
        let inventory = InMemoryInventory::new();
        let planner = planner(&inventory, &[]);
        let mut prompter = ScriptedPrompter::new();
        let report = planner
            .run("P1", &plate(&[(0, 10.0)]), &HashSet::new(), &mut prompter)
            .await
            .unwrap();
        assert_eq!(report.requirements[0].outcome, RequirementOutcome::Unresolved);
    }

    #[tokio::test]
    async fn unknown_printer_is_an_error() {
        let inventory = InMemoryInventory::new();
        let planner = planner(&inventory, &[]);
        let err = planner
            .run("Nope", &plate(&[(1, 1.0)]), &HashSet::new(), &mut ScriptedPrompter::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Plan(PlanError::UnknownPrinter(_))));
    }

    #[tokio::test]
    async fn inventory_failure_aborts_session() {
        let inventory = InMemoryInventory::with_spools([spool(3, 3, "Shelf 1")]);
        inventory.set_offline(true);
        let planner = planner(&inventory, &[]);
        let err = planner
            .run("P1", &plate(&[(3, 1.0)]), &HashSet::new(), &mut ScriptedPrompter::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Inventory(_)));
    }

    fn discovered() -> Vec<DiscoveredPlan> {
        let mut first = plate(&[(3, 10.0)]);
        first.name = "first".into();
        let mut second = plate(&[(1, 10.0)]);
        second.name = "second".into();
        let mut third = plate(&[(2, 10.0)]);
        third.name = "third".into();
        vec![DiscoveredPlan {
            path: PathBuf::from("plan.toml"),
            plan: PlanFile {
                projects: vec![Project {
                    name: "Robot".into(),
                    status: Status::Todo,
                    plates: vec![first, second, third],
                }],
            },
        }]
    }

    #[tokio::test]
    async fn plan_next_protects_upcoming_plates() {
        let inventory = InMemoryInventory::with_spools([
            spool(1, 1, "S1"),
            spool(2, 2, "S2").with_used(1.0).with_last_used(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            spool(3, 3, "Shelf 1"),
        ]);
        let planner = planner(&inventory, &[]);
        let mut prompter = ScriptedPrompter::new().choose_index(Some(0));

        let outcome = planner
            .plan_next(&discovered(), "P1", &mut prompter)
            .await
            .unwrap();

        let NextOutcome::Ran { option, report } = outcome else {
            panic!("expected a session");
        };
        assert_eq!(option.plate_name, "first");
        assert_eq!(option.swap_cost, 1);
        // both loaded filaments are needed later; LRU among them is spool 2
        let RequirementOutcome::Swapped(decision) = &report.requirements[0].outcome else {
            panic!("expected a swap");
        };
        assert_eq!(decision.evict.as_ref().unwrap().id, 2);
        assert!(prompter.was_told("Preparing to print: Robot - first"));
    }

    #[tokio::test]
    async fn plan_next_cancelled_and_empty() {
        let inventory = InMemoryInventory::new();
        let planner = planner(&inventory, &[]);

        let outcome = planner
            .plan_next(&discovered(), "P1", &mut ScriptedPrompter::new())
            .await
            .unwrap();
        assert_eq!(outcome, NextOutcome::Cancelled);

        let mut done = discovered();
        done[0].plan.projects[0].status = Status::Completed;
        let outcome = planner
            .plan_next(&done, "P1", &mut ScriptedPrompter::new())
            .await
            .unwrap();
        assert_eq!(outcome, NextOutcome::NothingPending);

        let err = planner
            .plan_next(&[], "P1", &mut ScriptedPrompter::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Plan(PlanError::NoPlans)));
    }
}
