//! Ranking pending plates by how many swaps they would take.

use crate::discovery::DiscoveredPlan;
use crate::needs::available_by_filament;
use spoolctl_core::plan::Plate;
use spoolctl_core::spool::Spool;

/// One pending plate, scored against a printer's current loadout.
#[derive(Debug, Clone, PartialEq)]
pub struct PlateOption {
    /// Index into the discovered plan list
    pub plan: usize,
    pub project: usize,
    pub plate: usize,
    pub project_name: String,
    pub plate_name: String,
    pub swap_cost: usize,
    pub ready: bool,
}

impl PlateOption {
    pub fn label(&self, recommended: bool) -> String {
        let prefix = if recommended { "* [REC] " } else { "  " };
        let ready = if self.ready {
            ""
        } else {
            " (INSUFFICIENT FILAMENT)"
        };
        format!(
            "{prefix}{} - {} [Swaps: {}]{ready}",
            self.project_name, self.plate_name, self.swap_cost
        )
    }
}

/// Requirements not already met by a spool sitting in one of `slots`.
pub fn swap_cost(plate: &Plate, slots: &[String], spools: &[Spool]) -> usize {
    plate
        .needs
        .iter()
        .filter(|req| {
            !spools
                .iter()
                .any(|s| s.filament_id() == req.filament_id && slots.contains(&s.location))
        })
        .count()
}

/// Every pending plate across `plans`, in discovery order.
pub fn rank_plates(plans: &[DiscoveredPlan], slots: &[String], spools: &[Spool]) -> Vec<PlateOption> {
    let available = available_by_filament(spools);
    let mut options = Vec::new();

    for (n, discovered) in plans.iter().enumerate() {
        for (i, j, project, plate) in discovered.plan.pending_plates() {
            let ready = plate.needs.iter().all(|req| {
                available.get(&req.filament_id).copied().unwrap_or(0.0) >= req.amount
            });
            options.push(PlateOption {
                plan: n,
                project: i,
                plate: j,
                project_name: project.name.clone(),
                plate_name: plate.name.clone(),
                swap_cost: swap_cost(plate, slots, spools),
                ready,
            });
        }
    }
    options
}

/// Index of the first ready option with the lowest swap cost.
pub fn recommended(options: &[PlateOption]) -> Option<usize> {
    options
        .iter()
        .enumerate()
        .filter(|(_, o)| o.ready)
        .min_by_key(|(_, o)| o.swap_cost)
        .map(|(i, _)| i)
}
