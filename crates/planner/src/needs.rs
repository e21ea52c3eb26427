//! What filament the pending plans call for.

use spoolctl_core::plan::{PlanFile, Plate};
use spoolctl_core::spool::{FilamentId, Spool};
use std::collections::{BTreeMap, HashSet};

/// Filament ids required by the chosen plate and every later pending plate
/// of the same plan file. Used to protect loaded spools from eviction.
pub fn needed_set(plan: &PlanFile, project: usize, plate: usize) -> HashSet<FilamentId> {
    let mut needed = HashSet::new();
    for (i, proj) in plan.projects.iter().enumerate().skip(project) {
        if !proj.is_pending() {
            continue;
        }
        let start = if i == project { plate } else { 0 };
        for p in proj.plates.iter().skip(start).filter(|p| p.is_pending()) {
            needed.extend(plate_filaments(p));
        }
    }
    needed
}

/// Resolved filament ids used by one plate.
pub fn plate_filaments(plate: &Plate) -> HashSet<FilamentId> {
    plate
        .needs
        .iter()
        .filter(|r| r.is_resolved())
        .map(|r| r.filament_id)
        .collect()
}

/// Total non-archived remaining weight per filament.
pub fn available_by_filament(spools: &[Spool]) -> BTreeMap<FilamentId, f64> {
    let mut totals = BTreeMap::new();
    for spool in spools.iter().filter(|s| !s.archived) {
        *totals.entry(spool.filament_id()).or_insert(0.0) += spool.remaining_weight;
    }
    totals
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeedStatus {
    /// Inventory covers the total
    Ok,
    /// Inventory falls short
    Low,
    /// The requirement names no filament id
    Unresolved,
}

/// Aggregated demand for one filament across every pending plate.
#[derive(Debug, Clone, PartialEq)]
pub struct NeedTotal {
    pub filament_id: FilamentId,
    pub name: String,
    pub material: String,
    pub required: f64,
    pub available: f64,
    /// (project name, grams) in first-seen order
    pub projects: Vec<(String, f64)>,
    pub zero_amount_plates: Vec<String>,
}

impl NeedTotal {
    pub fn status(&self) -> NeedStatus {
        if self.filament_id == 0 {
            NeedStatus::Unresolved
        } else if self.available + f64::EPSILON < self.required {
            NeedStatus::Low
        } else {
            NeedStatus::Ok
        }
    }

    pub fn shortfall(&self) -> f64 {
        (self.required - self.available).max(0.0)
    }
}

/// Sum pending requirements across plans, keyed by filament id (or
/// name + material for unresolved ones), and compare with inventory.
pub fn aggregate_needs<'a>(
    plans: impl IntoIterator<Item = &'a PlanFile>,
    spools: &[Spool],
) -> Vec<NeedTotal> {
    let available = available_by_filament(spools);
    let mut totals: BTreeMap<String, NeedTotal> = BTreeMap::new();

    for plan in plans {
        for (_, _, project, plate) in plan.pending_plates() {
            for req in &plate.needs {
                let key = if req.is_resolved() {
                    format!("id:{:012}", req.filament_id)
                } else {
                    format!("name:{}:{}", req.name, req.material)
                };
                let total = totals.entry(key).or_insert_with(|| NeedTotal {
                    filament_id: req.filament_id,
                    name: req.name.clone(),
                    material: req.material.clone(),
                    required: 0.0,
                    available: available.get(&req.filament_id).copied().unwrap_or(0.0),
                    projects: Vec::new(),
                    zero_amount_plates: Vec::new(),
                });
                total.required += req.amount;
                if req.amount == 0.0 {
                    total
                        .zero_amount_plates
                        .push(format!("{} / {}", project.name, plate.name));
                }
                match total.projects.iter_mut().find(|(name, _)| *name == project.name) {
                    Some((_, grams)) => *grams += req.amount,
                    None => total.projects.push((project.name.clone(), req.amount)),
                }
            }
        }
    }

    totals.into_values().collect()
}
