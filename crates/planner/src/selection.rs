//! Spool and slot choice rules.

use crate::layout::PrinterLayout;
use spoolctl_core::spool::{FilamentId, Spool};
use std::collections::HashSet;
use tracing::debug;

/// Pick the spool to load for `filament`.
///
/// Preference: not sitting in any printer's slot, then already opened,
/// then the lowest (oldest) id. The result does not depend on input order.
pub fn best_spool<'a>(
    spools: &'a [Spool],
    filament: FilamentId,
    layout: &PrinterLayout,
) -> Option<&'a Spool> {
    spools
        .iter()
        .filter(|s| !s.archived && s.filament_id() == filament)
        .min_by_key(|s| (layout.is_printer_slot(&s.location), !s.is_opened(), s.id))
}

/// The best alternative spool of `filament` outside `exclude` locations.
///
/// Spools outside every printer slot come first, then the fullest. A spool
/// still loaded in another printer is only offered when nothing else is left.
pub fn substitute<'a>(
    spools: &'a [Spool],
    filament: FilamentId,
    exclude: &[String],
    layout: &PrinterLayout,
) -> Option<&'a Spool> {
    spools
        .iter()
        .filter(|s| !s.archived && s.filament_id() == filament)
        .filter(|s| !exclude.contains(&s.location))
        .max_by(|a, b| {
            let free_a = !layout.is_printer_slot(&a.location);
            let free_b = !layout.is_printer_slot(&b.location);
            free_a
                .cmp(&free_b)
                .then(a.remaining_weight.total_cmp(&b.remaining_weight))
                .then(b.id.cmp(&a.id))
        })
}

/// Spools currently sitting in `location`.
pub fn occupants<'a>(spools: &'a [Spool], location: &'a str) -> impl Iterator<Item = &'a Spool> {
    spools.iter().filter(move |s| s.location == location)
}

/// Where a spool should go among a printer's slots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SlotChoice<'a> {
    /// A slot with room to spare
    Free(&'a str),
    /// Every slot is full; `spool` has to come out of `location` first
    Evict { location: &'a str, spool: &'a Spool },
    /// The printer has no slots at all
    NoSlots,
}

/// Choose a target slot, falling back to an eviction when all are full.
///
/// Free slots: fewest occupants wins, ties go to the earlier declared slot.
/// Evictions: spools whose filament is in `protected` go last, then least
/// recently used first. Spools that were never used count as the most
/// recently used.
pub fn select_slot<'a>(
    slots: &'a [String],
    spools: &'a [Spool],
    layout: &PrinterLayout,
    protected: &HashSet<FilamentId>,
) -> SlotChoice<'a> {
    let free = slots
        .iter()
        .map(|slot| (slot, occupants(spools, slot).count()))
        .filter(|(slot, used)| *used < layout.capacity(slot))
        .min_by_key(|(_, used)| *used);

    if let Some((slot, used)) = free {
        debug!(slot = %slot, used, "Free slot available");
        return SlotChoice::Free(slot);
    }

    match select_eviction(slots, spools, protected) {
        Some(spool) => {
            let location = slots
                .iter()
                .find(|s| **s == spool.location)
                .map(String::as_str)
                .unwrap_or(spool.location.as_str());
            SlotChoice::Evict { location, spool }
        }
        None => SlotChoice::NoSlots,
    }
}

/// The loaded spool to take out of `slots`, if any is loaded.
pub fn select_eviction<'a>(
    slots: &[String],
    spools: &'a [Spool],
    protected: &HashSet<FilamentId>,
) -> Option<&'a Spool> {
    let candidate = spools
        .iter()
        .filter(|s| slots.contains(&s.location))
        .min_by_key(|s| {
            (
                protected.contains(&s.filament_id()),
                s.last_used.is_none(),
                s.last_used,
                s.id,
            )
        });
    if let Some(spool) = candidate {
        debug!(
            spool = spool.id,
            location = %spool.location,
            protected = protected.contains(&spool.filament_id()),
            "Eviction candidate"
        );
    }
    candidate
}
