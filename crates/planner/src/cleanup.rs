//! Reconciling the order list with where spools actually are.

use crate::orders::OrderList;
use spoolctl_core::spool::{Spool, SpoolId};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationChange {
    pub location: String,
    /// Listed here, but the spool is somewhere else (or gone)
    pub removed: Vec<SpoolId>,
    /// Sitting here but not listed, appended in id order
    pub added: Vec<SpoolId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanReport {
    pub cleaned: OrderList,
    pub changes: Vec<LocationChange>,
}

impl CleanReport {
    pub fn removed_total(&self) -> usize {
        self.changes.iter().map(|c| c.removed.len()).sum()
    }

    pub fn added_total(&self) -> usize {
        self.changes.iter().map(|c| c.added.len()).sum()
    }

    pub fn is_noop(&self) -> bool {
        self.removed_total() == 0 && self.added_total() == 0
    }
}

/// Drop ids no longer at their listed location, keeping the rest in order.
///
/// With `add_missing`, spools present at a location but not listed are
/// appended sorted by id. Nothing is ever added to the unplaced ("") list.
/// `spools` should include archived ones so their placement is known.
pub fn clean_orders(orders: &OrderList, spools: &[Spool], add_missing: bool) -> CleanReport {
    let mut current: BTreeMap<&str, BTreeSet<SpoolId>> = BTreeMap::new();
    for spool in spools {
        current.entry(spool.location.as_str()).or_default().insert(spool.id);
    }
    let empty = BTreeSet::new();

    let mut cleaned = OrderList::new();
    let mut changes = Vec::new();

    for (location, ids) in orders.iter() {
        let present = current.get(location).unwrap_or(&empty);
        let (mut kept, removed): (Vec<SpoolId>, Vec<SpoolId>) =
            ids.iter().copied().partition(|id| present.contains(id));

        let mut added = Vec::new();
        if add_missing && !location.is_empty() {
            added = present.iter().copied().filter(|id| !kept.contains(id)).collect();
            kept.extend(&added);
        }

        if !removed.is_empty() || !added.is_empty() {
            changes.push(LocationChange {
                location: location.to_string(),
                removed,
                added,
            });
        }
        cleaned.set(location, kept);
    }

    if add_missing {
        for (location, present) in &current {
            let listed = orders.iter().any(|(loc, _)| loc == *location);
            if location.is_empty() || listed || present.is_empty() {
                continue;
            }
            let ids: Vec<SpoolId> = present.iter().copied().collect();
            changes.push(LocationChange {
                location: location.to_string(),
                removed: Vec::new(),
                added: ids.clone(),
            });
            cleaned.set(*location, ids);
        }
    }

    CleanReport { cleaned, changes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spoolctl_core::spool::Filament;

    fn spool(id: SpoolId, location: &str) -> Spool {
        Spool::new(id, Filament::new(1, "Black", "PLA")).with_location(location)
    }

    fn orders() -> OrderList {
        let mut orders = OrderList::new();
        orders.set("AMS A", vec![3, 1, 2]);
        orders.set("Shelf", vec![4]);
        orders
    }

    #[test]
    fn removes_stale_ids_preserving_order() {
        let spools = vec![spool(1, "AMS A"), spool(3, "AMS A"), spool(2, "Shelf"), spool(4, "Shelf")];
        let report = clean_orders(&orders(), &spools, false);
        assert_eq!(report.cleaned.get("AMS A"), &[3, 1]);
        assert_eq!(report.cleaned.get("Shelf"), &[4]);
        assert_eq!(report.removed_total(), 1);
        assert_eq!(report.added_total(), 0);
    }

    #[test]
    fn add_missing_appends_sorted() {
        let spools = vec![
            spool(1, "AMS A"),
            spool(3, "AMS A"),
            spool(2, "AMS A"),
            spool(9, "Shelf"),
            spool(7, "Shelf"),
            spool(4, "Shelf"),
            spool(8, "Drawer"),
            spool(5, "Drawer"),
            spool(6, ""),
        ];
        let report = clean_orders(&orders(), &spools, true);
        assert_eq!(report.cleaned.get("AMS A"), &[3, 1, 2]);
        assert_eq!(report.cleaned.get("Shelf"), &[4, 7, 9]);
        assert_eq!(report.cleaned.get("Drawer"), &[5, 8]);
        assert!(report.cleaned.get("").is_empty());
        assert_eq!(report.added_total(), 4);
    }

    #[test]
    fn consistent_orders_are_noop() {
        let spools = vec![spool(3, "AMS A"), spool(1, "AMS A"), spool(2, "AMS A"), spool(4, "Shelf")];
        let report = clean_orders(&orders(), &spools, true);
        assert!(report.is_noop());
        assert_eq!(report.cleaned, orders());
    }

    #[test]
    fn vanished_spools_are_removed() {
        let report = clean_orders(&orders(), &[], false);
        assert!(report.cleaned.is_empty());
        assert_eq!(report.removed_total(), 4);
    }
}
