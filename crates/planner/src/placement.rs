//! List mutations over an [`OrderList`].

use crate::destination::DestSpec;
use crate::orders::OrderList;
use spoolctl_core::spool::SpoolId;

/// Drop every occurrence of `id` from every location, keeping the rest in order.
pub fn remove_from_all(orders: &mut OrderList, id: SpoolId) {
    for list in orders.lists_mut() {
        list.retain(|v| *v != id);
    }
}

/// Insert `id` at index `i`, clamped into `0..=list.len()`.
pub fn insert_at(list: &mut Vec<SpoolId>, i: i64, id: SpoolId) {
    let idx = usize::try_from(i.max(0)).unwrap_or(usize::MAX).min(list.len());
    list.insert(idx, id);
}

/// Move `id` to `dest`: unlist it everywhere, then insert it at the requested
/// 1-based position or append. Returns the 0-based index it landed at.
pub fn place(orders: &mut OrderList, id: SpoolId, dest: &DestSpec) -> usize {
    remove_from_all(orders, id);
    let list = orders.list_mut(&dest.location);
    let idx = match dest.position {
        Some(pos) => pos.saturating_sub(1),
        None => list.len() as i64,
    };
    insert_at(list, idx, id);
    list.iter().position(|v| *v == id).unwrap_or(0)
}

/// Move `id` into `location` at an existing 0-based index (or append).
pub fn place_at_index(
    orders: &mut OrderList,
    id: SpoolId,
    location: &str,
    index: Option<usize>,
) -> usize {
    remove_from_all(orders, id);
    let list = orders.list_mut(location);
    let idx = index.map(|i| i as i64).unwrap_or(list.len() as i64);
    insert_at(list, idx, id);
    list.iter().position(|v| *v == id).unwrap_or(0)
}
