//! Spool lookup for `find`: client-side filters and result ordering.

use crate::orders::OrderList;
use spoolctl_core::error::InventoryError;
use spoolctl_core::inventory::{Inventory, SpoolQuery};
use spoolctl_core::spool::{Spool, SpoolId};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

/// Filters the inventory service cannot apply itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpoolFilter {
    /// `Some(true)` keeps opened spools, `Some(false)` keeps pristine ones
    pub used: Option<bool>,
    pub archived_only: bool,
    /// Case-insensitive comment fragment; `*` means any non-empty comment
    pub comment: Option<String>,
    /// Exact filament diameter in mm
    pub diameter: Option<f64>,
}

impl SpoolFilter {
    pub fn matches(&self, spool: &Spool) -> bool {
        if let Some(used) = self.used {
            if spool.is_opened() != used {
                return false;
            }
        }
        if self.archived_only && !spool.archived {
            return false;
        }
        if let Some(comment) = &self.comment {
            let matched = if comment == "*" {
                !spool.comment.is_empty()
            } else {
                spool.comment.to_lowercase().contains(&comment.to_lowercase())
            };
            if !matched {
                return false;
            }
        }
        if let Some(diameter) = self.diameter {
            if (spool.filament.diameter - diameter).abs() > 1e-6 {
                return false;
            }
        }
        true
    }
}

/// Sort by when a spool was last used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recency {
    /// Least recently used first
    Oldest,
    /// Most recently used first
    Newest,
}

/// Order by last use. Never-used spools go last, keeping their input order.
pub fn sort_by_recency(spools: &mut [Spool], recency: Recency) {
    spools.sort_by(|a, b| match (a.last_used, b.last_used) {
        (Some(a), Some(b)) => match recency {
            Recency::Oldest => a.cmp(&b),
            Recency::Newest => b.cmp(&a),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Order by each spool's position in its location's list.
///
/// Listed spools come first, by position (ties across locations keep input
/// order). Unlisted spools follow in input order.
pub fn sort_by_location_order(spools: &mut [Spool], orders: &OrderList) {
    let ranks: HashMap<SpoolId, (&str, usize)> = orders
        .iter()
        .flat_map(|(loc, ids)| ids.iter().enumerate().map(move |(i, id)| (*id, (loc, i))))
        .collect();
    let rank = |s: &Spool| match ranks.get(&s.id) {
        Some((loc, i)) if *loc == s.location => Some(*i),
        _ => None,
    };

    let mut keyed: Vec<(Option<usize>, Spool)> =
        spools.iter().map(|s| (rank(s), s.clone())).collect();
    keyed.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    for (slot, (_, spool)) in spools.iter_mut().zip(keyed) {
        *slot = spool;
    }
}

/// Spools matching one `find` selector.
///
/// A numeric selector is a spool id; an unknown id yields no spools rather
/// than an error. Anything else is a name fragment (`*` for all).
pub async fn find_spools(
    inventory: &dyn Inventory,
    selector: &str,
    query: &SpoolQuery,
    filter: &SpoolFilter,
) -> Result<Vec<Spool>, InventoryError> {
    if let Ok(id) = selector.trim().parse::<SpoolId>() {
        return match inventory.get_spool(id).await {
            Ok(spool) => Ok(vec![spool]),
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => Err(e),
        };
    }

    let mut query = query.clone();
    query.name = Some(selector.to_string());
    if filter.archived_only {
        query.allow_archived = true;
    }
    let spools: Vec<Spool> = inventory
        .list_spools(&query)
        .await?
        .into_iter()
        .filter(|s| filter.matches(s))
        .collect();
    debug!(selector, count = spools.len(), "Found spools");
    Ok(spools)
}
