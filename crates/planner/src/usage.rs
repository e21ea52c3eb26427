//! Recording filament use against a spool.

use spoolctl_core::error::{InventoryError, UsageError};
use spoolctl_core::inventory::{Inventory, SpoolPatch};
use spoolctl_core::plan::PlateRequirement;
use spoolctl_core::spool::Spool;
use tracing::warn;

/// Loaded spools in `slots` that a requirement could have printed from.
///
/// Matches by filament id, or by name for unresolved requirements. Empty
/// spools are dropped when there is more than one candidate.
pub fn usage_candidates<'a>(
    requirement: &PlateRequirement,
    slots: &[String],
    spools: &'a [Spool],
) -> Vec<&'a Spool> {
    let name = requirement.name.to_lowercase();
    let candidates: Vec<&Spool> = spools
        .iter()
        .filter(|s| slots.contains(&s.location))
        .filter(|s| {
            if requirement.is_resolved() {
                s.filament_id() == requirement.filament_id
            } else {
                !name.is_empty() && s.filament.name.to_lowercase().contains(&name)
            }
        })
        .collect();

    if candidates.len() > 1 {
        let with_weight: Vec<&Spool> = candidates
            .iter()
            .copied()
            .filter(|s| s.remaining_weight > 0.0)
            .collect();
        if !with_weight.is_empty() {
            return with_weight;
        }
    }
    candidates
}

/// Record `amount` grams used on `spool`.
///
/// When the amount exceeds what is left, the spool's initial weight is raised
/// by the overage first so remaining weight never goes negative. Returns the
/// overage (0 when none).
pub async fn use_filament_safely(
    inventory: &dyn Inventory,
    spool: &Spool,
    amount: f64,
) -> Result<f64, InventoryError> {
    let overage = (amount - spool.remaining_weight).max(0.0);
    if overage > 0.0 {
        warn!(
            spool = spool.id,
            remaining = spool.remaining_weight,
            amount,
            "Usage exceeds remaining weight, raising initial weight"
        );
        inventory
            .patch_spool(
                spool.id,
                &SpoolPatch::initial_weight(spool.initial_weight + overage),
            )
            .await?;
    }
    inventory.use_filament(spool.id, amount).await?;
    Ok(overage)
}

/// Pair up `selector grams` arguments.
///
/// Amounts are rounded to 0.1g (ties to even). Negative amounts give
/// filament back.
pub fn parse_usage_args(args: &[String]) -> Result<Vec<(String, f64)>, UsageError> {
    if args.is_empty() || args.len() % 2 != 0 {
        return Err(UsageError::Unpaired);
    }
    args.chunks(2)
        .map(|pair| {
            let amount: f64 = pair[1]
                .trim()
                .parse()
                .ok()
                .filter(|g: &f64| g.is_finite())
                .ok_or_else(|| UsageError::InvalidAmount(pair[1].clone()))?;
            Ok((pair[0].clone(), (amount * 10.0).round_ties_even() / 10.0))
        })
        .collect()
}
