//! `spoolctl use`: Record filament used from (or returned to) spools.

use super::prompt::LinePrompter;
use spoolctl_core::{Inventory, UsageError};
use spoolctl_planner::usage::{parse_usage_args, use_filament_safely};
use spoolctl_planner::{DestinationResolver, Prompter, relocate};
use std::path::Path;
use std::sync::Arc;

pub struct UseOptions {
    /// Only match name selectors against spools in this location
    pub from: Option<String>,
    pub dry_run: bool,
    /// Book usage beyond what is left by raising the initial weight
    pub force: bool,
    pub interactive: bool,
}

pub async fn run(
    config_path: Option<&Path>,
    args: &[String],
    options: UseOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let inventory = super::connect(&config)?;
    let mut prompter = LinePrompter::stdin();
    execute(inventory, &super::resolver(&config), args, &options, &mut prompter).await
}

pub(crate) async fn execute(
    inventory: Arc<dyn Inventory>,
    resolver: &DestinationResolver,
    args: &[String],
    options: &UseOptions,
    prompter: &mut dyn Prompter,
) -> Result<(), Box<dyn std::error::Error>> {
    let usages = parse_usage_args(args)?;
    let from = options.from.as_deref().map(|loc| resolver.alias(loc));
    if options.dry_run {
        println!("Dry run mode enabled. Nothing will be changed.");
    }

    let mut failures = 0;
    for (selector, amount) in usages {
        let spool = match relocate::resolve_selector(
            inventory.as_ref(),
            &selector,
            from,
            options.interactive,
            prompter,
        )
        .await
        {
            Ok(spool) => spool,
            Err(e) => {
                println!("❌ {selector}: {e}");
                failures += 1;
                continue;
            }
        };

        if amount > spool.remaining_weight && !options.force {
            let err = UsageError::NotEnough {
                spool: spool.id,
                available: spool.remaining_weight,
            };
            println!("⚠️  {err}; use --force to book it anyway");
            failures += 1;
            continue;
        }

        let remaining = spool.remaining_weight - amount;
        if options.dry_run {
            println!(" - Would use {amount:.1}g from {spool}, leaving {remaining:.1}g");
            continue;
        }

        match use_filament_safely(inventory.as_ref(), &spool, amount).await {
            Ok(overage) => {
                if overage > 0.0 {
                    println!(
                        "  ⚠️  #{} was short by {overage:.1}g; initial weight raised to match",
                        spool.id
                    );
                }
                if amount < 0.0 {
                    println!(" - Returned {:.1}g to {spool}", -amount);
                } else {
                    println!(
                        "✅ Used {amount:.1}g from #{}, {:.1}g remaining",
                        spool.id,
                        remaining.max(0.0)
                    );
                }
            }
            Err(e) => {
                println!("❌ Failed to record use on #{}: {e}", spool.id);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(format!("{failures} usage(s) not recorded").into());
    }
    Ok(())
}
