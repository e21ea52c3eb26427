//! `spoolctl plan`: List, check, prepare and complete print plans.

use super::prompt::LinePrompter;
use spoolctl_config::AppConfig;
use spoolctl_core::{Inventory, PlanError, PlanFile, Plate, SpoolQuery};
use spoolctl_planner::discovery::{self, display_path};
use spoolctl_planner::needs::{NeedStatus, aggregate_needs};
use spoolctl_planner::usage::{usage_candidates, use_filament_safely};
use spoolctl_planner::{
    DiscoveredPlan, NextOutcome, PrinterLayout, Prompter, RequirementOutcome, SessionReport,
    SwapPlanner,
};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn cwd() -> Option<PathBuf> {
    std::env::current_dir().ok()
}

fn discover_plans(config: &AppConfig, include_paused: bool) -> Vec<DiscoveredPlan> {
    let cwd = cwd();
    discovery::discover(&discovery::search_dirs(config, cwd.as_deref(), include_paused))
}

fn load_files(files: &[PathBuf]) -> Result<Vec<DiscoveredPlan>, PlanError> {
    files
        .iter()
        .map(|path| {
            Ok(DiscoveredPlan {
                path: path.clone(),
                plan: PlanFile::load(path)?,
            })
        })
        .collect()
}

pub async fn list(
    config_path: Option<&Path>,
    include_paused: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let plans = discover_plans(&config, include_paused);
    if plans.is_empty() {
        println!("No plan files found.");
        return Ok(());
    }

    let cwd = cwd();
    for discovered in &plans {
        println!("📄 {}", display_path(&discovered.path, &config, cwd.as_deref()));
        for project in &discovered.plan.projects {
            println!("   {} [{}]", project.name, project.status);
            for plate in &project.plates {
                println!(
                    "     - {} [{}] ({} filament(s))",
                    plate.name,
                    plate.status,
                    plate.needs.len()
                );
            }
        }
    }
    Ok(())
}

pub async fn check(
    config_path: Option<&Path>,
    files: &[PathBuf],
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let plans = if files.is_empty() {
        discover_plans(&config, false)
    } else {
        load_files(files)?
    };
    if plans.is_empty() {
        return Err(PlanError::NoPlans.into());
    }

    let inventory = super::connect(&config)?;
    let spools = inventory.list_spools(&SpoolQuery::all()).await?;
    let totals = aggregate_needs(plans.iter().map(|d| &d.plan), &spools);
    if totals.is_empty() {
        println!("No pending filament needs.");
        return Ok(());
    }

    let mut low = 0;
    for total in &totals {
        let name = if total.name.is_empty() {
            format!("filament #{}", total.filament_id)
        } else {
            total.name.clone()
        };
        match total.status() {
            NeedStatus::Ok => println!(
                "✅ OK          {name} ({}): need {:.1}g, have {:.1}g",
                total.material, total.required, total.available
            ),
            NeedStatus::Low => {
                low += 1;
                println!(
                    "⚠️  LOW         {name} ({}): need {:.1}g, have {:.1}g, short {:.1}g",
                    total.material,
                    total.required,
                    total.available,
                    total.shortfall()
                );
            }
            NeedStatus::Unresolved => println!(
                "❓ UNRESOLVED  {name} ({}): need {:.1}g, no filament id set",
                total.material, total.required
            ),
        }
        for (project, grams) in &total.projects {
            println!("       {project}: {grams:.1}g");
        }
        for plate in &total.zero_amount_plates {
            println!("       ⚠️  {plate} has no amount set");
        }
    }

    println!();
    if low == 0 {
        println!("🎉 Inventory covers every pending plate.");
    } else {
        println!("⚠️  {low} filament(s) short.");
    }
    Ok(())
}

pub async fn next(
    config_path: Option<&Path>,
    file: Option<&Path>,
    printer: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let plans = match file {
        Some(path) => load_files(&[path.to_path_buf()])?,
        None => discover_plans(&config, false),
    };

    let inventory = super::connect(&config)?;
    let planner = SwapPlanner::new(
        inventory,
        PrinterLayout::from_config(&config),
        super::resolver(&config),
    );

    let mut prompter = LinePrompter::stdin();
    let Some(printer) = pick_printer(planner.layout(), printer, &mut prompter)? else {
        println!("Cancelled.");
        return Ok(());
    };

    match planner.plan_next(&plans, &printer, &mut prompter).await? {
        NextOutcome::NothingPending => {}
        NextOutcome::Cancelled => println!("Cancelled."),
        NextOutcome::Ran { report, .. } => print_report(&report),
    }
    Ok(())
}

/// The `--printer` value, the only configured printer, or the user's pick.
fn pick_printer(
    layout: &PrinterLayout,
    requested: Option<&str>,
    prompter: &mut dyn Prompter,
) -> Result<Option<String>, PlanError> {
    if let Some(name) = requested {
        layout.slots(name)?;
        return Ok(Some(name.to_string()));
    }
    let names: Vec<String> = layout.printer_names().into_iter().map(String::from).collect();
    match names.len() {
        0 => Err(PlanError::UnknownPrinter("no printers configured".into())),
        1 => Ok(names.into_iter().next()),
        _ => Ok(prompter
            .choose("Select printer", &names)
            .map(|i| names[i].clone())),
    }
}

fn print_report(report: &SessionReport) {
    println!();
    println!("Summary:");
    for entry in &report.requirements {
        let label = entry.requirement.label();
        match &entry.outcome {
            RequirementOutcome::AlreadyLoaded {
                spool,
                location,
                remaining,
            } => println!("  ✅ {label}: #{spool} already in {location} ({remaining:.1}g)"),
            RequirementOutcome::Swapped(decision) => {
                println!("  🔄 {label}: loaded #{} into {}", decision.load.id, decision.target_slot);
                if let Some(evicted) = &decision.evict {
                    let to = decision
                        .relocation
                        .as_ref()
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "nowhere".into());
                    println!("       removed #{} to {to}", evicted.id);
                }
            }
            RequirementOutcome::Insufficient { spool, remaining } => {
                println!("  ⚠️  {label}: #{spool} has only {remaining:.1}g")
            }
            RequirementOutcome::NoSpoolFound => println!("  ❌ {label}: no spool found"),
            RequirementOutcome::Unresolved => println!("  ❓ {label}: no filament id set"),
            RequirementOutcome::NoSlot => println!("  ❌ {label}: printer has no slots"),
            RequirementOutcome::Skipped => println!("  ⏭️  {label}: skipped"),
        }
    }
    if report.aborted {
        println!("  Session aborted.");
    }
}

pub async fn complete(
    config_path: Option<&Path>,
    file: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let mut plans = match file {
        Some(path) => load_files(&[path.to_path_buf()])?,
        None => discover_plans(&config, false),
    };
    if plans.is_empty() {
        return Err(PlanError::NoPlans.into());
    }

    let mut prompter = LinePrompter::stdin();
    let chosen = if plans.len() == 1 {
        0
    } else {
        let cwd = cwd();
        let labels: Vec<String> = plans
            .iter()
            .map(|d| display_path(&d.path, &config, cwd.as_deref()))
            .collect();
        match prompter.choose("Select plan file", &labels) {
            Some(i) => i,
            None => {
                println!("Cancelled.");
                return Ok(());
            }
        }
    };
    let mut discovered = plans.swap_remove(chosen);

    let inventory = super::connect(&config)?;
    let layout = PrinterLayout::from_config(&config);
    let Some(targets) = pick_targets(&discovered.plan, &mut prompter) else {
        println!("Cancelled.");
        return Ok(());
    };
    if targets.is_empty() {
        println!("Nothing left to complete in this plan.");
        return Ok(());
    }

    let printer = match pick_usage_printer(&layout, &mut prompter) {
        Some(name) => Some(layout.slots(&name)?.to_vec()),
        None => None,
    };

    for &(project, plate) in &targets {
        if let (Some(slots), Some(p)) = (&printer, discovered.plan.plate(project, plate)) {
            let p = p.clone();
            record_usage(inventory.clone(), slots, &p, &mut prompter).await?;
        }
        discovered.plan.complete_plate(project, plate)?;
    }

    discovered.save()?;
    println!("✅ Marked {} plate(s) completed.", targets.len());
    Ok(())
}

/// Move a plan into `pause_dir`, asking which one when several are found.
pub async fn pause(
    config_path: Option<&Path>,
    file: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let mut prompter = LinePrompter::stdin();
    pause_with(&config, file, discover_plans(&config, false), &mut prompter)
}

pub(crate) fn pause_with(
    config: &AppConfig,
    file: Option<&Path>,
    plans: Vec<DiscoveredPlan>,
    prompter: &mut dyn Prompter,
) -> Result<(), Box<dyn std::error::Error>> {
    let cwd = cwd();
    let path = match file {
        Some(path) => path.to_path_buf(),
        None => match plans.len() {
            0 => return Err(PlanError::NoPlans.into()),
            1 => plans[0].path.clone(),
            _ => {
                let labels: Vec<String> = plans
                    .iter()
                    .map(|d| display_path(&d.path, config, cwd.as_deref()))
                    .collect();
                match prompter.choose("Select plan file to pause", &labels) {
                    Some(i) => plans[i].path.clone(),
                    None => {
                        println!("Cancelled.");
                        return Ok(());
                    }
                }
            }
        },
    };

    let shown = display_path(&path, config, cwd.as_deref());
    let dest = discovery::pause_plan(&path, config.pause_dir.as_deref())?;
    println!("⏸️  Moved {shown} to {}", display_path(&dest, config, cwd.as_deref()));
    Ok(())
}

/// Move finished plans into `archive_dir`; unfinished ones are left in place.
pub async fn archive(
    config_path: Option<&Path>,
    file: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let plans = match file {
        Some(path) => load_files(&[path.to_path_buf()])?,
        None => discover_plans(&config, false),
    };
    archive_all(&config, &plans, chrono::Local::now().naive_local())
}

pub(crate) fn archive_all(
    config: &AppConfig,
    plans: &[DiscoveredPlan],
    at: chrono::NaiveDateTime,
) -> Result<(), Box<dyn std::error::Error>> {
    if plans.is_empty() {
        return Err(PlanError::NoPlans.into());
    }
    let cwd = cwd();
    for discovered in plans {
        let shown = display_path(&discovered.path, config, cwd.as_deref());
        match discovery::archive_plan(discovered, config.archive_dir.as_deref(), at)? {
            Some(dest) => println!(
                "📦 Archived {shown} to {}",
                display_path(&dest, config, cwd.as_deref())
            ),
            None => println!("Skipping {shown} (not all projects are completed)"),
        }
    }
    Ok(())
}

/// `(project, plate)` pairs to complete; a project expands to its pending plates.
fn pick_targets(plan: &PlanFile, prompter: &mut dyn Prompter) -> Option<Vec<(usize, usize)>> {
    let mut labels = Vec::new();
    let mut targets: Vec<Vec<(usize, usize)>> = Vec::new();

    for (i, project) in plan.projects.iter().enumerate() {
        if !project.is_pending() {
            continue;
        }
        let pending: Vec<(usize, usize)> = project
            .plates
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_pending())
            .map(|(j, _)| (i, j))
            .collect();
        labels.push(format!("Project: {}", project.name));
        targets.push(pending.clone());
        for (_, j) in pending {
            labels.push(format!("  Plate: {}", project.plates[j].name));
            targets.push(vec![(i, j)]);
        }
    }

    if labels.is_empty() {
        return Some(Vec::new());
    }
    let chosen = prompter.choose("Select what to mark completed", &labels)?;
    Some(targets.swap_remove(chosen))
}

/// The printer whose slots held the spools, or `None` to skip usage.
fn pick_usage_printer(layout: &PrinterLayout, prompter: &mut dyn Prompter) -> Option<String> {
    let names: Vec<String> = layout.printer_names().into_iter().map(String::from).collect();
    match names.len() {
        0 => None,
        1 => names.into_iter().next(),
        _ => {
            let mut items = vec!["None/Other".to_string()];
            items.extend(names.iter().cloned());
            match prompter.choose("Which printer was used?", &items)? {
                0 => None,
                i => Some(names[i - 1].clone()),
            }
        }
    }
}

/// Ask how much of each requirement was used and book it against a loaded spool.
async fn record_usage<R: BufRead>(
    inventory: Arc<dyn Inventory>,
    slots: &[String],
    plate: &Plate,
    prompter: &mut LinePrompter<R>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Recording usage for {}:", plate.name);
    for requirement in &plate.needs {
        let label = requirement.label();
        let Some(amount) = prompter.ask_grams(&format!("  Grams of {label} used"), requirement.amount)
        else {
            return Err("input closed while recording usage".into());
        };
        if amount <= 0.0 {
            continue;
        }

        let spools = inventory.list_spools(&SpoolQuery::all()).await?;
        let candidates = usage_candidates(requirement, slots, &spools);
        let spool = match candidates.len() {
            0 => {
                println!("  ⚠️  No loaded spool matches {label}; usage not recorded");
                continue;
            }
            1 => candidates[0],
            _ => {
                let labels: Vec<String> = candidates.iter().map(|s| s.to_string()).collect();
                match prompter.choose(&format!("Which spool did {label} come from?"), &labels) {
                    Some(i) => candidates[i],
                    None => {
                        println!("  ⏭️  Skipped {label}");
                        continue;
                    }
                }
            }
        };

        let overage = use_filament_safely(inventory.as_ref(), spool, amount).await?;
        if overage > 0.0 {
            println!(
                "  ⚠️  #{} was short by {overage:.1}g; initial weight raised to match",
                spool.id
            );
        }
        println!("  ✅ Used {amount:.1}g from #{}", spool.id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use spoolctl_core::{Filament, PlateRequirement, Spool};
    use spoolctl_inventory::InMemoryInventory;
    use spoolctl_planner::ScriptedPrompter;
    use std::collections::{BTreeMap, HashMap};
    use std::io::Cursor;

    const PLAN: &str = r#"
[[projects]]
name = "Robot"

[[projects.plates]]
name = "arm"

[[projects.plates.needs]]
filament_id = 1
amount = 10.0

[[projects.plates]]
name = "leg"
status = "completed"
"#;

    fn layout(printers: &[&str]) -> PrinterLayout {
        let map: BTreeMap<String, Vec<String>> = printers
            .iter()
            .map(|p| (p.to_string(), vec![format!("{p} slot")]))
            .collect();
        PrinterLayout::new(map, HashMap::new())
    }

    const DONE: &str = r#"
[[projects]]
name = "Vase"
status = "completed"
"#;

    fn plan_in(dir: &Path, name: &str, content: &str) -> DiscoveredPlan {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        DiscoveredPlan {
            plan: PlanFile::load(&path).unwrap(),
            path,
        }
    }

    #[test]
    fn pause_asks_when_several_plans_exist() {
        let plans = tempfile::tempdir().unwrap();
        let paused = tempfile::tempdir().unwrap();
        let config = AppConfig {
            pause_dir: Some(paused.path().to_path_buf()),
            ..AppConfig::default()
        };
        let found = vec![
            plan_in(plans.path(), "robot.toml", PLAN),
            plan_in(plans.path(), "vase.toml", DONE),
        ];

        let mut prompter = ScriptedPrompter::new().choose_index(Some(1));
        pause_with(&config, None, found, &mut prompter).unwrap();
        assert!(paused.path().join("vase.toml").exists());
        assert!(plans.path().join("robot.toml").exists());

        let mut prompter = ScriptedPrompter::new();
        assert!(pause_with(&AppConfig::default(), None, Vec::new(), &mut prompter).is_err());
    }

    #[test]
    fn archive_skips_unfinished_plans() {
        let plans = tempfile::tempdir().unwrap();
        let archive = tempfile::tempdir().unwrap();
        let config = AppConfig {
            archive_dir: Some(archive.path().to_path_buf()),
            ..AppConfig::default()
        };
        let found = vec![
            plan_in(plans.path(), "robot.toml", PLAN),
            plan_in(plans.path(), "vase.toml", DONE),
        ];
        let at = chrono::NaiveDate::from_ymd_opt(2025, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();

        archive_all(&config, &found, at).unwrap();
        assert!(plans.path().join("robot.toml").exists());
        assert!(archive.path().join("vase-20250102030405.toml").exists());

        let err = archive_all(&AppConfig::default(), &found[..1], at).unwrap_err();
        assert!(err.to_string().contains("archive_dir not configured"));
    }

    #[test]
    fn targets_offer_projects_then_plates() {
        let plan = PlanFile::from_toml_str(PLAN, Path::new("robot.toml")).unwrap();
        let mut prompter = ScriptedPrompter::new().choose_index(Some(0));
        assert_eq!(pick_targets(&plan, &mut prompter), Some(vec![(0, 0)]));

        let mut prompter = ScriptedPrompter::new().choose_index(Some(1));
        assert_eq!(pick_targets(&plan, &mut prompter), Some(vec![(0, 0)]));

        let mut prompter = ScriptedPrompter::new();
        assert_eq!(pick_targets(&plan, &mut prompter), None);
    }

    #[test]
    fn single_printer_is_picked_without_asking() {
        let mut prompter = ScriptedPrompter::new();
        assert_eq!(
            pick_printer(&layout(&["X1C"]), None, &mut prompter).unwrap(),
            Some("X1C".to_string())
        );
        assert!(pick_printer(&layout(&["X1C"]), Some("Mini"), &mut prompter).is_err());
        assert!(pick_printer(&layout(&[]), None, &mut prompter).is_err());
    }

    #[test]
    fn none_other_skips_usage() {
        let mut prompter = ScriptedPrompter::new().choose_index(Some(0));
        assert_eq!(pick_usage_printer(&layout(&["A", "B"]), &mut prompter), None);

        let mut prompter = ScriptedPrompter::new().choose_index(Some(2));
        assert_eq!(
            pick_usage_printer(&layout(&["A", "B"]), &mut prompter),
            Some("B".to_string())
        );
    }

    #[tokio::test]
    async fn usage_is_booked_against_loaded_spool() {
        let inv = InMemoryInventory::with_spools([
            Spool::new(7, Filament::new(1, "Black", "PLA"))
                .with_remaining(5.0)
                .with_location("AMS A"),
        ]);
        let plate = Plate {
            name: "arm".into(),
            needs: vec![PlateRequirement::new(1, 10.0)],
            ..Plate::default()
        };
        let mut prompter = LinePrompter::new(Cursor::new(b"\n".to_vec()));
        record_usage(
            Arc::new(inv.clone()),
            &["AMS A".to_string()],
            &plate,
            &mut prompter,
        )
        .await
        .unwrap();

        let spool = inv.get_spool(7).await.unwrap();
        assert_eq!(spool.remaining_weight, 0.0);
        assert_eq!(spool.used_weight, 10.0);
    }
}
