//! spoolctl CLI: the main entry point.
//!
//! Commands:
//! - `find`: Search spools by name or id
//! - `move`: Relocate spools and keep the location order in sync
//! - `use`: Record filament used from spools
//! - `archive` / `unarchive`: Retire spools or bring them back
//! - `low`: Report filaments running low
//! - `orders`: Show or clean the stored location order
//! - `plan`: List, check, prepare, complete, pause and archive print plans
//! - `config`: Show, locate or validate the configuration
//! - `doctor`: Diagnose configuration and inventory reachability

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "spoolctl",
    about = "spoolctl: filament spool locations and printer-slot swap planning",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of ~/.spoolctl/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Find spools by name or id (`*` or nothing for all)
    #[command(alias = "f")]
    Find {
        /// Only spools in this location (aliases allowed)
        #[arg(short, long)]
        location: Option<String>,

        /// Only spools from this manufacturer
        #[arg(short, long)]
        manufacturer: Option<String>,

        /// Include archived spools
        #[arg(short = 'a', long)]
        allow_archived: bool,

        /// Show only archived spools
        #[arg(long)]
        archived_only: bool,

        /// Only spools that have been used
        #[arg(short, long, conflicts_with = "pristine")]
        used: bool,

        /// Only spools that have never been used
        #[arg(short, long)]
        pristine: bool,

        /// Only spools whose comment contains this text
        #[arg(short, long)]
        comment: Option<String>,

        /// Only spools with any comment
        #[arg(long, conflicts_with = "comment")]
        has_comment: bool,

        /// Only this filament diameter in mm (e.g. 1.75)
        #[arg(short, long)]
        diameter: Option<f64>,

        /// Least recently used first; never-used last
        #[arg(long, conflicts_with = "mru")]
        lru: bool,

        /// Most recently used first; never-used last
        #[arg(long)]
        mru: bool,

        /// Spool names or ids
        selectors: Vec<String>,
    },

    /// Record filament use: `use <spool> <grams> [<spool> <grams>...]` (negative gives it back)
    #[command(alias = "u")]
    Use {
        /// Only match name selectors against spools in this location
        #[arg(short, long)]
        location: Option<String>,

        /// Show what would be used without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Book more than is left by raising the spool's initial weight
        #[arg(long)]
        force: bool,

        /// Fail instead of prompting when a selector matches several spools
        #[arg(long)]
        non_interactive: bool,

        /// Spool selectors and amounts in grams
        #[arg(required = true, allow_negative_numbers = true)]
        args: Vec<String>,
    },

    /// Archive spools and take them out of every location
    Archive {
        /// Only match name selectors against spools in this location
        #[arg(short, long)]
        location: Option<String>,

        /// Show what would be archived without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Fail instead of prompting when a selector matches several spools
        #[arg(long)]
        non_interactive: bool,

        /// Spool selectors (id or name)
        #[arg(required = true)]
        selectors: Vec<String>,
    },

    /// Restore archived spools (they stay unplaced)
    Unarchive {
        /// Spool selectors (id or name of an archived spool)
        #[arg(required = true)]
        selectors: Vec<String>,
    },

    /// Show filaments running low so you know what to reorder
    #[command(alias = "reorder")]
    Low {
        /// Threshold in grams; filaments with this much or less are shown (0 disables)
        #[arg(long, default_value_t = spoolctl_planner::stock::DEFAULT_LOW_THRESHOLD)]
        max_remaining: f64,

        /// Only spools from this manufacturer
        #[arg(short, long)]
        manufacturer: Option<String>,

        /// Only this filament diameter in mm
        #[arg(short, long)]
        diameter: Option<f64>,

        /// Filament names or spool ids
        selectors: Vec<String>,
    },

    /// Move spools: `move <spool> <dest> [<spool> <dest>...]` or `move -d <dest> <spool>...`
    Move {
        /// Send every listed spool to this destination
        #[arg(short = 'd', long = "destination")]
        dest: Option<String>,

        /// Only match name selectors against spools in this location
        #[arg(short, long)]
        from: Option<String>,

        /// Show what would change without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Fail instead of prompting when a selector matches several spools
        #[arg(long)]
        non_interactive: bool,

        /// Spool selectors (id or name) and destinations
        #[arg(required = true)]
        args: Vec<String>,
    },

    /// Inspect or repair the stored location order
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },

    /// Work with print plans
    Plan {
        #[command(subcommand)]
        action: PlanAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Diagnose configuration and inventory health
    Doctor,
}

#[derive(Subcommand)]
enum OrdersAction {
    /// Print every location's spool order
    Show,
    /// Drop ids no longer at their listed location
    Clean {
        /// Save the cleaned order (default is a dry run)
        #[arg(long)]
        write: bool,

        /// Append spools present at a location but not listed
        #[arg(long)]
        add_missing: bool,
    },
}

#[derive(Subcommand)]
enum PlanAction {
    /// List discovered plan files and their pending plates
    List {
        /// Include the paused plans directory
        #[arg(long)]
        paused: bool,
    },
    /// Compare pending filament needs with inventory
    Check {
        /// Plan files to check (default: discovered plans)
        files: Vec<PathBuf>,
    },
    /// Pick the next plate and plan the spool swaps for it
    Next {
        /// Plan file to use (default: discovered plans)
        file: Option<PathBuf>,

        /// Printer to load
        #[arg(short, long)]
        printer: Option<String>,
    },
    /// Mark a plate (or project) completed and record filament usage
    Complete {
        /// Plan file to update (default: choose among discovered plans)
        file: Option<PathBuf>,
    },
    /// Move a plan file into the pause directory
    Pause {
        /// Plan file to pause (default: choose among discovered plans)
        file: Option<PathBuf>,
    },
    /// Move finished plan files into the archive directory
    Archive {
        /// Plan file to archive (default: every discovered plan that is finished)
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Validate the configuration
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Find {
            location,
            manufacturer,
            allow_archived,
            archived_only,
            used,
            pristine,
            comment,
            has_comment,
            diameter,
            lru,
            mru,
            selectors,
        } => {
            let filter = spoolctl_planner::SpoolFilter {
                used: match (used, pristine) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
                archived_only,
                comment: if has_comment { Some("*".into()) } else { comment },
                diameter,
            };
            let recency = match (lru, mru) {
                (true, _) => Some(spoolctl_planner::Recency::Oldest),
                (_, true) => Some(spoolctl_planner::Recency::Newest),
                _ => None,
            };
            let options = commands::find::FindOptions {
                location,
                manufacturer,
                allow_archived,
                filter,
                recency,
            };
            commands::find::run(config_path, &selectors, options).await?
        }
        Commands::Use {
            location,
            dry_run,
            force,
            non_interactive,
            args,
        } => {
            let options = commands::use_cmd::UseOptions {
                from: location,
                dry_run,
                force,
                interactive: !non_interactive,
            };
            commands::use_cmd::run(config_path, &args, options).await?
        }
        Commands::Archive {
            location,
            dry_run,
            non_interactive,
            selectors,
        } => {
            let options = commands::archive::ArchiveOptions {
                from: location,
                dry_run,
                interactive: !non_interactive,
            };
            commands::archive::archive(config_path, &selectors, options).await?
        }
        Commands::Unarchive { selectors } => {
            commands::archive::unarchive(config_path, &selectors).await?
        }
        Commands::Low {
            max_remaining,
            manufacturer,
            diameter,
            selectors,
        } => {
            let options = commands::low::LowOptions {
                max_remaining,
                manufacturer,
                diameter,
            };
            commands::low::run(config_path, &selectors, options).await?
        }
        Commands::Move {
            dest,
            from,
            dry_run,
            non_interactive,
            args,
        } => {
            let options = commands::move_cmd::MoveOptions {
                dest,
                from,
                dry_run,
                interactive: !non_interactive,
            };
            commands::move_cmd::run(config_path, &args, options).await?
        }
        Commands::Orders { action } => match action {
            OrdersAction::Show => commands::orders::show(config_path).await?,
            OrdersAction::Clean { write, add_missing } => {
                commands::orders::clean(config_path, write, add_missing).await?
            }
        },
        Commands::Plan { action } => match action {
            PlanAction::List { paused } => commands::plan::list(config_path, paused).await?,
            PlanAction::Check { files } => commands::plan::check(config_path, &files).await?,
            PlanAction::Next { file, printer } => {
                commands::plan::next(config_path, file.as_deref(), printer.as_deref()).await?
            }
            PlanAction::Complete { file } => {
                commands::plan::complete(config_path, file.as_deref()).await?
            }
            PlanAction::Pause { file } => commands::plan::pause(config_path, file.as_deref()).await?,
            PlanAction::Archive { file } => {
                commands::plan::archive(config_path, file.as_deref()).await?
            }
        },
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show(config_path).await?,
            ConfigAction::Path => commands::config_cmd::path(config_path).await?,
            ConfigAction::Validate => commands::config_cmd::validate(config_path).await?,
        },
        Commands::Doctor => commands::doctor::run(config_path).await?,
    }

    Ok(())
}
