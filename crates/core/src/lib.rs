//! # spoolctl Core
//!
//! Domain types, traits, and error definitions for spoolctl, a filament spool
//! tracker and printer-slot swap planner. This crate has **no transport
//! dependencies**: it defines the model the other crates implement against.
//!
//! - [`spool`]: spool and filament records
//! - [`inventory`]: the [`Inventory`] trait, the seam to the remote service
//! - [`plan`]: print plans (projects, plates, filament requirements)

pub mod error;
pub mod inventory;
pub mod plan;
pub mod spool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, InventoryError, MoveError, OrderError, PlanError, Result, UsageError};
pub use inventory::{Inventory, SettingEntry, SpoolPatch, SpoolQuery};
pub use plan::{PlanFile, Plate, PlateRequirement, Project, Status};
pub use spool::{Filament, FilamentId, Spool, SpoolId, Vendor, location_label};
