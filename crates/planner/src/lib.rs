//! Location ordering and swap planning for spoolctl.
//!
//! - [`DestinationResolver`] turns `A:2`-style tokens into locations
//! - [`OrderStore`] loads and saves the per-location spool order
//! - [`placement`] mutates an [`OrderList`]
//! - [`SwapPlanner`] decides what to load into a printer for a plate
//! - [`search`] and [`stock`] back the `find` and `low` reports

pub mod cleanup;
pub mod destination;
pub mod discovery;
pub mod layout;
pub mod needs;
pub mod orders;
pub mod placement;
pub mod prompt;
pub mod ranking;
pub mod relocate;
pub mod search;
pub mod selection;
pub mod session;
pub mod stock;
pub mod usage;

pub use cleanup::{CleanReport, clean_orders};
pub use destination::{DestSpec, DestinationResolver};
pub use discovery::DiscoveredPlan;
pub use layout::PrinterLayout;
pub use orders::{ORDERS_SETTING_KEY, OrderList, OrderStore};
pub use prompt::{Decision, Prompter, ScriptedPrompter};
pub use search::{Recency, SpoolFilter};
pub use session::{NextOutcome, RequirementOutcome, SessionReport, SwapDecision, SwapPlanner};
pub use stock::{LowGroup, LowStockRules};
