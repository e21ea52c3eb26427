//! Inventory backends for spoolctl.
//!
//! - [`SpoolmanClient`]: the Spoolman REST API over HTTP
//! - [`InMemoryInventory`]: a process-local inventory for tests

pub mod in_memory;
pub mod spoolman;

pub use in_memory::InMemoryInventory;
pub use spoolman::SpoolmanClient;
