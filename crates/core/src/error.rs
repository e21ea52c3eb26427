//! Error types for the spoolctl domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] aggregates them.

use std::path::PathBuf;
use thiserror::Error;

use crate::spool::{FilamentId, SpoolId};

/// The top-level error type for all spoolctl operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Inventory service errors ---
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    // --- Location order errors ---
    #[error("Location order error: {0}")]
    Orders(#[from] OrderError),

    // --- Plan file errors ---
    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),

    // --- Spool relocation errors ---
    #[error("Move error: {0}")]
    Move(#[from] MoveError),

    // --- Filament usage errors ---
    #[error("Usage error: {0}")]
    Usage(#[from] UsageError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures talking to the inventory service.
///
/// `SpoolNotFound` is kept apart from transport and API failures so callers
/// can report "no spool found" instead of aborting.
#[derive(Debug, Clone, Error)]
pub enum InventoryError {
    #[error("Spool #{0} not found")]
    SpoolNotFound(SpoolId),

    #[error("Filament #{0} not found")]
    FilamentNotFound(FilamentId),

    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid base url: {0}")]
    InvalidBaseUrl(String),
}

impl InventoryError {
    /// Whether this is the "no such spool" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SpoolNotFound(_) | Self::FilamentNotFound(_))
    }
}

/// The persisted location-order setting could not be decoded.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Failed to decode settings value wrapper: {0}")]
    Wrapper(String),

    #[error("Failed to parse location order JSON: {0}")]
    Document(String),
}

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Failed to read plan file at {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to parse plan file at {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Failed to write plan file at {path}: {reason}")]
    Write { path: PathBuf, reason: String },

    #[error("No plans found")]
    NoPlans,

    #[error("Unknown printer: {0}")]
    UnknownPrinter(String),

    #[error("Plate not found: project {project}, plate {plate}")]
    PlateNotFound { project: usize, plate: usize },

    #[error("{0} not configured")]
    DirNotConfigured(&'static str),

    #[error("Failed to move plan file {from} to {to}: {reason}")]
    Relocate {
        from: PathBuf,
        to: PathBuf,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum MoveError {
    #[error("destination must be specified if not using --destination/-d")]
    MissingDestination,

    #[error("spool not found: {0}")]
    NoMatch(String),

    #[error("multiple spools found ({count}): {selector}")]
    Ambiguous { selector: String, count: usize },

    #[error("selection canceled; no moves executed")]
    Cancelled,
}

#[derive(Debug, Error)]
pub enum UsageError {
    #[error("arguments should be a spool ID followed by a filament amount")]
    Unpaired,

    #[error("invalid filament amount (must be a number): {0}")]
    InvalidAmount(String),

    #[error("not enough filament on spool #{spool} (only {available:.1}g available)")]
    NotEnough { spool: SpoolId, available: f64 },
}
