//! Inventory trait: the seam to the remote spool inventory service.
//!
//! The planner and commands depend only on these operations, never on
//! transport details. Implementations: Spoolman over HTTP, in-memory (tests).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::InventoryError;
use crate::spool::{EMPTY_LOCATION_LABEL, Filament, FilamentId, Spool, SpoolId};

/// Filters for listing spools. Empty filters match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpoolQuery {
    /// Filament name filter; `None` or `"*"` matches all names
    pub name: Option<String>,
    pub location: Option<String>,
    pub material: Option<String>,
    pub vendor: Option<String>,
    pub allow_archived: bool,
}

impl SpoolQuery {
    /// Every non-archived spool.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }

    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = Some(vendor.into());
        self
    }

    pub fn including_archived(mut self) -> Self {
        self.allow_archived = true;
        self
    }

    /// The name filter to send, if any (`*` means no filter).
    pub fn name_filter(&self) -> Option<&str> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty() && *n != "*")
    }

    /// Client-side evaluation of the query, mirroring the service's
    /// case-insensitive partial matching on names.
    pub fn matches(&self, spool: &Spool) -> bool {
        if spool.archived && !self.allow_archived {
            return false;
        }
        if let Some(name) = self.name_filter() {
            if !contains_ignore_case(&spool.filament.name, name) {
                return false;
            }
        }
        if let Some(location) = &self.location {
            if spool.location != *location {
                return false;
            }
        }
        if let Some(material) = &self.material {
            if !spool.filament.material.eq_ignore_ascii_case(material) {
                return false;
            }
        }
        if let Some(vendor) = &self.vendor {
            if !contains_ignore_case(spool.filament.vendor_name(), vendor) {
                return false;
            }
        }
        true
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Partial update of a spool record. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpoolPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_weight: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
}

impl SpoolPatch {
    pub fn location(location: impl Into<String>) -> Self {
        Self {
            location: Some(normalize_location(location.into())),
            ..Self::default()
        }
    }

    pub fn initial_weight(grams: f64) -> Self {
        Self {
            initial_weight: Some(grams),
            ..Self::default()
        }
    }

    /// Archive a spool and take it out of its location.
    pub fn archive() -> Self {
        Self {
            archived: Some(true),
            location: Some(String::new()),
            ..Self::default()
        }
    }

    /// Bring an archived spool back; it stays unplaced.
    pub fn unarchive() -> Self {
        Self {
            archived: Some(false),
            ..Self::default()
        }
    }
}

/// `<empty>` is the user-facing spelling of "no location".
pub fn normalize_location(location: String) -> String {
    if location.eq_ignore_ascii_case(EMPTY_LOCATION_LABEL) {
        String::new()
    } else {
        location
    }
}

/// A settings value as returned by the settings endpoint.
///
/// Complex values arrive as a JSON *string* holding a JSON document, so
/// readers decode twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingEntry {
    pub value: serde_json::Value,

    #[serde(default)]
    pub is_set: bool,

    #[serde(default, rename = "type")]
    pub kind: String,
}

/// The inventory service operations the tool depends on.
#[async_trait]
pub trait Inventory: Send + Sync {
    /// Backend name (e.g. "spoolman", "in_memory").
    fn name(&self) -> &str;

    /// List spools matching a query.
    async fn list_spools(&self, query: &SpoolQuery) -> Result<Vec<Spool>, InventoryError>;

    /// Fetch one spool; a missing spool is `InventoryError::SpoolNotFound`.
    async fn get_spool(&self, id: SpoolId) -> Result<Spool, InventoryError>;

    /// Fetch one filament product.
    async fn get_filament(&self, id: FilamentId) -> Result<Filament, InventoryError>;

    /// Apply a partial update to a spool.
    async fn patch_spool(&self, id: SpoolId, patch: &SpoolPatch) -> Result<(), InventoryError>;

    /// Set a spool's location ("" or `<empty>` unplaces it).
    async fn move_spool(&self, id: SpoolId, location: &str) -> Result<(), InventoryError> {
        self.patch_spool(id, &SpoolPatch::location(location)).await
    }

    /// Record `grams` of filament as used (negative values give filament back).
    async fn use_filament(&self, id: SpoolId, grams: f64) -> Result<(), InventoryError>;

    /// Read every settings entry.
    async fn get_settings(&self) -> Result<BTreeMap<String, SettingEntry>, InventoryError>;

    /// Overwrite one object-typed setting with `value`.
    async fn put_setting_object(
        &self,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<(), InventoryError>;
}
