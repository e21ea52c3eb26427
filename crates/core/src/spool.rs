//! Spool and filament records as served by the inventory service.
//!
//! Spoolman omits or nulls many fields depending on what the user filled in,
//! so most fields deserialize leniently to their defaults.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Unique, stable spool identifier.
pub type SpoolId = u64;

/// Identifier of a filament product; many spools share one.
pub type FilamentId = u64;

/// Location label used for display when a spool has no location.
pub const EMPTY_LOCATION_LABEL: &str = "<empty>";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vendor {
    #[serde(default)]
    pub id: u64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// A filament product (material + color + vendor).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filament {
    pub id: FilamentId,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub material: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<Vendor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_hex: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub diameter: f64,
}

impl Filament {
    pub fn new(id: FilamentId, name: impl Into<String>, material: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            material: material.into(),
            ..Self::default()
        }
    }

    pub fn vendor_name(&self) -> &str {
        self.vendor.as_ref().map(|v| v.name.as_str()).unwrap_or("")
    }
}

/// A physical roll of filament.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Spool {
    pub id: SpoolId,

    pub filament: Filament,

    /// Grams left on the spool
    #[serde(default, deserialize_with = "null_as_default")]
    pub remaining_weight: f64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub initial_weight: f64,

    /// Grams consumed so far; nonzero means the spool has been opened
    #[serde(default, deserialize_with = "null_as_default")]
    pub used_weight: f64,

    /// Current location name; empty means unplaced
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,

    /// `None` means the spool has never been used
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_used: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub archived: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub comment: String,
}

impl Spool {
    pub fn new(id: SpoolId, filament: Filament) -> Self {
        Self {
            id,
            filament,
            ..Self::default()
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_remaining(mut self, grams: f64) -> Self {
        self.remaining_weight = grams;
        if self.initial_weight < grams + self.used_weight {
            self.initial_weight = grams + self.used_weight;
        }
        self
    }

    pub fn with_used(mut self, grams: f64) -> Self {
        self.used_weight = grams;
        self.initial_weight = self.remaining_weight + grams;
        self
    }

    pub fn with_last_used(mut self, at: DateTime<Utc>) -> Self {
        self.last_used = Some(at);
        self
    }

    pub fn archived(mut self) -> Self {
        self.archived = true;
        self
    }

    pub fn filament_id(&self) -> FilamentId {
        self.filament.id
    }

    /// Whether any filament has been drawn from this spool.
    pub fn is_opened(&self) -> bool {
        self.used_weight > 0.0
    }

    pub fn is_placed(&self) -> bool {
        !self.location.is_empty()
    }

    pub fn location_label(&self) -> &str {
        location_label(&self.location)
    }
}

impl std::fmt::Display for Spool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let vendor = self.filament.vendor_name();
        write!(f, "#{} ", self.id)?;
        if !vendor.is_empty() {
            write!(f, "{vendor} ")?;
        }
        write!(f, "{}", self.filament.name)?;
        if !self.filament.material.is_empty() {
            write!(f, " ({})", self.filament.material)?;
        }
        write!(
            f,
            " - {:.1}g remaining @ {}",
            self.remaining_weight,
            self.location_label()
        )?;
        if self.archived {
            write!(f, " (archived)")?;
        }
        Ok(())
    }
}

/// Display form of a location name, mapping "" to `<empty>`.
pub fn location_label(location: &str) -> &str {
    if location.is_empty() {
        EMPTY_LOCATION_LABEL
    } else {
        location
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts RFC 3339 timestamps and zone-less ones (read as UTC).
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(at.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Some(naive.and_utc()))
        .map_err(serde::de::Error::custom)
}
