//! Per-location spool ordering, persisted in the inventory's settings store.
//!
//! The settings entry holds a JSON *string* whose content is itself a JSON
//! object mapping location name to an ordered array of spool ids:
//!
//! ```json
//! {"value": "{\"AMS A\":[10,20],\"Shelf 1\":[30]}", "is_set": true, "type": "object"}
//! ```

use serde::{Deserialize, Serialize};
use spoolctl_core::error::{Error, OrderError};
use spoolctl_core::inventory::{Inventory, SettingEntry};
use spoolctl_core::spool::SpoolId;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Settings key holding the location order document.
pub const ORDERS_SETTING_KEY: &str = "locations_spoolorders";

/// Location name → ordered spool ids. A spool id appears in at most one list.
///
/// An empty list is the same as no list: equality ignores empty entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderList(BTreeMap<String, Vec<SpoolId>>);

impl OrderList {
    pub fn new() -> Self {
        Self::default()
    }

    /// The ordered ids at `location` (empty if the location has no list).
    pub fn get(&self, location: &str) -> &[SpoolId] {
        self.0.get(location).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Mutable list for `location`, created on demand.
    pub fn list_mut(&mut self, location: &str) -> &mut Vec<SpoolId> {
        self.0.entry(location.to_string()).or_default()
    }

    pub fn set(&mut self, location: impl Into<String>, ids: Vec<SpoolId>) {
        self.0.insert(location.into(), ids);
    }

    /// 0-based index of `id` within `location`'s list.
    pub fn position(&self, location: &str, id: SpoolId) -> Option<usize> {
        self.get(location).iter().position(|v| *v == id)
    }

    /// The location whose list contains `id`, if any.
    pub fn location_of(&self, id: SpoolId) -> Option<&str> {
        self.0
            .iter()
            .find(|(_, ids)| ids.contains(&id))
            .map(|(loc, _)| loc.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[SpoolId])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub(crate) fn lists_mut(&mut self) -> impl Iterator<Item = &mut Vec<SpoolId>> {
        self.0.values_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    /// Total number of ids across all locations.
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    /// Decode the double-encoded settings entry.
    pub fn from_setting(entry: &SettingEntry) -> Result<Self, OrderError> {
        let raw = match &entry.value {
            serde_json::Value::Null => return Ok(Self::default()),
            serde_json::Value::String(s) => s,
            other => {
                return Err(OrderError::Wrapper(format!(
                    "expected a JSON string, got {other}"
                )));
            }
        };
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let orders: Option<Self> =
            serde_json::from_str(raw).map_err(|e| OrderError::Document(e.to_string()))?;
        Ok(orders.unwrap_or_default())
    }
}

impl OrderList {
    fn non_empty(&self) -> impl Iterator<Item = (&String, &Vec<SpoolId>)> {
        self.0.iter().filter(|(_, ids)| !ids.is_empty())
    }
}

impl PartialEq for OrderList {
    fn eq(&self, other: &Self) -> bool {
        self.non_empty().eq(other.non_empty())
    }
}

impl Eq for OrderList {}

impl From<BTreeMap<String, Vec<SpoolId>>> for OrderList {
    fn from(map: BTreeMap<String, Vec<SpoolId>>) -> Self {
        Self(map)
    }
}

/// Loads and saves the [`OrderList`] through an [`Inventory`].
///
/// `save` overwrites the whole record with no version check; a concurrent
/// writer between `load` and `save` loses its changes.
#[derive(Clone)]
pub struct OrderStore {
    inventory: Arc<dyn Inventory>,
}

impl OrderStore {
    pub fn new(inventory: Arc<dyn Inventory>) -> Self {
        Self { inventory }
    }

    pub async fn load(&self) -> Result<OrderList, Error> {
        let settings = self.inventory.get_settings().await?;
        let Some(entry) = settings.get(ORDERS_SETTING_KEY) else {
            debug!("No location order setting stored yet");
            return Ok(OrderList::default());
        };
        let orders = OrderList::from_setting(entry)?;
        debug!(locations = orders.0.len(), spools = orders.len(), "Loaded location orders");
        Ok(orders)
    }

    pub async fn save(&self, orders: &OrderList) -> Result<(), Error> {
        let value = serde_json::to_value(orders)?;
        self.inventory
            .put_setting_object(ORDERS_SETTING_KEY, &value)
            .await?;
        debug!(locations = orders.0.len(), spools = orders.len(), "Saved location orders");
        Ok(())
    }
}
