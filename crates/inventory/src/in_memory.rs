//! In-memory inventory for tests.

use async_trait::async_trait;
use chrono::Utc;
use spoolctl_core::error::InventoryError;
use spoolctl_core::inventory::{Inventory, SettingEntry, SpoolPatch, SpoolQuery};
use spoolctl_core::spool::{Filament, FilamentId, Spool, SpoolId};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// An inventory that keeps spools and settings in process memory.
///
/// Listing follows the same sort order as the Spoolman client
/// (location, remaining weight, filament name, then newest id first).
#[derive(Clone, Default)]
pub struct InMemoryInventory {
    spools: Arc<RwLock<BTreeMap<SpoolId, Spool>>>,
    settings: Arc<RwLock<BTreeMap<String, SettingEntry>>>,
    setting_writes: Arc<AtomicUsize>,
    offline: Arc<AtomicBool>,
}

impl InMemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_spools(spools: impl IntoIterator<Item = Spool>) -> Self {
        let map = spools.into_iter().map(|s| (s.id, s)).collect();
        Self {
            spools: Arc::new(RwLock::new(map)),
            ..Self::default()
        }
    }

    pub async fn insert(&self, spool: Spool) {
        self.spools.write().await.insert(spool.id, spool);
    }

    /// Store a raw settings entry, as the server would return it.
    pub async fn set_setting(&self, key: impl Into<String>, entry: SettingEntry) {
        self.settings.write().await.insert(key.into(), entry);
    }

    /// Current location of every spool, keyed by id.
    pub async fn locations(&self) -> BTreeMap<SpoolId, String> {
        self.spools
            .read()
            .await
            .values()
            .map(|s| (s.id, s.location.clone()))
            .collect()
    }

    /// Number of successful settings writes.
    pub fn setting_writes(&self) -> usize {
        self.setting_writes.load(Ordering::SeqCst)
    }

    /// Make every call fail with a network error, simulating an unreachable server.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), InventoryError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(InventoryError::Network("inventory offline".into()))
        } else {
            Ok(())
        }
    }
}

fn recompute_remaining(spool: &mut Spool) {
    spool.remaining_weight = (spool.initial_weight - spool.used_weight).max(0.0);
}

#[async_trait]
impl Inventory for InMemoryInventory {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn list_spools(&self, query: &SpoolQuery) -> Result<Vec<Spool>, InventoryError> {
        self.check_online()?;
        let spools = self.spools.read().await;
        let mut results: Vec<Spool> = spools
            .values()
            .filter(|s| query.matches(s))
            .cloned()
            .collect();

        results.sort_by(|a, b| {
            a.location
                .cmp(&b.location)
                .then(
                    a.remaining_weight
                        .partial_cmp(&b.remaining_weight)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
                .then(a.filament.name.cmp(&b.filament.name))
                .then(b.id.cmp(&a.id))
        });
        Ok(results)
    }

    async fn get_spool(&self, id: SpoolId) -> Result<Spool, InventoryError> {
        self.check_online()?;
        self.spools
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(InventoryError::SpoolNotFound(id))
    }

    async fn get_filament(&self, id: FilamentId) -> Result<Filament, InventoryError> {
        self.check_online()?;
        self.spools
            .read()
            .await
            .values()
            .find(|s| s.filament.id == id)
            .map(|s| s.filament.clone())
            .ok_or(InventoryError::FilamentNotFound(id))
    }

    async fn patch_spool(&self, id: SpoolId, patch: &SpoolPatch) -> Result<(), InventoryError> {
        self.check_online()?;
        let mut spools = self.spools.write().await;
        let spool = spools
            .get_mut(&id)
            .ok_or(InventoryError::SpoolNotFound(id))?;

        if let Some(location) = &patch.location {
            spool.location = location.clone();
        }
        if let Some(initial) = patch.initial_weight {
            spool.initial_weight = initial;
            recompute_remaining(spool);
        }
        if let Some(archived) = patch.archived {
            spool.archived = archived;
        }
        Ok(())
    }

    async fn use_filament(&self, id: SpoolId, grams: f64) -> Result<(), InventoryError> {
        self.check_online()?;
        let mut spools = self.spools.write().await;
        let spool = spools
            .get_mut(&id)
            .ok_or(InventoryError::SpoolNotFound(id))?;

        spool.used_weight = (spool.used_weight + grams).max(0.0);
        recompute_remaining(spool);
        spool.last_used = Some(Utc::now());
        Ok(())
    }

    async fn get_settings(&self) -> Result<BTreeMap<String, SettingEntry>, InventoryError> {
        self.check_online()?;
        Ok(self.settings.read().await.clone())
    }

    async fn put_setting_object(
        &self,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<(), InventoryError> {
        self.check_online()?;
        let encoded =
            serde_json::to_string(value).map_err(|e| InventoryError::Decode(e.to_string()))?;
        self.settings.write().await.insert(
            key.to_string(),
            SettingEntry {
                value: serde_json::Value::String(encoded),
                is_set: true,
                kind: "object".into(),
            },
        );
        self.setting_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
