//! Spoolman REST client.
//!
//! Talks to the `/api/v1` surface of a Spoolman server:
//! - spool listing, lookup, relocation, usage
//! - filament lookup
//! - the settings store (where the location order blob lives)

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use spoolctl_core::error::InventoryError;
use spoolctl_core::inventory::{Inventory, SettingEntry, SpoolPatch, SpoolQuery};
use spoolctl_core::spool::{Filament, FilamentId, Spool, SpoolId};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Sort order applied to every spool listing.
const LIST_SORT: &str = "location:asc,remaining_weight:asc,filament.name:asc,id:desc";
const LIST_LIMIT: &str = "1000";

/// A Spoolman server reachable over HTTP.
pub struct SpoolmanClient {
    base_url: String,
    client: reqwest::Client,
}

impl SpoolmanClient {
    /// Create a client for the server at `base_url` (e.g. `http://spoolman.local:7912`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, InventoryError> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(InventoryError::InvalidBaseUrl(base_url));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| InventoryError::Network(e.to_string()))?;

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    /// Check that the server answers its health endpoint.
    pub async fn health(&self) -> Result<(), InventoryError> {
        let response = send(self.client.get(self.endpoint("/health"))).await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(())
    }

    async fn post_setting(
        &self,
        key: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, InventoryError> {
        send(
            self.client
                .post(self.endpoint(&format!("/setting/{key}")))
                .json(body),
        )
        .await
    }
}

async fn send(request: reqwest::RequestBuilder) -> Result<reqwest::Response, InventoryError> {
    request
        .send()
        .await
        .map_err(|e| InventoryError::Network(e.to_string()))
}

async fn api_error(response: reqwest::Response) -> InventoryError {
    let status_code = response.status().as_u16();
    let message = response.text().await.unwrap_or_default().trim().to_string();
    warn!(status = status_code, body = %message, "Spoolman returned error");
    InventoryError::Api {
        status_code,
        message,
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, InventoryError> {
    response
        .json()
        .await
        .map_err(|e| InventoryError::Decode(e.to_string()))
}

/// The server wants the settings body as a bare JSON string instead of the wrapper.
fn wants_string_body(status: u16, body: &str) -> bool {
    let body = body.to_lowercase();
    status == 422 || body.contains("valid string") || body.contains("string_type")
}

#[async_trait]
impl Inventory for SpoolmanClient {
    fn name(&self) -> &str {
        "spoolman"
    }

    async fn list_spools(&self, query: &SpoolQuery) -> Result<Vec<Spool>, InventoryError> {
        let mut params: Vec<(&str, String)> = vec![
            ("sort", LIST_SORT.to_string()),
            ("limit", LIST_LIMIT.to_string()),
        ];
        if let Some(name) = query.name_filter() {
            params.push(("filament.name", name.to_string()));
        }
        if let Some(location) = &query.location {
            params.push(("location", location.clone()));
        }
        if let Some(material) = &query.material {
            params.push(("filament.material", material.clone()));
        }
        if let Some(vendor) = &query.vendor {
            params.push(("filament.vendor.name", vendor.clone()));
        }
        if query.allow_archived {
            params.push(("allow_archived", "true".to_string()));
        }

        debug!(?params, "Listing spools");
        let response = send(self.client.get(self.endpoint("/spool")).query(&params)).await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        decode(response).await
    }

    async fn get_spool(&self, id: SpoolId) -> Result<Spool, InventoryError> {
        debug!(spool = id, "Fetching spool");
        let response = send(self.client.get(self.endpoint(&format!("/spool/{id}")))).await?;
        match response.status().as_u16() {
            404 => Err(InventoryError::SpoolNotFound(id)),
            200 => decode(response).await,
            _ => Err(api_error(response).await),
        }
    }

    async fn get_filament(&self, id: FilamentId) -> Result<Filament, InventoryError> {
        debug!(filament = id, "Fetching filament");
        let response = send(self.client.get(self.endpoint(&format!("/filament/{id}")))).await?;
        match response.status().as_u16() {
            404 => Err(InventoryError::FilamentNotFound(id)),
            200 => decode(response).await,
            _ => Err(api_error(response).await),
        }
    }

    async fn patch_spool(&self, id: SpoolId, patch: &SpoolPatch) -> Result<(), InventoryError> {
        debug!(spool = id, ?patch, "Patching spool");
        let response = send(
            self.client
                .patch(self.endpoint(&format!("/spool/{id}")))
                .json(patch),
        )
        .await?;
        match response.status().as_u16() {
            404 => Err(InventoryError::SpoolNotFound(id)),
            200 => Ok(()),
            _ => Err(api_error(response).await),
        }
    }

    async fn use_filament(&self, id: SpoolId, grams: f64) -> Result<(), InventoryError> {
        debug!(spool = id, grams, "Recording filament use");
        let response = send(
            self.client
                .put(self.endpoint(&format!("/spool/{id}/use")))
                .json(&serde_json::json!({ "use_weight": grams })),
        )
        .await?;
        match response.status().as_u16() {
            404 => Err(InventoryError::SpoolNotFound(id)),
            200 => Ok(()),
            _ => Err(api_error(response).await),
        }
    }

    async fn get_settings(&self) -> Result<BTreeMap<String, SettingEntry>, InventoryError> {
        let response = send(self.client.get(self.endpoint("/setting/"))).await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        decode(response).await
    }

    async fn put_setting_object(
        &self,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<(), InventoryError> {
        let encoded =
            serde_json::to_string(value).map_err(|e| InventoryError::Decode(e.to_string()))?;

        let wrapper = serde_json::json!({
            "value": encoded,
            "is_set": true,
            "type": "object",
        });

        debug!(key, bytes = encoded.len(), "Writing setting");
        let response = self.post_setting(key, &wrapper).await?;
        let status = response.status().as_u16();
        if status == 200 || status == 201 {
            return Ok(());
        }

        let error_body = response.text().await.unwrap_or_default();
        if !wants_string_body(status, &error_body) {
            warn!(status, body = %error_body.trim(), "Setting write rejected");
            return Err(InventoryError::Api {
                status_code: status,
                message: error_body.trim().to_string(),
            });
        }

        debug!(key, status, "Retrying setting write as a JSON string body");
        let response = self
            .post_setting(key, &serde_json::Value::String(encoded))
            .await?;
        match response.status().as_u16() {
            200 | 201 => Ok(()),
            _ => Err(api_error(response).await),
        }
    }
}
