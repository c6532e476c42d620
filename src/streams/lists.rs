//! Lists stream
//!
//! Enumerates the configured list identifiers. Each identifier is looked up
//! against the `/lists` endpoint and emitted as one metadata record stamped
//! with its id. There is no pagination at this level: each identifier yields
//! a single request and a single record.

use super::ListContext;
use crate::config::TapConfig;
use crate::error::Result;
use crate::http::{HttpClient, RequestConfig};
use crate::types::JsonValue;
use tracing::{debug, warn};

/// Endpoint path for list metadata
const LISTS_PATH: &str = "lists";

/// The `lists` stream
pub struct ListsStream<'a> {
    config: &'a TapConfig,
    client: &'a HttpClient,
}

impl<'a> ListsStream<'a> {
    /// Stream name
    pub const NAME: &'static str = "lists";

    /// Primary key field
    pub const PRIMARY_KEY: &'static str = "list_id";

    /// Create the stream over a shared client and config
    pub fn new(config: &'a TapConfig, client: &'a HttpClient) -> Self {
        Self { config, client }
    }

    /// Fetch the metadata record for a single configured list id
    ///
    /// HTTP errors propagate unclassified; an id the account does not know
    /// still yields a minimal record so the parent/child fan-out stays one
    /// record per configured identifier.
    pub async fn fetch_one(&self, list_id: &str) -> Result<JsonValue> {
        let url = self.config.endpoint(LISTS_PATH);
        let request = RequestConfig::new().query("api_key", &self.config.api_key);

        let body: JsonValue = self.client.get_json_with_config(&url, request).await?;
        debug!("Fetched list metadata for '{list_id}'");

        let context = ListContext::new(list_id);
        let metadata = body
            .as_array()
            .and_then(|lists| {
                lists
                    .iter()
                    .find(|entry| {
                        entry.get("list_id").and_then(JsonValue::as_str) == Some(list_id)
                            || entry.get("id").and_then(JsonValue::as_str) == Some(list_id)
                    })
                    .cloned()
            })
            .unwrap_or_else(|| {
                warn!("List '{list_id}' not present in /lists response, emitting id only");
                JsonValue::Object(serde_json::Map::new())
            });

        Ok(context.stamp(metadata))
    }

    /// Fetch one record per configured list id, in configuration order
    pub async fn fetch_all(&self) -> Result<Vec<JsonValue>> {
        let mut records = Vec::with_capacity(self.config.list_ids.len());
        for list_id in &self.config.list_ids {
            records.push(self.fetch_one(list_id).await?);
        }
        Ok(records)
    }
}
