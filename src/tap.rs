//! Tap orchestration
//!
//! Ties the two streams together as an explicit two-stage pipeline: the list
//! enumerator produces one record per configured list id, and each of those
//! records hands its id to the member paginator. All members of one list are
//! emitted (in page order) before the next list is started, matching the
//! enumeration order of `list_ids`.

use crate::catalog::Catalog;
use crate::config::TapConfig;
use crate::error::Result;
use crate::http::{HttpClient, HttpClientConfig, RequestConfig};
use crate::messages::{Message, SyncStats};
use crate::streams::{ListContext, ListMembersStream, ListsStream};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

/// Result of a connection check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    /// Whether the check succeeded
    pub success: bool,

    /// Error message if failed
    pub message: Option<String>,
}

impl CheckResult {
    /// Create a successful check result
    pub fn success() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    /// Create a failed check result
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

/// The Klaviyo tap
pub struct KlaviyoTap {
    config: TapConfig,
    client: HttpClient,
    stats: SyncStats,
}

impl KlaviyoTap {
    /// Create a tap from a validated configuration
    pub fn new(config: TapConfig) -> Result<Self> {
        config.validate()?;
        let client = HttpClient::with_config(HttpClientConfig::from_tap_config(&config));
        Ok(Self {
            config,
            client,
            stats: SyncStats::new(),
        })
    }

    /// The tap's configuration
    pub fn config(&self) -> &TapConfig {
        &self.config
    }

    /// Statistics from the last read
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Test that the configured credentials can reach the API
    ///
    /// Issues a single probe request against the lists endpoint.
    pub async fn check(&self) -> Result<CheckResult> {
        let url = self.config.endpoint("lists");
        let request = RequestConfig::new().query("api_key", &self.config.api_key);

        match self.client.get_with_config(&url, request).await {
            Ok(_) => Ok(CheckResult::success()),
            Err(e) => Ok(CheckResult::failure(e.to_string())),
        }
    }

    /// Return the two-stream catalog with its fixed schemas
    pub fn discover(&self) -> Result<Catalog> {
        Catalog::load()
    }

    /// Read all configured lists and their members
    ///
    /// Emits one schema message per stream, then for each configured list id
    /// the list record followed by every member record of that list. Any
    /// fatal error aborts the whole run immediately.
    pub async fn read(&mut self) -> Result<Vec<Message>> {
        let start = Instant::now();
        self.stats = SyncStats::new();

        let catalog = self.discover()?;
        let mut messages = Vec::new();
        for stream in &catalog.streams {
            messages.push(Message::schema(&stream.name, stream.json_schema.clone()));
        }

        let lists = ListsStream::new(&self.config, &self.client);
        let members = ListMembersStream::new(&self.config, &self.client);

        info!(
            "Starting sync for {} configured list(s)",
            self.config.list_ids.len()
        );

        for list_id in &self.config.list_ids {
            let list_record = lists.fetch_one(list_id).await?;
            messages.push(Message::record(ListsStream::NAME, list_record));
            self.stats.add_records(1);

            let context = ListContext::new(list_id);
            let batch = members.fetch_for_list(&context).await?;

            messages.push(Message::debug(format!(
                "List '{list_id}': {} members in {} pages",
                batch.records.len(),
                batch.pages
            )));
            self.stats.add_records(batch.records.len());
            self.stats.add_pages(batch.pages as usize);
            for record in batch.records {
                messages.push(Message::record(ListMembersStream::NAME, record));
            }

            self.stats.add_list();
        }

        self.stats.set_duration(start.elapsed().as_millis() as u64);
        info!(
            "Completed sync: {} records from {} list(s) in {}ms",
            self.stats.records_synced, self.stats.lists_synced, self.stats.duration_ms
        );
        messages.push(Message::info(format!(
            "Completed sync: {} records from {} list(s)",
            self.stats.records_synced, self.stats.lists_synced
        )));

        Ok(messages)
    }
}
