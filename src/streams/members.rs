//! List members stream
//!
//! For a given list id, pages through `group/{list_id}/members/all` using the
//! marker cursor from [`crate::pagination`] and yields every member record
//! stamped with the owning list id. Pages are yielded in API order; records
//! within a page keep their order.

use super::ListContext;
use crate::config::TapConfig;
use crate::error::Result;
use crate::http::{HttpClient, RequestConfig};
use crate::pagination::{MarkerCursor, MemberPage, NextPage, MARKER_PARAM};
use crate::types::JsonValue;
use tracing::debug;

/// Result of paging one list to completion
#[derive(Debug, Clone)]
pub struct MemberBatch {
    /// All member records in page order, each stamped with the list id
    pub records: Vec<JsonValue>,
    /// Number of pages fetched
    pub pages: u32,
}

/// The `list_members` stream
pub struct ListMembersStream<'a> {
    config: &'a TapConfig,
    client: &'a HttpClient,
}

impl<'a> ListMembersStream<'a> {
    /// Stream name
    pub const NAME: &'static str = "list_members";

    /// Primary key field (the Klaviyo person id)
    pub const PRIMARY_KEY: &'static str = "id";

    /// Create the stream over a shared client and config
    pub fn new(config: &'a TapConfig, client: &'a HttpClient) -> Self {
        Self { config, client }
    }

    /// Endpoint path for a list's members
    fn members_path(list_id: &str) -> String {
        format!("group/{list_id}/members/all")
    }

    /// Fetch every member of a list, visiting each page exactly once
    ///
    /// Returns all member records in page order, each carrying
    /// `list_id = context.list_id`. A repeated marker aborts the partition
    /// with a fatal [`crate::error::Error::PaginationLoop`].
    pub async fn fetch_for_list(&self, context: &ListContext) -> Result<MemberBatch> {
        let url = self.config.endpoint(&Self::members_path(&context.list_id));
        let mut cursor = MarkerCursor::new();
        let mut records = Vec::new();

        loop {
            let mut request = RequestConfig::new().query("api_key", &self.config.api_key);
            if let Some(marker) = cursor.marker() {
                request = request.query(MARKER_PARAM, marker);
            }

            let body: JsonValue = self.client.get_json_with_config(&url, request).await?;
            let page = MemberPage::parse(&body)?;

            debug!(
                "List '{}': page {} with {} records",
                context.list_id,
                cursor.pages_fetched + 1,
                page.len()
            );

            for record in &page.records {
                records.push(context.stamp(record.clone()));
            }

            match cursor.advance(&context.list_id, &page)? {
                NextPage::Continue { .. } => {}
                NextPage::Done => break,
            }
        }

        debug!(
            "List '{}': fetched {} members in {} pages",
            context.list_id, cursor.records_fetched, cursor.pages_fetched
        );

        Ok(MemberBatch {
            records,
            pages: cursor.pages_fetched,
        })
    }
}
