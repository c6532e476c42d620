//! Marker-based pagination
//!
//! The Klaviyo v2 group-members endpoint pages with an opaque continuation
//! token ("marker") returned in the response body. The next page is requested
//! by echoing that token back as a query parameter; a response without a
//! marker is the last page.
//!
//! The API occasionally echoes a stale marker back. Without a guard the tap
//! would re-fetch the same page forever, so the cursor remembers the marker
//! used for the in-flight request and fails fatally when the response returns
//! that same marker again.

use crate::error::{Error, Result};
use crate::types::JsonValue;

/// Response body key holding the page's records
pub const RECORDS_KEY: &str = "records";

/// Response body key holding the continuation token
pub const MARKER_KEY: &str = "marker";

/// Query parameter name for the continuation token
pub const MARKER_PARAM: &str = "marker";

// ============================================================================
// Page parsing
// ============================================================================

/// A single parsed page of the members endpoint
#[derive(Debug, Clone)]
pub struct MemberPage {
    /// Records in this page, in API order
    pub records: Vec<JsonValue>,
    /// Continuation token for the next page, absent on the last page
    pub marker: Option<String>,
}

impl MemberPage {
    /// Parse a page from a response body
    ///
    /// The body must be an object with a `records` array. The `marker` field
    /// is optional; its absence signals the end of the stream.
    pub fn parse(body: &JsonValue) -> Result<Self> {
        let records = body
            .get(RECORDS_KEY)
            .ok_or_else(|| {
                Error::record_extraction(RECORDS_KEY, "field missing from response body")
            })?
            .as_array()
            .ok_or_else(|| Error::record_extraction(RECORDS_KEY, "field is not an array"))?
            .clone();

        let marker = match body.get(MARKER_KEY) {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::String(s)) => Some(s.clone()),
            // The API has been seen returning numeric markers.
            Some(JsonValue::Number(n)) => Some(n.to_string()),
            Some(other) => {
                return Err(Error::record_extraction(
                    MARKER_KEY,
                    format!("expected a string, got {other}"),
                ))
            }
        };

        Ok(Self { records, marker })
    }

    /// Number of records in this page
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the page carries no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ============================================================================
// Cursor state
// ============================================================================

/// Result of advancing the cursor past a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    /// More pages available, request the next one with this marker
    Continue {
        /// Continuation token for the next request
        marker: String,
    },
    /// No more pages
    Done,
}

impl NextPage {
    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Tracks the marker across one partition's pagination loop
///
/// The cursor holds the marker the current request was issued with, which is
/// exactly the value needed for structural loop detection.
#[derive(Debug, Clone, Default)]
pub struct MarkerCursor {
    /// Marker sent with the in-flight request (None for the first page)
    current: Option<String>,
    /// Pages fetched so far
    pub pages_fetched: u32,
    /// Records fetched so far
    pub records_fetched: u64,
    /// Is pagination complete?
    pub done: bool,
}

impl MarkerCursor {
    /// Create a cursor positioned before the first page
    pub fn new() -> Self {
        Self::default()
    }

    /// Marker to send with the next request, if any
    pub fn marker(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Advance the cursor past a parsed page
    ///
    /// Returns `NextPage::Done` when the page carries no marker, and fails
    /// with [`Error::PaginationLoop`] when the returned marker is identical
    /// to the one this page was requested with.
    pub fn advance(&mut self, list_id: &str, page: &MemberPage) -> Result<NextPage> {
        self.pages_fetched += 1;
        self.records_fetched += page.len() as u64;

        match &page.marker {
            None => {
                self.done = true;
                Ok(NextPage::Done)
            }
            Some(next) if Some(next.as_str()) == self.marker() => {
                Err(Error::pagination_loop(list_id, next))
            }
            Some(next) if next.is_empty() => {
                self.done = true;
                Ok(NextPage::Done)
            }
            Some(next) => {
                self.current = Some(next.clone());
                Ok(NextPage::Continue {
                    marker: next.clone(),
                })
            }
        }
    }
}
