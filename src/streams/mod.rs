//! Stream definitions
//!
//! The tap extracts exactly two streams from the Klaviyo v2 API:
//!
//! - `lists` — one metadata record per configured list identifier
//! - `list_members` — the members of each list, paged with a marker cursor
//!
//! `lists` is the parent stream: each record it emits hands a [`ListContext`]
//! to the members stream, which runs its own pagination loop scoped to that
//! list id. Execution is strictly sequential; all members of one list are
//! emitted before the next list is touched.

mod lists;
mod members;

pub use lists::ListsStream;
pub use members::{ListMembersStream, MemberBatch};

use crate::types::JsonValue;

/// Record field carrying the owning list id on every emitted record
pub const LIST_ID_FIELD: &str = "list_id";

/// Context handed from a parent list record to the child members fetch
///
/// Ephemeral and scoped to a single parent record's processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListContext {
    /// The owning list id
    pub list_id: String,
}

impl ListContext {
    /// Create a context for a list id
    pub fn new(list_id: impl Into<String>) -> Self {
        Self {
            list_id: list_id.into(),
        }
    }

    /// Stamp the context's list id onto a record
    ///
    /// Non-object records are wrapped so the invariant "every record carries
    /// exactly one list_id" holds regardless of what the API returns.
    pub fn stamp(&self, record: JsonValue) -> JsonValue {
        let mut map = match record {
            JsonValue::Object(map) => map,
            other => {
                let mut map = serde_json::Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        map.insert(
            LIST_ID_FIELD.to_string(),
            JsonValue::String(self.list_id.clone()),
        );
        JsonValue::Object(map)
    }
}
