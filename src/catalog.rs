//! Stream catalog and fixed schemas
//!
//! The tap ships a fixed JSON Schema per record type; nothing is inferred at
//! runtime. The schema documents live under `schemas/` and are embedded into
//! the binary at compile time.

use crate::error::Result;
use crate::streams::{ListMembersStream, ListsStream};
use crate::types::JsonValue;
use serde::{Deserialize, Serialize};

/// Embedded schema document for the `lists` stream
const LISTS_SCHEMA: &str = include_str!("../schemas/lists.json");

/// Embedded schema document for the `list_members` stream
const LIST_MEMBERS_SCHEMA: &str = include_str!("../schemas/list_members.json");

/// A stream entry in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogStream {
    /// Stream name
    pub name: String,
    /// JSON Schema describing the record shape
    pub json_schema: JsonValue,
    /// Primary key fields
    pub primary_key: Vec<String>,
}

/// The catalog of streams this tap extracts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    /// Available streams
    pub streams: Vec<CatalogStream>,
}

impl Catalog {
    /// Build the two-stream catalog from the embedded schemas
    pub fn load() -> Result<Self> {
        Ok(Self {
            streams: vec![
                CatalogStream {
                    name: ListsStream::NAME.to_string(),
                    json_schema: serde_json::from_str(LISTS_SCHEMA)?,
                    primary_key: vec![ListsStream::PRIMARY_KEY.to_string()],
                },
                CatalogStream {
                    name: ListMembersStream::NAME.to_string(),
                    json_schema: serde_json::from_str(LIST_MEMBERS_SCHEMA)?,
                    primary_key: vec![ListMembersStream::PRIMARY_KEY.to_string()],
                },
            ],
        })
    }

    /// Look up a stream by name
    pub fn get_stream(&self, name: &str) -> Option<&CatalogStream> {
        self.streams.iter().find(|s| s.name == name)
    }
}
