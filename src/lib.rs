// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # tap-klaviyo
//!
//! A data extraction connector for the Klaviyo marketing API.
//!
//! Pulls two streams: list metadata (`lists`) and list memberships
//! (`list_members`). Membership pages are walked with Klaviyo's opaque
//! `marker` cursor, with a loop guard that aborts the sync when the API
//! hands back the same marker twice in a row.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tap_klaviyo::{KlaviyoTap, TapConfig};
//!
//! #[tokio::main]
//! async fn main() -> tap_klaviyo::Result<()> {
//!     let config = TapConfig::new("pk_...", vec!["LIST_ID".to_string()]);
//!     let mut tap = KlaviyoTap::new(config)?;
//!
//!     // Check connection
//!     let status = tap.check().await?;
//!
//!     // Discover available streams
//!     let catalog = tap.discover()?;
//!
//!     // Read data
//!     for message in tap.read().await? {
//!         println!("{}", serde_json::to_string(&message)?);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the tap
pub mod error;

/// Common types and type aliases
pub mod types;

/// Tap configuration
pub mod config;

/// HTTP client with retry and rate limiting
pub mod http;

/// Marker-based cursor pagination
pub mod pagination;

/// Stream implementations (lists, list members)
pub mod streams;

/// Stream catalog and JSON schemas
pub mod catalog;

/// Output messages and sync statistics
pub mod messages;

/// Tap interface: check, discover, read
pub mod tap;

/// Command-line interface
pub mod cli;

// ============================================================================
// Public re-exports
// ============================================================================

pub use catalog::{Catalog, CatalogStream};
pub use config::TapConfig;
pub use error::{Error, Result};
pub use messages::{Message, SyncStats};
pub use pagination::{MarkerCursor, MemberPage, NextPage};
pub use streams::{ListContext, ListMembersStream, ListsStream};
pub use tap::{CheckResult, KlaviyoTap};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
