//! Comic series and issue metadata resolution backed by a local SQLite dump
//! of the Grand Comics Database.
//!
//! The crate turns a series or issue id into a [`CanonicalMetadata`] record
//! through a fixed pipeline: read-through cache with a count-based
//! consistency gate, relational queries with delimiter-joined aggregate
//! columns, issue/story credit merging, optional cover scraping from the
//! public site, and a pure normalization pass at the end. [`GcdResolver`] is
//! the entry point; everything below it is synchronous and per-call.

pub mod aggregation;
pub mod cache_manager;
pub mod canonical;
pub mod config;
pub mod cover_resolver;
pub mod db_manager;
pub mod delimited;
pub mod error;
pub mod issue_number;
pub mod key_date;
pub mod normalizer;
pub mod records;
pub mod resolver;

/// Stable identifier used as the cache partition key and tag origin id.
pub const SOURCE_ID: &str = "gcd";
/// Human-readable source name used in errors and the tag origin.
pub const SOURCE_NAME: &str = "Grand Comics Database";

pub use canonical::{CanonicalMetadata, CanonicalSeries, Credit, TagOrigin};
pub use config::{default_config_path, load_config, save_config, GcdConfig};
pub use error::{DataFault, NetworkFault, ResolverError};
pub use records::{GcdCredit, GcdIssue, GcdSeries};
pub use resolver::GcdResolver;
