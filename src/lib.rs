//! # Tamis
//!
//! A storage-agnostic faceted search query engine for Rust.
//!
//! ## Features
//!
//! - Typed, immutable query model with a fluent builder
//! - Declarative filters compiled to executable predicates
//! - Term, range, date-histogram, and geo-distance facets
//! - Stable multi-key sorting, pagination, highlighting, suggestions
//! - Search history and popular-term statistics
//! - Pluggable document store behind a single trait

pub mod compiler;
pub mod document;
pub mod error;
pub mod facet;
pub mod geo;
pub mod history;
pub mod query;
pub mod schema;
pub mod search;
pub mod util;

pub mod prelude {
    pub use crate::document::{Document, DocumentBuilder, FieldValue};
    pub use crate::error::{Result, SearchError};
    pub use crate::query::{
        BoolOp, FilterCondition, FilterOperator, FilterValue, PaginationOptions, SearchFilter,
        SearchQuery, SearchQueryBuilder, SortDirection, SortMode, SortOption,
    };
    pub use crate::schema::{FieldType, IndexField, SearchIndex, SearchIndexBuilder};
    pub use crate::search::{DocumentStore, MemoryStore, SearchEngine, SearchResult};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
