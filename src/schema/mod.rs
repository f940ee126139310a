//! Index schemas: field definitions, capabilities, and the registry.

pub mod field;
pub mod index;
pub mod registry;

pub use self::field::{FieldType, IndexField};
pub use self::index::{IndexSettings, SearchIndex, SearchIndexBuilder};
pub use self::registry::IndexRegistry;
