//! Search execution: the engine, the store boundary, and result assembly.

pub mod assembler;
pub mod engine;
pub mod highlight;
pub mod store;
pub mod suggest;

pub use self::assembler::{ResultAssembler, SearchResult};
pub use self::engine::{SearchConfig, SearchEngine};
pub use self::highlight::{HighlightConfig, HighlightResult, Highlighter};
pub use self::store::{DocumentStore, MemoryStore, ScoredDocument};
pub use self::suggest::{Suggester, SuggesterConfig};
