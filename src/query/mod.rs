//! The typed query model: filters, sorting, pagination, and the builder.

pub mod builder;
pub mod filter;
#[allow(clippy::module_inception)]
pub mod query;
pub mod sort;

pub use self::builder::SearchQueryBuilder;
pub use self::filter::{
    BoolOp, FilterCondition, FilterOperator, FilterValue, GeoQueryValue, MAX_FILTER_DEPTH,
    SearchFilter,
};
pub use self::query::{PaginationOptions, SearchQuery};
pub use self::sort::{SortDirection, SortMode, SortOption};
