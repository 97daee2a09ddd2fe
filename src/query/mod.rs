/// Query construction module
///
/// The filter builder and pagination calculator reused by every listing
/// endpoint.

mod filter;
mod pagination;

pub use filter::FilterSpec;
pub use filter::Predicate;
pub use filter::SEARCH_TERM_KEY;
pub use pagination::calculate;
pub use pagination::ListMeta;
pub use pagination::ListResponse;
pub use pagination::Pagination;
pub use pagination::PaginationQuery;
pub use pagination::SortOrder;
