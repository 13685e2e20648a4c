pub mod projection;
pub mod order_search;
pub mod record_search;
pub mod order_history;

pub use order_search::OrderSearchService;
pub use record_search::RecordSearchService;
pub use order_history::OrderHistoryService;
