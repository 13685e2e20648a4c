pub mod value;
pub mod row_set;
pub mod table;
pub mod query;
pub mod outcome;
// src/domain/entity/mod.rs

pub use value::Value;
pub use row_set::{Row, RowSet};
pub use table::{UnifiedTable, TableView, TableError};
pub use query::{SearchQuery, QueryError};
pub use outcome::{Notice, NoticeLevel, SearchOutcome, OutcomeView};
