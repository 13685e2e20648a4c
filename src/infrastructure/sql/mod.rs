pub mod select_builder;

pub use select_builder::{SelectBuilder, SelectQuery, SqlBuildError};
