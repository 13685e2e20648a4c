pub mod handler;

pub use handler::{ApiError, SearchApiState};
