pub mod handler;
pub mod page;
pub mod session;

pub use handler::WebState;
pub use session::{SessionInputs, SessionStore};
