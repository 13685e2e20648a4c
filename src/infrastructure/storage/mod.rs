pub mod memory;
pub mod fixture;

pub use memory::{MemoryStorage, StorageError};
pub use fixture::{load_fixture, FixtureError};
