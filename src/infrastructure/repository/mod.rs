pub mod memory_repository;
pub mod sql_repository;

pub use memory_repository::MemorySourceRepository;
pub use sql_repository::SqlSourceRepository;
