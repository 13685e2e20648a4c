pub mod sql;
pub mod repository;
pub mod storage;
pub mod client;
