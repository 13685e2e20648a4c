pub mod source_repository;
pub mod search_gateway;

pub use source_repository::{
    SourceRepository, RepositoryError, FilterCondition, TableRef
};
pub use search_gateway::{SearchGateway, GatewayError, RecordTable, OrderTables};

#[cfg(test)]
pub use source_repository::MockSourceRepository;
#[cfg(test)]
pub use search_gateway::MockSearchGateway;
