// Domain layer - provider-independent Kafka monitoring model
pub mod entity;
pub mod filter;
pub mod provider;
pub mod query;
pub mod table;
