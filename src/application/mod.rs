// Application layer - Provider-agnostic query, health and table logic
pub mod account_service;
pub mod filter_composer;
pub mod health;
pub mod normalizer;
pub mod overview_service;
pub mod provider_registry;
pub mod query_builder;
pub mod query_executor;
pub mod query_templates;
pub mod table_assembler;
