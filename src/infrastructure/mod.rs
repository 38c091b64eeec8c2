// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod nerdgraph_executor;
pub mod nrql;
