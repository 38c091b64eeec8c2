// Error taxonomy for query construction, execution and assembly
use crate::domain::entity::EntityIdentity;
use crate::domain::provider::{EntityType, GroupBy, LogicalAttribute, ProviderId};
use crate::domain::query::AggregationMode;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum KafkaViewError {
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Non-fatal: the provider does not report this quantity.
    #[error("Provider {provider} has no mapping for attribute {attribute}")]
    UnsupportedAttribute {
        provider: ProviderId,
        attribute: LogicalAttribute,
    },

    #[error("No {mode} query template for {entity_type} on {provider} (group by {group_by:?})")]
    TemplateNotFound {
        provider: ProviderId,
        entity_type: EntityType,
        mode: AggregationMode,
        group_by: Option<GroupBy>,
    },

    #[error("Query for {provider} failed: {message}")]
    QueryExecutionFailure { provider: ProviderId, message: String },

    #[error("Duplicate entity identity: {0:?}")]
    DuplicateEntityIdentity(EntityIdentity),

    #[error("Request generation {generation} for view {view} was superseded")]
    Superseded { view: String, generation: u64 },
}

pub type Result<T> = std::result::Result<T, KafkaViewError>;

impl IntoResponse for KafkaViewError {
    fn into_response(self) -> Response {
        let status = match &self {
            KafkaViewError::UnknownProvider(_) => StatusCode::NOT_FOUND,
            KafkaViewError::UnsupportedAttribute { .. } => StatusCode::BAD_REQUEST,
            KafkaViewError::TemplateNotFound { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            KafkaViewError::QueryExecutionFailure { .. } => StatusCode::BAD_GATEWAY,
            KafkaViewError::DuplicateEntityIdentity(_) => StatusCode::INTERNAL_SERVER_ERROR,
            KafkaViewError::Superseded { .. } => StatusCode::CONFLICT,
        };

        let body = Json(json!({
            "error": self.to_string(),
            "code": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
