// Merged overview table domain model
use super::entity::{EntityIdentity, HealthStatus, NormalizedEntity};
use super::provider::{EntityType, ProviderId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub provider_id: ProviderId,
    pub provider_name: &'static str,
    pub entity_type: EntityType,
    pub account_id: u64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub health: HealthStatus,
    pub metrics: BTreeMap<String, f64>,
}

impl From<NormalizedEntity> for TableRow {
    fn from(entity: NormalizedEntity) -> Self {
        Self {
            provider_id: entity.provider_id,
            provider_name: entity.provider_id.display_name(),
            entity_type: entity.entity_type,
            account_id: entity.account_id,
            name: entity.name,
            group: entity.group,
            health: entity.health,
            metrics: entity
                .metrics
                .into_iter()
                .map(|(attribute, value)| (attribute.as_str().to_string(), value))
                .collect(),
        }
    }
}

/// Per-provider failure marker shown alongside the rows that did load.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderErrorFlag {
    pub provider_id: ProviderId,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembledTable {
    pub rows: Vec<TableRow>,
    pub provider_errors: Vec<ProviderErrorFlag>,
    pub duplicates: Vec<EntityIdentity>,
    pub generated_at: DateTime<Utc>,
}
