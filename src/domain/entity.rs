// Normalized entity domain model
use super::provider::{EntityType, LogicalAttribute, ProviderId};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Unknown,
}

/// One Kafka entity as reported by one provider, in provider-independent terms.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEntity {
    pub entity_type: EntityType,
    pub provider_id: ProviderId,
    pub account_id: u64,
    pub name: String,
    /// Value of the group-by facet, when the query was grouped.
    pub group: Option<String>,
    pub metrics: BTreeMap<LogicalAttribute, f64>,
    pub health: HealthStatus,
}

impl NormalizedEntity {
    pub fn new(entity_type: EntityType, provider_id: ProviderId, account_id: u64, name: String) -> Self {
        Self {
            entity_type,
            provider_id,
            account_id,
            name,
            group: None,
            metrics: BTreeMap::new(),
            health: HealthStatus::Unknown,
        }
    }

    pub fn metric(&self, attribute: LogicalAttribute) -> Option<f64> {
        self.metrics.get(&attribute).copied()
    }

    pub fn identity(&self) -> EntityIdentity {
        EntityIdentity {
            provider_id: self.provider_id,
            entity_type: self.entity_type,
            account_id: self.account_id,
            group: self.group.clone(),
            name: self.name.clone(),
        }
    }
}

/// Two rows describe the same entity exactly when their identities are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EntityIdentity {
    pub provider_id: ProviderId,
    pub entity_type: EntityType,
    pub account_id: u64,
    pub group: Option<String>,
    pub name: String,
}
