// Result normalizer - raw backend rows into provider-independent entities
use crate::application::provider_registry::ProviderRegistry;
use crate::application::query_executor::RawRow;
use crate::domain::entity::NormalizedEntity;
use crate::domain::provider::{EntityType, GroupBy, LogicalAttribute, ProviderId};
use crate::error::Result;
use serde_json::Value;
use std::sync::Arc;

#[derive(Clone)]
pub struct ResultNormalizer {
    registry: Arc<ProviderRegistry>,
}

impl ResultNormalizer {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    /// Maps rows in arrival order. Rows without an identity are dropped; metrics
    /// that are null or non-numeric stay absent rather than becoming zero.
    pub fn normalize(
        &self,
        provider: ProviderId,
        entity_type: EntityType,
        group_by: Option<GroupBy>,
        rows: &[RawRow],
    ) -> Result<Vec<NormalizedEntity>> {
        let identity = self
            .registry
            .resolve_attribute(provider, entity_type.identity_attribute())?;

        let group_candidates = match group_by {
            Some(g) => self.registry.resolve_attribute(provider, g.attribute()).ok(),
            None => None,
        };

        // Unmapped metrics are simply never reported by this provider.
        let metric_candidates: Vec<(LogicalAttribute, &[String])> = LogicalAttribute::METRICS
            .iter()
            .filter_map(|m| {
                self.registry
                    .resolve_attribute(provider, *m)
                    .ok()
                    .map(|names| (*m, names))
            })
            .collect();

        let mut entities = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(name) = first_text(row, identity) else {
                tracing::debug!("Dropping {} row from {} without identity", entity_type, provider);
                continue;
            };
            let Some(account_id) = row.get("accountId").and_then(account_number) else {
                tracing::debug!("Dropping {} row {} from {} without accountId", entity_type, name, provider);
                continue;
            };

            let mut entity = NormalizedEntity::new(entity_type, provider, account_id, name);
            entity.group = group_candidates.and_then(|names| first_text(row, names));
            for (metric, names) in &metric_candidates {
                if let Some(value) = first_number(row, names) {
                    entity.metrics.insert(*metric, value);
                }
            }
            entities.push(entity);
        }

        Ok(entities)
    }
}

fn first_text(row: &RawRow, candidates: &[String]) -> Option<String> {
    candidates.iter().find_map(|name| match row.get(name)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn first_number(row: &RawRow, candidates: &[String]) -> Option<f64> {
    candidates.iter().find_map(|name| numeric(row.get(name)?))
}

fn numeric(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

fn account_number(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
