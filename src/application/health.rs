// Health classification - pure threshold rules per provider and entity type
use crate::application::provider_registry::ProviderRegistry;
use crate::domain::entity::{HealthStatus, NormalizedEntity};
use crate::domain::provider::LogicalAttribute;
use std::sync::Arc;

/// A single threshold check; failing any check makes the entity unhealthy.
#[derive(Debug, Clone, PartialEq)]
pub enum HealthCheck {
    /// Metric is reported and differs from the expected value.
    NotEqual { metric: LogicalAttribute, expected: f64 },
    /// Metric is reported and exceeds the threshold.
    Above { metric: LogicalAttribute, threshold: f64 },
    /// At least one of the metrics is reported as zero.
    AnyZero(Vec<LogicalAttribute>),
}

impl HealthCheck {
    fn fails(&self, entity: &NormalizedEntity) -> bool {
        match self {
            HealthCheck::NotEqual { metric, expected } => {
                entity.metric(*metric).is_some_and(|v| v != *expected)
            }
            HealthCheck::Above { metric, threshold } => {
                entity.metric(*metric).is_some_and(|v| v > *threshold)
            }
            HealthCheck::AnyZero(metrics) => metrics
                .iter()
                .any(|m| entity.metric(*m).is_some_and(|v| v == 0.0)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HealthRuleSet {
    /// When none of these are reported, health is Unknown.
    pub required: Vec<LogicalAttribute>,
    pub checks: Vec<HealthCheck>,
}

impl HealthRuleSet {
    pub fn new(required: &[LogicalAttribute]) -> Self {
        Self {
            required: required.to_vec(),
            checks: Vec::new(),
        }
    }

    /// Controller and replication checks every entity is held to, when reported.
    pub fn controller_baseline(extra_required: &[LogicalAttribute]) -> Self {
        let mut required = vec![
            LogicalAttribute::ActiveControllers,
            LogicalAttribute::OfflinePartitions,
            LogicalAttribute::UnderReplicatedPartitions,
        ];
        required.extend_from_slice(extra_required);

        Self::new(&required)
            .check(HealthCheck::NotEqual {
                metric: LogicalAttribute::ActiveControllers,
                expected: 1.0,
            })
            .check(HealthCheck::Above {
                metric: LogicalAttribute::OfflinePartitions,
                threshold: 0.0,
            })
            .check(HealthCheck::Above {
                metric: LogicalAttribute::UnderReplicatedPartitions,
                threshold: 0.0,
            })
    }

    pub fn check(mut self, check: HealthCheck) -> Self {
        self.checks.push(check);
        self
    }

    pub fn classify(&self, entity: &NormalizedEntity) -> HealthStatus {
        if self.checks.iter().any(|c| c.fails(entity)) {
            return HealthStatus::Unhealthy;
        }
        if self.required.iter().all(|m| entity.metric(*m).is_none()) {
            return HealthStatus::Unknown;
        }
        HealthStatus::Healthy
    }
}

#[derive(Clone)]
pub struct HealthEvaluator {
    registry: Arc<ProviderRegistry>,
}

impl HealthEvaluator {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    pub fn evaluate(&self, entity: &NormalizedEntity) -> HealthStatus {
        match self.registry.health_rules(entity.provider_id, entity.entity_type) {
            Some(rules) => rules.classify(entity),
            None => {
                tracing::debug!(
                    "No health rules for {} {} - using the controller baseline",
                    entity.provider_id,
                    entity.entity_type
                );
                HealthRuleSet::controller_baseline(&[]).classify(entity)
            }
        }
    }

    /// Classifies every entity in place.
    pub fn evaluate_all(&self, entities: &mut [NormalizedEntity]) {
        for entity in entities.iter_mut() {
            entity.health = self.evaluate(entity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::provider::{EntityType, ProviderId};

    fn evaluator() -> HealthEvaluator {
        HealthEvaluator::new(Arc::new(ProviderRegistry::new(&ProviderId::ALL)))
    }

    fn entity(provider: ProviderId, entity_type: EntityType, metrics: &[(LogicalAttribute, f64)]) -> NormalizedEntity {
        let mut e = NormalizedEntity::new(entity_type, provider, 1, "prod".to_string());
        e.metrics.extend(metrics.iter().copied());
        e
    }

    #[test]
    fn test_healthy_cluster_on_every_controller_provider() {
        let evaluator = evaluator();
        for provider in [ProviderId::AwsMsk, ProviderId::AwsMskMetricStream, ProviderId::KafkaOnHost] {
            let cluster = entity(
                provider,
                EntityType::Cluster,
                &[
                    (LogicalAttribute::ActiveControllers, 1.0),
                    (LogicalAttribute::OfflinePartitions, 0.0),
                    (LogicalAttribute::UnderReplicatedPartitions, 0.0),
                ],
            );
            assert_eq!(evaluator.evaluate(&cluster), HealthStatus::Healthy, "{provider}");
        }
    }

    #[test]
    fn test_cluster_failing_checks() {
        let evaluator = evaluator();
        let cases = [
            (LogicalAttribute::ActiveControllers, 0.0),
            (LogicalAttribute::ActiveControllers, 2.0),
            (LogicalAttribute::OfflinePartitions, 3.0),
            (LogicalAttribute::UnderReplicatedPartitions, 1.0),
        ];
        for (metric, value) in cases {
            let cluster = entity(ProviderId::AwsMsk, EntityType::Cluster, &[(metric, value)]);
            assert_eq!(evaluator.evaluate(&cluster), HealthStatus::Unhealthy, "{metric}={value}");
        }
    }

    #[test]
    fn test_cluster_without_metrics_is_unknown() {
        let cluster = entity(ProviderId::KafkaOnHost, EntityType::Cluster, &[]);
        assert_eq!(evaluator().evaluate(&cluster), HealthStatus::Unknown);
    }

    #[test]
    fn test_partial_metrics_are_not_unknown() {
        let cluster = entity(
            ProviderId::AwsMsk,
            EntityType::Cluster,
            &[(LogicalAttribute::ActiveControllers, 1.0)],
        );
        assert_eq!(evaluator().evaluate(&cluster), HealthStatus::Healthy);
    }

    #[test]
    fn test_topic_with_zero_bytes_in() {
        let topic = entity(
            ProviderId::ConfluentCloud,
            EntityType::Topic,
            &[(LogicalAttribute::BytesIn, 0.0), (LogicalAttribute::BytesOut, 512.0)],
        );
        assert_eq!(evaluator().evaluate(&topic), HealthStatus::Unhealthy);
    }

    #[test]
    fn test_topic_with_traffic_is_healthy() {
        let topic = entity(
            ProviderId::AwsMsk,
            EntityType::Topic,
            &[(LogicalAttribute::BytesIn, 10.0), (LogicalAttribute::BytesOut, 12.0)],
        );
        assert_eq!(evaluator().evaluate(&topic), HealthStatus::Healthy);
    }

    #[test]
    fn test_controller_baseline_is_healthy_everywhere() {
        let evaluator = evaluator();
        for provider in ProviderId::ALL {
            for entity_type in [EntityType::Cluster, EntityType::Broker, EntityType::Topic] {
                let e = entity(
                    provider,
                    entity_type,
                    &[
                        (LogicalAttribute::ActiveControllers, 1.0),
                        (LogicalAttribute::OfflinePartitions, 0.0),
                        (LogicalAttribute::UnderReplicatedPartitions, 0.0),
                    ],
                );
                assert_eq!(evaluator.evaluate(&e), HealthStatus::Healthy, "{provider} {entity_type}");
            }
        }
    }

    #[test]
    fn test_confluent_cluster_with_throughput_only() {
        let cluster = entity(
            ProviderId::ConfluentCloud,
            EntityType::Cluster,
            &[(LogicalAttribute::BytesIn, 2048.0)],
        );
        assert_eq!(evaluator().evaluate(&cluster), HealthStatus::Healthy);
    }

    #[test]
    fn test_unregistered_rule_set_is_unknown() {
        // Confluent Cloud does not expose brokers.
        let broker = entity(
            ProviderId::ConfluentCloud,
            EntityType::Broker,
            &[(LogicalAttribute::BytesIn, 10.0)],
        );
        assert_eq!(evaluator().evaluate(&broker), HealthStatus::Unknown);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let evaluator = evaluator();
        let broker = entity(
            ProviderId::KafkaOnHost,
            EntityType::Broker,
            &[(LogicalAttribute::UnderReplicatedPartitions, 4.0)],
        );
        let first = evaluator.evaluate(&broker);
        assert_eq!(first, HealthStatus::Unhealthy);
        assert_eq!(evaluator.evaluate(&broker), first);
    }
}
