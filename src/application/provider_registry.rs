// Provider registry - immutable catalog assembled once at start-up
use crate::application::health::{HealthCheck, HealthRuleSet};
use crate::application::query_templates::TemplateFamily;
use crate::domain::provider::{
    EntityType, LogicalAttribute, ProviderDescriptor, ProviderId,
};
use crate::domain::query::{QuerySpec, TemplateKey};
use crate::error::{KafkaViewError, Result};
use std::collections::HashMap;

use LogicalAttribute::*;

struct ProviderEntry {
    descriptor: ProviderDescriptor,
    family: TemplateFamily,
    templates: HashMap<TemplateKey, QuerySpec>,
    health_rules: HashMap<EntityType, HealthRuleSet>,
}

/// Read-only lookup of descriptors, templates and health rules for the enabled providers.
pub struct ProviderRegistry {
    providers: HashMap<ProviderId, ProviderEntry>,
}

impl ProviderRegistry {
    pub fn new(enabled: &[ProviderId]) -> Self {
        let providers = enabled
            .iter()
            .map(|id| {
                let descriptor = describe_provider(*id);
                let family = TemplateFamily::for_descriptor(&descriptor);
                let templates = family
                    .templates(&descriptor)
                    .into_iter()
                    .filter(|(key, spec)| accept_template(&descriptor, *key, spec))
                    .collect();
                let health_rules = health_rules(*id);
                let entry = ProviderEntry {
                    descriptor,
                    family,
                    templates,
                    health_rules,
                };
                (*id, entry)
            })
            .collect();

        Self { providers }
    }

    /// Enabled providers in a stable order.
    pub fn provider_ids(&self) -> Vec<ProviderId> {
        let mut ids: Vec<ProviderId> = self.providers.keys().copied().collect();
        ids.sort();
        ids
    }

    fn entry(&self, provider: ProviderId) -> Result<&ProviderEntry> {
        self.providers
            .get(&provider)
            .ok_or_else(|| KafkaViewError::UnknownProvider(provider.to_string()))
    }

    pub fn describe(&self, provider: ProviderId) -> Result<&ProviderDescriptor> {
        self.entry(provider).map(|e| &e.descriptor)
    }

    pub fn resolve_attribute(&self, provider: ProviderId, attribute: LogicalAttribute) -> Result<&[String]> {
        self.describe(provider)?.resolve(attribute)
    }

    pub fn family(&self, provider: ProviderId) -> Result<TemplateFamily> {
        self.entry(provider).map(|e| e.family)
    }

    pub fn template(&self, provider: ProviderId, key: TemplateKey) -> Result<&QuerySpec> {
        self.entry(provider)?
            .templates
            .get(&key)
            .ok_or(KafkaViewError::TemplateNotFound {
                provider,
                entity_type: key.entity_type,
                mode: key.mode,
                group_by: key.group_by,
            })
    }

    pub fn health_rules(&self, provider: ProviderId, entity_type: EntityType) -> Option<&HealthRuleSet> {
        self.providers
            .get(&provider)
            .and_then(|e| e.health_rules.get(&entity_type))
    }

    #[cfg(test)]
    pub(crate) fn template_keys(&self, provider: ProviderId) -> Vec<TemplateKey> {
        self.providers
            .get(&provider)
            .map(|e| e.templates.keys().copied().collect())
            .unwrap_or_default()
    }
}

/// A nested template may only reference what its inner query produces.
fn accept_template(descriptor: &ProviderDescriptor, key: TemplateKey, spec: &QuerySpec) -> bool {
    if !descriptor.supports(key.entity_type) {
        tracing::warn!("Rejecting {:?} template for {}: entity type not reported", key, descriptor.id);
        return false;
    }
    let unresolved = spec.unresolved_references();
    if !unresolved.is_empty() {
        tracing::warn!(
            "Rejecting {:?} template for {}: unresolved references {:?}",
            key,
            descriptor.id,
            unresolved
        );
        return false;
    }
    true
}

fn describe_provider(id: ProviderId) -> ProviderDescriptor {
    match id {
        ProviderId::AwsMsk => ProviderDescriptor::new(id, false)
            .with_entity(EntityType::Cluster, "AwsMskClusterSample", "AWSMSKCLUSTER")
            .with_entity(EntityType::Broker, "AwsMskBrokerSample", "AWSMSKBROKER")
            .with_entity(EntityType::Topic, "AwsMskTopicSample", "AWSMSKTOPIC")
            .with_attribute(ClusterName, &["provider.clusterName"])
            .with_attribute(BrokerId, &["provider.brokerId"])
            .with_attribute(TopicName, &["provider.topic"])
            .with_attribute(BytesIn, &["provider.bytesInPerSec.Average"])
            .with_attribute(BytesOut, &["provider.bytesOutPerSec.Average"])
            .with_attribute(MessagesIn, &["provider.messagesInPerSec.Average"])
            .with_attribute(ActiveControllers, &["provider.activeControllerCount.Sum"])
            .with_attribute(OfflinePartitions, &["provider.offlinePartitionsCount.Sum"])
            .with_attribute(UnderReplicatedPartitions, &["provider.underReplicatedPartitions.Sum"])
            .with_attribute(Region, &["awsRegion"]),
        ProviderId::AwsMskMetricStream => ProviderDescriptor::new(id, true)
            .with_entity(EntityType::Cluster, "Metric", "AWSMSKCLUSTER")
            .with_entity(EntityType::Broker, "Metric", "AWSMSKBROKER")
            .with_entity(EntityType::Topic, "Metric", "AWSMSKTOPIC")
            .with_attribute(ClusterName, &["aws.kafka.ClusterName", "aws.msk.clusterName"])
            .with_attribute(BrokerId, &["aws.kafka.BrokerID", "aws.msk.brokerId"])
            .with_attribute(TopicName, &["aws.kafka.Topic", "aws.msk.topic"])
            .with_attribute(BytesIn, &["aws.kafka.BytesInPerSec"])
            .with_attribute(BytesOut, &["aws.kafka.BytesOutPerSec"])
            .with_attribute(MessagesIn, &["aws.kafka.MessagesInPerSec"])
            .with_attribute(ActiveControllers, &["aws.kafka.ActiveControllerCount"])
            .with_attribute(OfflinePartitions, &["aws.kafka.OfflinePartitionsCount"])
            .with_attribute(UnderReplicatedPartitions, &["aws.kafka.UnderReplicatedPartitions"])
            .with_attribute(Region, &["aws.region"]),
        ProviderId::ConfluentCloud => ProviderDescriptor::new(id, false)
            .with_entity(EntityType::Cluster, "Metric", "CONFLUENTCLOUDCLUSTER")
            .with_entity(EntityType::Topic, "Metric", "CONFLUENTCLOUDKAFKATOPIC")
            .with_attribute(ClusterName, &["confluent.kafka.cluster.name", "kafka.id"])
            .with_attribute(TopicName, &["topic"])
            .with_attribute(BytesIn, &["confluent.kafka.server.received_bytes"])
            .with_attribute(BytesOut, &["confluent.kafka.server.sent_bytes"])
            .with_attribute(MessagesIn, &["confluent.kafka.server.received_records"]),
        ProviderId::KafkaOnHost => ProviderDescriptor::new(id, false)
            .with_entity(EntityType::Cluster, "KafkaBrokerSample", "ONHOSTKAFKACLUSTER")
            .with_entity(EntityType::Broker, "KafkaBrokerSample", "ONHOSTKAFKABROKER")
            .with_entity(EntityType::Topic, "KafkaTopicSample", "ONHOSTKAFKATOPIC")
            .with_attribute(ClusterName, &["kafka.cluster.name", "clusterName"])
            .with_attribute(BrokerId, &["kafka.broker.id", "broker.id"])
            .with_attribute(TopicName, &["kafka.topic.name", "topic"])
            .with_attribute(BytesIn, &["kafka.broker.bytesIn", "broker.IOInPerSecond", "topic.bytesInPerSecond"])
            .with_attribute(BytesOut, &["kafka.broker.bytesOut", "broker.IOOutPerSecond", "topic.bytesOutPerSecond"])
            .with_attribute(MessagesIn, &["kafka.broker.messagesIn", "broker.messagesInPerSecond"])
            .with_attribute(ActiveControllers, &["kafka.controller.activeControllerCount", "controller.activeControllerCount"])
            .with_attribute(OfflinePartitions, &["kafka.controller.offlinePartitionsCount", "controller.offlinePartitionsCount"])
            .with_attribute(UnderReplicatedPartitions, &["kafka.replication.underReplicatedPartitions", "replication.unreplicatedPartitions"]),
    }
}

fn topic_rules() -> HealthRuleSet {
    HealthRuleSet::controller_baseline(&[BytesIn, BytesOut])
        .check(HealthCheck::AnyZero(vec![BytesIn, BytesOut]))
}

fn health_rules(id: ProviderId) -> HashMap<EntityType, HealthRuleSet> {
    match id {
        ProviderId::AwsMsk | ProviderId::AwsMskMetricStream | ProviderId::KafkaOnHost => HashMap::from([
            (EntityType::Cluster, HealthRuleSet::controller_baseline(&[])),
            (EntityType::Broker, HealthRuleSet::controller_baseline(&[BytesIn, BytesOut])),
            (EntityType::Topic, topic_rules()),
        ]),
        // Confluent Cloud reports no controller or replication metrics; throughput stands in.
        ProviderId::ConfluentCloud => HashMap::from([
            (EntityType::Cluster, HealthRuleSet::controller_baseline(&[BytesIn, BytesOut, MessagesIn])),
            (EntityType::Topic, topic_rules()),
        ]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::provider::GroupBy;
    use crate::domain::query::{AggregateFn, AggregationMode, SelectItem};

    #[test]
    fn test_describe_disabled_provider() {
        let registry = ProviderRegistry::new(&[ProviderId::AwsMsk]);
        assert!(registry.describe(ProviderId::AwsMsk).is_ok());
        assert!(matches!(
            registry.describe(ProviderId::KafkaOnHost),
            Err(KafkaViewError::UnknownProvider(_))
        ));
    }

    #[test]
    fn test_resolve_attribute_fallback_order() {
        let registry = ProviderRegistry::new(&ProviderId::ALL);
        assert_eq!(
            registry.resolve_attribute(ProviderId::KafkaOnHost, ClusterName).unwrap(),
            &["kafka.cluster.name".to_string(), "clusterName".to_string()]
        );
        assert!(matches!(
            registry.resolve_attribute(ProviderId::ConfluentCloud, OfflinePartitions),
            Err(KafkaViewError::UnsupportedAttribute { .. })
        ));
    }

    #[test]
    fn test_families_follow_ingestion_shape() {
        let registry = ProviderRegistry::new(&ProviderId::ALL);
        assert_eq!(registry.family(ProviderId::AwsMskMetricStream).unwrap(), TemplateFamily::MetricStream);
        assert_eq!(registry.family(ProviderId::AwsMsk).unwrap(), TemplateFamily::MskPolling);
        assert_eq!(registry.family(ProviderId::ConfluentCloud).unwrap(), TemplateFamily::ConfluentDimensional);
        assert_eq!(registry.family(ProviderId::KafkaOnHost).unwrap(), TemplateFamily::OnHostAgent);
    }

    #[test]
    fn test_every_template_is_well_formed() {
        let registry = ProviderRegistry::new(&ProviderId::ALL);
        for provider in registry.provider_ids() {
            let descriptor = registry.describe(provider).unwrap();
            for key in registry.template_keys(provider) {
                assert!(descriptor.supports(key.entity_type), "{provider} {key:?}");
                let spec = registry.template(provider, key).unwrap();
                assert!(!spec.select.is_empty(), "{provider} {key:?}");
                assert!(spec.facet_by.contains(&"accountId".to_string()), "{provider} {key:?}");
                assert!(spec.unresolved_references().is_empty(), "{provider} {key:?}");
            }
        }
    }

    #[test]
    fn test_registration_keeps_every_valid_template() {
        let registry = ProviderRegistry::new(&ProviderId::ALL);
        assert_eq!(registry.template_keys(ProviderId::AwsMsk).len(), 12);
        assert_eq!(registry.template_keys(ProviderId::AwsMskMetricStream).len(), 12);
        assert_eq!(registry.template_keys(ProviderId::ConfluentCloud).len(), 6);
        assert_eq!(registry.template_keys(ProviderId::KafkaOnHost).len(), 10);
    }

    #[test]
    fn test_registration_rejects_broken_templates() {
        let descriptor = describe_provider(ProviderId::ConfluentCloud);
        let inner = QuerySpec::from_events("Metric")
            .select([SelectItem::of(AggregateFn::Sum, "confluent.kafka.server.received_bytes")])
            .facet(["accountId".to_string(), "kafka.id".to_string()]);

        let dangling = QuerySpec::over(inner.clone())
            .select([SelectItem::of(AggregateFn::Sum, "confluent.kafka.server.sent_bytes")])
            .facet(["accountId".to_string()]);
        let cluster = TemplateKey::new(EntityType::Cluster, AggregationMode::Throughput, None);
        assert!(!accept_template(&descriptor, cluster, &dangling));

        let valid = QuerySpec::over(inner)
            .select([SelectItem::of(AggregateFn::Sum, "confluent.kafka.server.received_bytes")])
            .facet(["accountId".to_string()]);
        assert!(accept_template(&descriptor, cluster, &valid));

        let broker = TemplateKey::new(EntityType::Broker, AggregationMode::Throughput, None);
        assert!(!accept_template(&descriptor, broker, &valid));
    }

    #[test]
    fn test_missing_combination_is_template_not_found() {
        let registry = ProviderRegistry::new(&ProviderId::ALL);
        let key = TemplateKey::new(EntityType::Broker, AggregationMode::Health, None);
        assert!(matches!(
            registry.template(ProviderId::ConfluentCloud, key),
            Err(KafkaViewError::TemplateNotFound { provider: ProviderId::ConfluentCloud, .. })
        ));

        let key = TemplateKey::new(EntityType::Cluster, AggregationMode::Health, Some(GroupBy::Region));
        assert!(registry.template(ProviderId::KafkaOnHost, key).is_err());
    }
}
