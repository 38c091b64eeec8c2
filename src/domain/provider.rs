// Provider domain model
use crate::error::KafkaViewError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Kafka monitoring backends known to this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderId {
    AwsMsk,
    AwsMskMetricStream,
    ConfluentCloud,
    KafkaOnHost,
}

impl ProviderId {
    pub const ALL: [ProviderId; 4] = [
        ProviderId::AwsMsk,
        ProviderId::AwsMskMetricStream,
        ProviderId::ConfluentCloud,
        ProviderId::KafkaOnHost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::AwsMsk => "aws-msk",
            ProviderId::AwsMskMetricStream => "aws-msk-metric-stream",
            ProviderId::ConfluentCloud => "confluent-cloud",
            ProviderId::KafkaOnHost => "kafka-on-host",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderId::AwsMsk => "Amazon MSK",
            ProviderId::AwsMskMetricStream => "Amazon MSK (metric streams)",
            ProviderId::ConfluentCloud => "Confluent Cloud",
            ProviderId::KafkaOnHost => "Kafka (on-host integration)",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = KafkaViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProviderId::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| KafkaViewError::UnknownProvider(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Cluster,
    Topic,
    Broker,
}

impl EntityType {
    /// The logical attribute that identifies an entity of this type.
    pub fn identity_attribute(&self) -> LogicalAttribute {
        match self {
            EntityType::Cluster => LogicalAttribute::ClusterName,
            EntityType::Topic => LogicalAttribute::TopicName,
            EntityType::Broker => LogicalAttribute::BrokerId,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityType::Cluster => "cluster",
            EntityType::Topic => "topic",
            EntityType::Broker => "broker",
        };
        f.write_str(name)
    }
}

/// Provider-independent name for a quantity or identity attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LogicalAttribute {
    ClusterName,
    BrokerId,
    TopicName,
    BytesIn,
    BytesOut,
    MessagesIn,
    ActiveControllers,
    OfflinePartitions,
    UnderReplicatedPartitions,
    Region,
}

impl LogicalAttribute {
    /// Attributes normalized into an entity's metric map.
    pub const METRICS: [LogicalAttribute; 6] = [
        LogicalAttribute::BytesIn,
        LogicalAttribute::BytesOut,
        LogicalAttribute::MessagesIn,
        LogicalAttribute::ActiveControllers,
        LogicalAttribute::OfflinePartitions,
        LogicalAttribute::UnderReplicatedPartitions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalAttribute::ClusterName => "clusterName",
            LogicalAttribute::BrokerId => "brokerId",
            LogicalAttribute::TopicName => "topicName",
            LogicalAttribute::BytesIn => "bytesIn",
            LogicalAttribute::BytesOut => "bytesOut",
            LogicalAttribute::MessagesIn => "messagesIn",
            LogicalAttribute::ActiveControllers => "activeControllers",
            LogicalAttribute::OfflinePartitions => "offlinePartitions",
            LogicalAttribute::UnderReplicatedPartitions => "underReplicatedPartitions",
            LogicalAttribute::Region => "region",
        }
    }
}

impl fmt::Display for LogicalAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extra facet dimension a caller may group entities by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GroupBy {
    Cluster,
    Region,
}

impl GroupBy {
    pub fn attribute(&self) -> LogicalAttribute {
        match self {
            GroupBy::Cluster => LogicalAttribute::ClusterName,
            GroupBy::Region => LogicalAttribute::Region,
        }
    }
}

/// Static description of one provider: where its data lives and what it calls things.
#[derive(Debug, Clone)]
pub struct ProviderDescriptor {
    pub id: ProviderId,
    pub uses_metric_stream: bool,
    /// Event type queried in `FROM` per entity type.
    pub event_types: HashMap<EntityType, String>,
    /// Entity-search `type` per entity type.
    pub search_types: HashMap<EntityType, String>,
    /// Ordered fallback candidates, first non-null wins.
    pub attribute_map: HashMap<LogicalAttribute, Vec<String>>,
}

impl ProviderDescriptor {
    pub fn new(id: ProviderId, uses_metric_stream: bool) -> Self {
        Self {
            id,
            uses_metric_stream,
            event_types: HashMap::new(),
            search_types: HashMap::new(),
            attribute_map: HashMap::new(),
        }
    }

    pub fn with_entity(mut self, entity_type: EntityType, event_type: &str, search_type: &str) -> Self {
        self.event_types.insert(entity_type, event_type.to_string());
        self.search_types.insert(entity_type, search_type.to_string());
        self
    }

    pub fn with_attribute(mut self, attribute: LogicalAttribute, candidates: &[&str]) -> Self {
        self.attribute_map.insert(
            attribute,
            candidates.iter().map(|c| c.to_string()).collect(),
        );
        self
    }

    pub fn supports(&self, entity_type: EntityType) -> bool {
        self.event_types.contains_key(&entity_type)
    }

    pub fn resolve(&self, attribute: LogicalAttribute) -> Result<&[String], KafkaViewError> {
        self.attribute_map
            .get(&attribute)
            .filter(|candidates| !candidates.is_empty())
            .map(Vec::as_slice)
            .ok_or(KafkaViewError::UnsupportedAttribute {
                provider: self.id,
                attribute,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_id_round_trips_through_str() {
        for provider in ProviderId::ALL {
            assert_eq!(provider.as_str().parse::<ProviderId>().unwrap(), provider);
        }
    }

    #[test]
    fn test_unknown_provider_string() {
        let err = "kinesis".parse::<ProviderId>().unwrap_err();
        assert!(matches!(err, KafkaViewError::UnknownProvider(name) if name == "kinesis"));
    }

    #[test]
    fn test_resolve_unmapped_attribute() {
        let descriptor = ProviderDescriptor::new(ProviderId::ConfluentCloud, false)
            .with_attribute(LogicalAttribute::BytesIn, &["received_bytes"]);

        assert_eq!(
            descriptor.resolve(LogicalAttribute::BytesIn).unwrap(),
            &["received_bytes".to_string()]
        );
        assert!(matches!(
            descriptor.resolve(LogicalAttribute::ActiveControllers),
            Err(KafkaViewError::UnsupportedAttribute { .. })
        ));
    }
}
