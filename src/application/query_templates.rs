// Declarative query template families, one per ingestion shape
use crate::domain::provider::{EntityType, GroupBy, LogicalAttribute, ProviderDescriptor, ProviderId};
use crate::domain::query::{
    AggregateFn, AggregationMode, QuerySpec, SelectItem, TemplateKey,
};

use AggregationMode::{Health, Throughput};
use EntityType::{Broker, Cluster, Topic};
use LogicalAttribute::*;

/// Which set of templates a provider's queries come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateFamily {
    /// Everything lands in `Metric` rows via CloudWatch metric streams.
    MetricStream,
    MskPolling,
    ConfluentDimensional,
    OnHostAgent,
}

impl TemplateFamily {
    pub fn for_descriptor(descriptor: &ProviderDescriptor) -> Self {
        if descriptor.uses_metric_stream {
            return TemplateFamily::MetricStream;
        }
        match descriptor.id {
            ProviderId::AwsMsk => TemplateFamily::MskPolling,
            ProviderId::ConfluentCloud => TemplateFamily::ConfluentDimensional,
            ProviderId::KafkaOnHost => TemplateFamily::OnHostAgent,
            ProviderId::AwsMskMetricStream => TemplateFamily::MetricStream,
        }
    }

    /// Expands the family into concrete query specs using the provider's attribute names.
    pub fn templates(&self, descriptor: &ProviderDescriptor) -> Vec<(TemplateKey, QuerySpec)> {
        let t = Templates { descriptor };
        match self {
            TemplateFamily::MskPolling => vec![
                (key(Cluster, Health, None), t.cluster_health(None, AggregateFn::Latest)),
                (key(Cluster, Health, Some(GroupBy::Region)), t.cluster_health(Some(GroupBy::Region), AggregateFn::Latest)),
                (key(Cluster, Throughput, None), t.cluster_throughput(None)),
                (key(Cluster, Throughput, Some(GroupBy::Region)), t.cluster_throughput(Some(GroupBy::Region))),
                (key(Broker, Health, None), t.broker_health(None)),
                (key(Broker, Health, Some(GroupBy::Cluster)), t.broker_health(Some(GroupBy::Cluster))),
                (key(Broker, Throughput, None), t.throughput(Broker, None, AggregateFn::Average)),
                (key(Broker, Throughput, Some(GroupBy::Cluster)), t.throughput(Broker, Some(GroupBy::Cluster), AggregateFn::Average)),
                (key(Topic, Health, None), t.topic_health(None)),
                (key(Topic, Health, Some(GroupBy::Cluster)), t.topic_health(Some(GroupBy::Cluster))),
                (key(Topic, Throughput, None), t.throughput(Topic, None, AggregateFn::Average)),
                (key(Topic, Throughput, Some(GroupBy::Cluster)), t.throughput(Topic, Some(GroupBy::Cluster), AggregateFn::Average)),
            ],
            TemplateFamily::MetricStream => vec![
                (key(Cluster, Health, None), t.cluster_health(None, AggregateFn::Max)),
                (key(Cluster, Health, Some(GroupBy::Region)), t.cluster_health(Some(GroupBy::Region), AggregateFn::Max)),
                (key(Cluster, Throughput, None), t.cluster_throughput(None)),
                (key(Cluster, Throughput, Some(GroupBy::Region)), t.cluster_throughput(Some(GroupBy::Region))),
                (key(Broker, Health, None), t.broker_health(None)),
                (key(Broker, Health, Some(GroupBy::Cluster)), t.broker_health(Some(GroupBy::Cluster))),
                (key(Broker, Throughput, None), t.throughput(Broker, None, AggregateFn::Average)),
                (key(Broker, Throughput, Some(GroupBy::Cluster)), t.throughput(Broker, Some(GroupBy::Cluster), AggregateFn::Average)),
                (key(Topic, Health, None), t.topic_health(None)),
                (key(Topic, Health, Some(GroupBy::Cluster)), t.topic_health(Some(GroupBy::Cluster))),
                (key(Topic, Throughput, None), t.throughput(Topic, None, AggregateFn::Average)),
                (key(Topic, Throughput, Some(GroupBy::Cluster)), t.throughput(Topic, Some(GroupBy::Cluster), AggregateFn::Average)),
            ],
            // Confluent Cloud exposes no brokers and no region dimension.
            TemplateFamily::ConfluentDimensional => vec![
                (key(Cluster, Health, None), t.confluent_cluster_health()),
                (key(Cluster, Throughput, None), t.throughput(Cluster, None, AggregateFn::Sum)),
                (key(Topic, Health, None), t.topic_health(None)),
                (key(Topic, Health, Some(GroupBy::Cluster)), t.topic_health(Some(GroupBy::Cluster))),
                (key(Topic, Throughput, None), t.throughput(Topic, None, AggregateFn::Sum)),
                (key(Topic, Throughput, Some(GroupBy::Cluster)), t.throughput(Topic, Some(GroupBy::Cluster), AggregateFn::Sum)),
            ],
            TemplateFamily::OnHostAgent => vec![
                (key(Cluster, Health, None), t.rolled_up_cluster_health()),
                (key(Cluster, Throughput, None), t.cluster_throughput(None)),
                (key(Broker, Health, None), t.broker_health(None)),
                (key(Broker, Health, Some(GroupBy::Cluster)), t.broker_health(Some(GroupBy::Cluster))),
                (key(Broker, Throughput, None), t.throughput(Broker, None, AggregateFn::Average)),
                (key(Broker, Throughput, Some(GroupBy::Cluster)), t.throughput(Broker, Some(GroupBy::Cluster), AggregateFn::Average)),
                (key(Topic, Health, None), t.topic_health(None)),
                (key(Topic, Health, Some(GroupBy::Cluster)), t.topic_health(Some(GroupBy::Cluster))),
                (key(Topic, Throughput, None), t.throughput(Topic, None, AggregateFn::Average)),
                (key(Topic, Throughput, Some(GroupBy::Cluster)), t.throughput(Topic, Some(GroupBy::Cluster), AggregateFn::Average)),
            ],
        }
    }

    /// Predicates every query of this family carries.
    fn base_predicates(&self) -> &'static [&'static str] {
        match self {
            TemplateFamily::MetricStream => &[
                "collector.name = 'cloudwatch-metric-streams'",
                "aws.Namespace = 'AWS/Kafka'",
            ],
            TemplateFamily::ConfluentDimensional => &["metricName LIKE 'confluent.kafka.server.%'"],
            TemplateFamily::MskPolling | TemplateFamily::OnHostAgent => &[],
        }
    }
}

fn key(entity_type: EntityType, mode: AggregationMode, group_by: Option<GroupBy>) -> TemplateKey {
    TemplateKey::new(entity_type, mode, group_by)
}

const THROUGHPUT: [LogicalAttribute; 3] = [BytesIn, BytesOut, MessagesIn];
const CONTROLLER_HEALTH: [LogicalAttribute; 3] =
    [ActiveControllers, OfflinePartitions, UnderReplicatedPartitions];

struct Templates<'a> {
    descriptor: &'a ProviderDescriptor,
}

impl Templates<'_> {
    fn family(&self) -> TemplateFamily {
        TemplateFamily::for_descriptor(self.descriptor)
    }

    fn candidates(&self, attribute: LogicalAttribute) -> Vec<String> {
        self.descriptor
            .resolve(attribute)
            .map(<[String]>::to_vec)
            .unwrap_or_default()
    }

    fn select(&self, function: AggregateFn, attributes: &[LogicalAttribute]) -> Vec<SelectItem> {
        attributes
            .iter()
            .flat_map(|a| self.candidates(*a))
            .map(|name| SelectItem::of(function, &name))
            .collect()
    }

    fn select_or_zero(&self, function: AggregateFn, attributes: &[LogicalAttribute]) -> Vec<SelectItem> {
        self.select(function, attributes)
            .into_iter()
            .map(SelectItem::or_zero)
            .collect()
    }

    /// `accountId` plus every candidate name for the entity's identity attribute.
    fn identity(&self, entity_type: EntityType) -> Vec<String> {
        let mut facets = vec!["accountId".to_string()];
        facets.extend(self.candidates(entity_type.identity_attribute()));
        facets
    }

    fn group(&self, group_by: Option<GroupBy>) -> Vec<String> {
        group_by.map(|g| self.candidates(g.attribute())).unwrap_or_default()
    }

    fn base(&self, entity_type: EntityType) -> QuerySpec {
        let event_type = self
            .descriptor
            .event_types
            .get(&entity_type)
            .map(String::as_str)
            .unwrap_or("Metric");
        self.family()
            .base_predicates()
            .iter()
            .fold(QuerySpec::from_events(event_type), |spec, p| spec.filter(*p))
    }

    fn cluster_health(&self, group_by: Option<GroupBy>, function: AggregateFn) -> QuerySpec {
        self.base(Cluster)
            .select(self.select(function, &CONTROLLER_HEALTH))
            .facet(self.identity(Cluster))
            .facet(self.group(group_by))
    }

    fn confluent_cluster_health(&self) -> QuerySpec {
        self.base(Cluster)
            .select(self.select(AggregateFn::Sum, &THROUGHPUT))
            .facet(self.identity(Cluster))
    }

    /// Per-broker latest values summed per cluster, for agents that only report brokers.
    fn rolled_up_cluster_health(&self) -> QuerySpec {
        let per_broker = self
            .base(Broker)
            .select(self.select(AggregateFn::Latest, &CONTROLLER_HEALTH))
            .facet(self.identity(Cluster))
            .facet(self.candidates(BrokerId));

        let outer_select: Vec<SelectItem> = per_broker
            .select
            .iter()
            .map(|item| SelectItem::of(AggregateFn::Sum, &item.alias))
            .collect();

        QuerySpec::over(per_broker)
            .select(outer_select)
            .facet(self.identity(Cluster))
    }

    /// Average rate per broker, then summed per cluster.
    fn cluster_throughput(&self, group_by: Option<GroupBy>) -> QuerySpec {
        let per_broker = self
            .base(Broker)
            .select(self.select(AggregateFn::Average, &THROUGHPUT))
            .facet(self.identity(Cluster))
            .facet(self.group(group_by))
            .facet(self.candidates(BrokerId));

        let outer_select: Vec<SelectItem> = per_broker
            .select
            .iter()
            .map(|item| SelectItem::of(AggregateFn::Sum, &item.alias).or_zero())
            .collect();

        let order = self.candidates(BytesIn).into_iter().next();
        let outer = QuerySpec::over(per_broker)
            .select(outer_select)
            .facet(self.identity(Cluster))
            .facet(self.group(group_by));
        match order {
            Some(bytes_in) => outer.order_by_desc(&bytes_in),
            None => outer,
        }
    }

    fn broker_health(&self, group_by: Option<GroupBy>) -> QuerySpec {
        self.base(Broker)
            .select(self.select(AggregateFn::Latest, &[UnderReplicatedPartitions]))
            .select(self.select(AggregateFn::Average, &THROUGHPUT))
            .facet(self.identity(Broker))
            .facet(self.group(group_by))
    }

    fn topic_health(&self, group_by: Option<GroupBy>) -> QuerySpec {
        self.base(Topic)
            .select(self.select(AggregateFn::Average, &THROUGHPUT))
            .facet(self.identity(Topic))
            .facet(self.group(group_by))
    }

    fn throughput(&self, entity_type: EntityType, group_by: Option<GroupBy>, function: AggregateFn) -> QuerySpec {
        self.base(entity_type)
            .select(self.select_or_zero(function, &THROUGHPUT))
            .facet(self.identity(entity_type))
            .facet(self.group(group_by))
    }
}
