// Filter composer - turns a user filter into a provider-correct predicate
use crate::domain::filter::{FilterOperator, FilterSpec};
use crate::domain::provider::ProviderDescriptor;
use crate::error::Result;
use crate::infrastructure::nrql::{attribute, string_literal};

/// Returns `None` for an inactive filter so nothing is added to the query.
///
/// Every candidate attribute name is tested, since the same quantity may be
/// reported under a different name depending on the ingestion path. Values
/// are not validated here; the backend decides what matches.
pub fn compose(filter: &FilterSpec, descriptor: &ProviderDescriptor) -> Result<Option<String>> {
    if !filter.is_active() {
        return Ok(None);
    }

    let candidates = descriptor.resolve(filter.attribute)?;
    let subject = if candidates.len() == 1 {
        attribute(&candidates[0])
    } else {
        let names: Vec<String> = candidates.iter().map(|c| attribute(c)).collect();
        format!("({})", names.join(" OR "))
    };

    // A single-valued filter with several values still becomes an in-set.
    let clause = match (filter.operator, filter.values.as_slice()) {
        (FilterOperator::Equals, [value]) => format!("{} = {}", subject, string_literal(value)),
        (_, values) => {
            if !filter.multiple && values.len() > 1 {
                tracing::debug!(
                    "Filter on {} is single-valued but carries {} values; using IN",
                    filter.attribute,
                    values.len()
                );
            }
            let literals: Vec<String> = values.iter().map(|v| string_literal(v)).collect();
            format!("{} IN ({})", subject, literals.join(", "))
        }
    };

    Ok(Some(clause))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::provider_registry::ProviderRegistry;
    use crate::domain::provider::{LogicalAttribute, ProviderId};
    use crate::error::KafkaViewError;

    fn registry() -> ProviderRegistry {
        ProviderRegistry::new(&ProviderId::ALL)
    }

    #[test]
    fn test_empty_filter_is_a_no_op() {
        let registry = registry();
        for provider in ProviderId::ALL {
            let descriptor = registry.describe(provider).unwrap();
            for operator in [FilterOperator::Equals, FilterOperator::InSet] {
                let filter = FilterSpec::new(LogicalAttribute::ClusterName, operator, vec![]);
                assert_eq!(compose(&filter, descriptor).unwrap(), None);
            }
        }
    }

    #[test]
    fn test_single_candidate_equals() {
        let registry = registry();
        let filter = FilterSpec::new(
            LogicalAttribute::ClusterName,
            FilterOperator::Equals,
            vec!["payments".to_string()],
        );
        assert_eq!(
            compose(&filter, registry.describe(ProviderId::AwsMsk).unwrap()).unwrap(),
            Some("provider.clusterName = 'payments'".to_string())
        );
    }

    #[test]
    fn test_fallback_candidates_are_disjunctive() {
        let registry = registry();
        let filter = FilterSpec::new(
            LogicalAttribute::TopicName,
            FilterOperator::InSet,
            vec!["orders".to_string(), "payments".to_string()],
        );
        assert_eq!(
            compose(&filter, registry.describe(ProviderId::AwsMskMetricStream).unwrap()).unwrap(),
            Some("(aws.kafka.Topic OR aws.msk.topic) IN ('orders', 'payments')".to_string())
        );
    }

    #[test]
    fn test_single_valued_filter_with_many_values_fails_open() {
        let registry = registry();
        let mut filter = FilterSpec::new(
            LogicalAttribute::BrokerId,
            FilterOperator::Equals,
            vec!["1".to_string(), "2".to_string()],
        );
        filter.multiple = false;
        assert_eq!(
            compose(&filter, registry.describe(ProviderId::KafkaOnHost).unwrap()).unwrap(),
            Some("(kafka.broker.id OR broker.id) IN ('1', '2')".to_string())
        );
    }

    #[test]
    fn test_unsupported_attribute() {
        let registry = registry();
        let filter = FilterSpec::new(
            LogicalAttribute::BrokerId,
            FilterOperator::InSet,
            vec!["1".to_string()],
        );
        assert!(matches!(
            compose(&filter, registry.describe(ProviderId::ConfluentCloud).unwrap()),
            Err(KafkaViewError::UnsupportedAttribute { .. })
        ));
    }
}
