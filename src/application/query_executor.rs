// Query executor trait for the external query and entity-search backend
use async_trait::async_trait;
use serde::Serialize;

/// One result row: output alias or facet attribute to value.
pub type RawRow = serde_json::Map<String, serde_json::Value>;

/// Entity search over `domain` and `type`, optionally narrowed to names.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySearchQuery {
    pub domains: Vec<String>,
    pub entity_type: String,
    pub names: Vec<String>,
}

impl EntitySearchQuery {
    pub fn infra(entity_type: &str) -> Self {
        Self {
            domains: vec!["INFRA".to_string()],
            entity_type: entity_type.to_string(),
            names: Vec::new(),
        }
    }

    /// Textual predicate, e.g. `domain IN ('INFRA') AND type = 'AWSMSKCLUSTER'`.
    pub fn predicate(&self) -> String {
        use crate::infrastructure::nrql::string_literal;

        let domains: Vec<String> = self.domains.iter().map(|d| string_literal(d)).collect();
        let mut predicate = format!(
            "domain IN ({}) AND type = {}",
            domains.join(", "),
            string_literal(&self.entity_type)
        );
        if !self.names.is_empty() {
            let names: Vec<String> = self.names.iter().map(|n| string_literal(n)).collect();
            predicate.push_str(&format!(" AND name IN ({})", names.join(", ")));
        }
        predicate
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetCount {
    pub facet: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySearchResult {
    /// Distinct account ids owning at least one matching entity, ascending.
    pub accounts: Vec<u64>,
    pub counts: Vec<FacetCount>,
}

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run an NRQL query across the given accounts.
    async fn execute(&self, nrql: &str, accounts: &[u64]) -> anyhow::Result<Vec<RawRow>>;

    /// Find entities matching the search predicate
    async fn search_entities(&self, query: &EntitySearchQuery) -> anyhow::Result<EntitySearchResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_search_predicate() {
        let mut query = EntitySearchQuery::infra("ONHOSTKAFKACLUSTER");
        assert_eq!(query.predicate(), "domain IN ('INFRA') AND type = 'ONHOSTKAFKACLUSTER'");

        query.names = vec!["prod".to_string(), "stage".to_string()];
        assert_eq!(
            query.predicate(),
            "domain IN ('INFRA') AND type = 'ONHOSTKAFKACLUSTER' AND name IN ('prod', 'stage')"
        );
    }
}
