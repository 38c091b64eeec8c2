// NerdGraph (GraphQL) implementation of the query executor
use crate::application::query_executor::{
    EntitySearchQuery, EntitySearchResult, FacetCount, QueryExecutor, RawRow,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::collections::BTreeSet;
use std::time::Duration;

const NRQL_QUERY: &str = r#"query($accounts: [Int!]!, $nrql: Nrql!) {
  actor { nrql(accounts: $accounts, query: $nrql) { results } }
}"#;

const ENTITY_SEARCH_QUERY: &str = r#"query($query: String!) {
  actor {
    entitySearch(query: $query) {
      count
      types { count type domain }
      results { entities { accountId name } }
    }
  }
}"#;

#[derive(Debug, Clone)]
pub struct NerdGraphExecutor {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQLError>,
}

#[derive(Debug, Deserialize)]
struct GraphQLError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct NrqlData {
    actor: NrqlActor,
}

#[derive(Debug, Deserialize)]
struct NrqlActor {
    nrql: Option<NrqlResult>,
}

#[derive(Debug, Deserialize)]
struct NrqlResult {
    #[serde(default)]
    results: Vec<RawRow>,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    actor: SearchActor,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchActor {
    entity_search: Option<EntitySearch>,
}

#[derive(Debug, Deserialize)]
struct EntitySearch {
    #[serde(default)]
    types: Vec<SearchTypeCount>,
    results: Option<SearchResults>,
}

#[derive(Debug, Deserialize)]
struct SearchTypeCount {
    count: u64,
    #[serde(rename = "type")]
    entity_type: String,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    #[serde(default)]
    entities: Vec<SearchEntity>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchEntity {
    account_id: u64,
}

impl NerdGraphExecutor {
    pub fn new(endpoint: String, api_key: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build NerdGraph HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn post<T: DeserializeOwned>(&self, query: &str, variables: serde_json::Value) -> Result<T> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("API-Key", &self.api_key)
            .header("Accept", "application/json")
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .context("Failed to send request to NerdGraph")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("NerdGraph request failed with status {}: {}", status, body);
        }

        let body = response
            .json::<GraphQLResponse<T>>()
            .await
            .context("Failed to parse NerdGraph response")?;

        if let Some(error) = body.errors.first() {
            anyhow::bail!("NerdGraph error: {}", error.message);
        }

        body.data.context("NerdGraph response carried no data")
    }
}

#[async_trait]
impl QueryExecutor for NerdGraphExecutor {
    async fn execute(&self, nrql: &str, accounts: &[u64]) -> Result<Vec<RawRow>> {
        let data: NrqlData = self
            .post(NRQL_QUERY, json!({ "accounts": accounts, "nrql": nrql }))
            .await?;

        let rows = data.actor.nrql.map(|r| r.results).unwrap_or_default();
        tracing::debug!("NRQL returned {} rows across {} accounts", rows.len(), accounts.len());
        Ok(rows)
    }

    async fn search_entities(&self, query: &EntitySearchQuery) -> Result<EntitySearchResult> {
        let data: SearchData = self
            .post(ENTITY_SEARCH_QUERY, json!({ "query": query.predicate() }))
            .await?;

        let Some(search) = data.actor.entity_search else {
            return Ok(EntitySearchResult::default());
        };

        let accounts: BTreeSet<u64> = search
            .results
            .map(|r| r.entities)
            .unwrap_or_default()
            .into_iter()
            .map(|e| e.account_id)
            .collect();

        Ok(EntitySearchResult {
            accounts: accounts.into_iter().collect(),
            counts: search
                .types
                .into_iter()
                .map(|t| FacetCount {
                    facet: t.entity_type,
                    count: t.count,
                })
                .collect(),
        })
    }
}
