// Query spec builder - picks the provider's template for a logical request
use crate::application::provider_registry::ProviderRegistry;
use crate::domain::provider::{EntityType, GroupBy, ProviderId};
use crate::domain::query::{AggregationMode, MAX_QUERY_LIMIT, QuerySpec, TemplateKey};
use crate::error::Result;
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
pub struct QueryDefaults {
    pub limit: u32,
    pub since_minutes: u32,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            limit: 200,
            since_minutes: 60,
        }
    }
}

#[derive(Clone)]
pub struct QuerySpecBuilder {
    registry: Arc<ProviderRegistry>,
    defaults: QueryDefaults,
}

impl QuerySpecBuilder {
    pub fn new(registry: Arc<ProviderRegistry>, defaults: QueryDefaults) -> Self {
        Self { registry, defaults }
    }

    /// Builds a fresh query spec for one provider.
    ///
    /// Fails with `TemplateNotFound` when the provider has no template for the
    /// combination; that is a configuration gap, not a transient failure.
    pub fn build(
        &self,
        provider: ProviderId,
        entity_type: EntityType,
        mode: AggregationMode,
        group_by: Option<GroupBy>,
        account_scope: Option<&[u64]>,
    ) -> Result<QuerySpec> {
        let key = TemplateKey::new(entity_type, mode, group_by);
        let template = self.registry.template(provider, key)?;
        let family = self.registry.family(provider)?;

        tracing::debug!(
            "Building {} {} query for {} from {:?} templates (group by {:?})",
            mode,
            entity_type,
            provider,
            family,
            group_by
        );

        let mut spec = template
            .clone()
            .limit(self.defaults.limit.min(MAX_QUERY_LIMIT))
            .since_minutes(self.defaults.since_minutes);

        if let Some(accounts) = account_scope.filter(|a| !a.is_empty()) {
            spec = spec.filter_innermost(account_clause(accounts));
        }

        Ok(spec)
    }
}

fn account_clause(accounts: &[u64]) -> String {
    let ids: Vec<String> = accounts.iter().map(u64::to_string).collect();
    format!("accountId IN ({})", ids.join(", "))
}
