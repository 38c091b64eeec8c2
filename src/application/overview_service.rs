// Overview service - one concurrent query per provider, merged into one table
use crate::application::account_service::AccountService;
use crate::application::filter_composer;
use crate::application::health::HealthEvaluator;
use crate::application::normalizer::ResultNormalizer;
use crate::application::provider_registry::ProviderRegistry;
use crate::application::query_builder::QuerySpecBuilder;
use crate::application::query_executor::QueryExecutor;
use crate::application::table_assembler::assemble;
use crate::domain::entity::NormalizedEntity;
use crate::domain::filter::FilterSpec;
use crate::domain::provider::{EntityType, GroupBy, ProviderId};
use crate::domain::query::AggregationMode;
use crate::domain::table::AssembledTable;
use crate::error::{KafkaViewError, Result};
use crate::infrastructure::nrql;
use dashmap::DashMap;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tokio::task::{self, JoinError, JoinSet};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewRequest {
    /// UI context the request belongs to; a newer request for the same view supersedes older ones.
    /// Requests without a view are never superseded.
    #[serde(default)]
    pub view: Option<String>,
    pub entity_type: EntityType,
    #[serde(default = "default_mode")]
    pub mode: AggregationMode,
    #[serde(default)]
    pub group_by: Option<GroupBy>,
    /// Empty means "every account where the provider has clusters".
    #[serde(default)]
    pub accounts: Vec<u64>,
    /// Empty means every enabled provider.
    #[serde(default)]
    pub providers: Vec<ProviderId>,
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
}

fn default_mode() -> AggregationMode {
    AggregationMode::Health
}

/// Hands out increasing generations per view.
///
/// A view is tracked only while some ticket for it is alive.
#[derive(Default)]
pub struct RequestGenerations {
    views: DashMap<String, watch::Sender<u64>>,
}

impl RequestGenerations {
    pub fn begin(self: &Arc<Self>, view: &str) -> GenerationTicket {
        let sender = self
            .views
            .entry(view.to_string())
            .or_insert_with(|| watch::channel(0).0);

        let mut generation = 0;
        sender.send_modify(|current| {
            *current += 1;
            generation = *current;
        });

        GenerationTicket {
            view: view.to_string(),
            generation,
            receiver: sender.subscribe(),
            generations: Arc::clone(self),
        }
    }

    #[cfg(test)]
    fn tracked_views(&self) -> usize {
        self.views.len()
    }
}

pub struct GenerationTicket {
    view: String,
    generation: u64,
    receiver: watch::Receiver<u64>,
    generations: Arc<RequestGenerations>,
}

impl Drop for GenerationTicket {
    fn drop(&mut self) {
        // Our own receiver is still alive here, so a count of one means no other ticket remains.
        self.generations
            .views
            .remove_if(&self.view, |_, sender| sender.receiver_count() == 1);
    }
}

impl GenerationTicket {
    pub fn is_current(&self) -> bool {
        *self.receiver.borrow() == self.generation
    }

    /// Resolves once a newer request for the same view has started.
    pub async fn superseded(&mut self) {
        loop {
            if *self.receiver.borrow_and_update() != self.generation {
                return;
            }
            if self.receiver.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    fn stale(&self) -> KafkaViewError {
        KafkaViewError::Superseded {
            view: self.view.clone(),
            generation: self.generation,
        }
    }
}

#[derive(Clone)]
pub struct OverviewService {
    registry: Arc<ProviderRegistry>,
    builder: QuerySpecBuilder,
    normalizer: ResultNormalizer,
    evaluator: HealthEvaluator,
    accounts: AccountService,
    executor: Arc<dyn QueryExecutor>,
    generations: Arc<RequestGenerations>,
}

impl OverviewService {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        builder: QuerySpecBuilder,
        executor: Arc<dyn QueryExecutor>,
    ) -> Self {
        Self {
            normalizer: ResultNormalizer::new(registry.clone()),
            evaluator: HealthEvaluator::new(registry.clone()),
            accounts: AccountService::new(registry.clone(), executor.clone()),
            registry,
            builder,
            executor,
            generations: Arc::new(RequestGenerations::default()),
        }
    }

    /// Loads and merges the table for every active provider.
    ///
    /// Waits for every provider to settle. Fails only with `Superseded`;
    /// provider failures become error flags on the table.
    pub async fn load(&self, request: OverviewRequest) -> Result<AssembledTable> {
        let start_time = Instant::now();
        let mut ticket = request.view.as_deref().map(|view| self.generations.begin(view));
        let request = Arc::new(request);

        let mut providers = if request.providers.is_empty() {
            self.registry.provider_ids()
        } else {
            request.providers.clone()
        };
        providers.sort();
        providers.dedup();

        // Dropping the set aborts whatever is still in flight.
        let mut tasks = JoinSet::new();
        let mut owners = HashMap::with_capacity(providers.len());
        for provider in &providers {
            let provider = *provider;
            let service = self.clone();
            let request = request.clone();
            let handle =
                tasks.spawn(async move { (provider, service.load_provider(provider, &request).await) });
            owners.insert(handle.id(), provider);
        }

        let results = tokio::select! {
            results = settle(&mut tasks, &owners) => results,
            stale = superseded(ticket.as_mut()) => {
                tracing::debug!("{}, discarding in-flight queries", stale);
                return Err(stale);
            }
        };

        if let Some(ticket) = ticket.as_ref().filter(|t| !t.is_current()) {
            return Err(ticket.stale());
        }

        let table = assemble(results);
        tracing::debug!(
            "Assembled {} {} rows from {} providers in {}ms ({} failed)",
            table.rows.len(),
            request.entity_type,
            providers.len(),
            start_time.elapsed().as_millis(),
            table.provider_errors.len()
        );
        Ok(table)
    }

    async fn load_provider(&self, provider: ProviderId, request: &OverviewRequest) -> Result<Vec<NormalizedEntity>> {
        let descriptor = self.registry.describe(provider)?;
        let mut spec = self.builder.build(
            provider,
            request.entity_type,
            request.mode,
            request.group_by,
            Some(request.accounts.as_slice()),
        )?;

        for filter in &request.filters {
            match filter_composer::compose(filter, descriptor) {
                Ok(Some(clause)) => spec = spec.filter_innermost(clause),
                Ok(None) => {}
                Err(err) => tracing::warn!("Skipping filter for {}: {}", provider, err),
            }
        }

        let accounts = if request.accounts.is_empty() {
            self.accounts.discover(provider).await?.search.accounts
        } else {
            request.accounts.clone()
        };
        if accounts.is_empty() {
            tracing::debug!("No accounts report {} data", provider);
            return Ok(Vec::new());
        }

        let query = nrql::render(&spec);
        tracing::debug!("Executing {} query: {}", provider, query);

        let rows = self
            .executor
            .execute(&query, &accounts)
            .await
            .map_err(|e| KafkaViewError::QueryExecutionFailure {
                provider,
                message: format!("{e:#}"),
            })?;

        let mut entities = self
            .normalizer
            .normalize(provider, request.entity_type, request.group_by, &rows)?;
        self.evaluator.evaluate_all(&mut entities);
        Ok(entities)
    }
}

/// Pending forever for requests that carry no view.
async fn superseded(ticket: Option<&mut GenerationTicket>) -> KafkaViewError {
    match ticket {
        Some(ticket) => {
            ticket.superseded().await;
            ticket.stale()
        }
        None => std::future::pending().await,
    }
}

/// Waits for every provider task; a task that panicked counts as a failed provider.
async fn settle(
    tasks: &mut JoinSet<(ProviderId, Result<Vec<NormalizedEntity>>)>,
    owners: &HashMap<task::Id, ProviderId>,
) -> BTreeMap<ProviderId, Result<Vec<NormalizedEntity>>> {
    let mut results = BTreeMap::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((provider, result)) => {
                results.insert(provider, result);
            }
            Err(err) => {
                let Some(provider) = owners.get(&err.id()).copied() else {
                    tracing::warn!("Query task {} has no provider: {}", err.id(), err);
                    continue;
                };
                tracing::warn!("Query task for {} did not complete: {}", provider, err);
                results.insert(
                    provider,
                    Err(KafkaViewError::QueryExecutionFailure {
                        provider,
                        message: task_failure(err),
                    }),
                );
            }
        }
    }
    results
}

fn task_failure(err: JoinError) -> String {
    if err.is_cancelled() {
        return "query task was cancelled".to_string();
    }
    let payload = err.into_panic();
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("query task panicked: {detail}")
}
