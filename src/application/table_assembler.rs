// Table assembler - merges every provider's entities into one sorted table
use crate::domain::entity::{EntityIdentity, NormalizedEntity};
use crate::domain::provider::ProviderId;
use crate::domain::table::{AssembledTable, ProviderErrorFlag, TableRow};
use crate::error::{KafkaViewError, Result};
use std::collections::{BTreeMap, HashSet};

/// Concatenates providers in `ProviderId` order and stable-sorts by account id,
/// so rows with equal accounts keep their per-provider arrival order.
///
/// A failed provider contributes no rows and one error flag. Rows repeating an
/// identity already seen are dropped and reported; the first one wins.
pub fn assemble(results: BTreeMap<ProviderId, Result<Vec<NormalizedEntity>>>) -> AssembledTable {
    let mut entities = Vec::new();
    let mut provider_errors = Vec::new();

    for (provider_id, result) in results {
        match result {
            Ok(rows) => entities.extend(rows),
            Err(err) => {
                tracing::warn!("Provider {} contributed no rows: {}", provider_id, err);
                provider_errors.push(ProviderErrorFlag {
                    provider_id,
                    message: err.to_string(),
                });
            }
        }
    }

    let mut seen: HashSet<EntityIdentity> = HashSet::with_capacity(entities.len());
    let mut duplicates = Vec::new();
    let mut unique = Vec::with_capacity(entities.len());
    for entity in entities {
        let identity = entity.identity();
        if seen.contains(&identity) {
            let err = KafkaViewError::DuplicateEntityIdentity(identity.clone());
            tracing::warn!("{} - keeping the first row", err);
            if !duplicates.contains(&identity) {
                duplicates.push(identity);
            }
            continue;
        }
        seen.insert(identity);
        unique.push(entity);
    }

    // `sort_by_key` is stable.
    unique.sort_by_key(|e| e.account_id);

    AssembledTable {
        rows: unique.into_iter().map(TableRow::from).collect(),
        provider_errors,
        duplicates,
        generated_at: chrono::Utc::now(),
    }
}
