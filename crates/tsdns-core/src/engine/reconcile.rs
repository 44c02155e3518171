//! Record diff and apply
//!
//! Compares desired records against the provider's record set and issues
//! one provider call per change, in order. The first failure stops the
//! run; nothing already applied is undone.

use std::collections::{HashMap, HashSet};
use tracing::info;

use super::Action;
use crate::config::ReconcileMode;
use crate::error::ReconcileError;
use crate::roster::DesiredRecord;
use crate::traits::{DnsProvider, ExistingRecord, RecordSpec};
use crate::zone::is_under_suffix;

/// Apply `mode` to a zone
///
/// # Parameters
///
/// - `mode`: Which reconciliation to perform
/// - `zone_id`: Provider zone ID
/// - `managed_suffix`: Only records under this suffix may be deleted
/// - `desired`: Records that should exist (ignored by `RemoveAll`)
/// - `current`: Records the provider reported at the start of the run
/// - `provider`: Gateway used for every change
///
/// # Returns
///
/// - `Ok(Vec<Action>)`: Every change made, in order
/// - `Err(ReconcileError)`: The first provider failure, with the changes
///   made before it
pub async fn reconcile(
    mode: ReconcileMode,
    zone_id: &str,
    managed_suffix: &str,
    desired: &[DesiredRecord],
    current: &[ExistingRecord],
    provider: &dyn DnsProvider,
) -> Result<Vec<Action>, ReconcileError> {
    let mut applied = Vec::new();

    match mode {
        ReconcileMode::RemoveAll => {
            remove_all(zone_id, managed_suffix, current, provider, &mut applied).await?;
        }
        ReconcileMode::Sync => {
            let lookup = index_current(current);
            sync(zone_id, desired, &lookup, provider, &mut applied).await?;
        }
        ReconcileMode::SyncAndPrune => {
            let lookup = index_current(current);
            let seen = sync(zone_id, desired, &lookup, provider, &mut applied).await?;
            prune(zone_id, managed_suffix, current, &lookup, &seen, provider, &mut applied)
                .await?;
        }
    }

    Ok(applied)
}

/// Key current records by `lowercase(type + name)`; the last one wins
fn index_current(current: &[ExistingRecord]) -> HashMap<String, &ExistingRecord> {
    current.iter().map(|r| (r.key(), r)).collect()
}

/// Delete every managed A/AAAA record
async fn remove_all(
    zone_id: &str,
    managed_suffix: &str,
    current: &[ExistingRecord],
    provider: &dyn DnsProvider,
    applied: &mut Vec<Action>,
) -> Result<(), ReconcileError> {
    for record in current {
        if record.is_address() && is_under_suffix(&record.name, managed_suffix) {
            delete(zone_id, record, provider, applied).await?;
        }
    }
    Ok(())
}

/// Create or update every desired record
///
/// An existing match is always updated, even when its content is already
/// correct.
///
/// # Returns
///
/// The keys of every desired record that was applied
async fn sync(
    zone_id: &str,
    desired: &[DesiredRecord],
    lookup: &HashMap<String, &ExistingRecord>,
    provider: &dyn DnsProvider,
    applied: &mut Vec<Action>,
) -> Result<HashSet<String>, ReconcileError> {
    let mut seen = HashSet::with_capacity(desired.len());

    for record in desired {
        let key = record.key();
        let spec = RecordSpec::auto_ttl(record.record_type, &record.name, record.ip.to_string());

        let action = match lookup.get(&key) {
            Some(existing) => {
                let result = provider.update_record(zone_id, &existing.id, &spec).await;
                if let Err(e) = result {
                    return Err(apply_failed("update", &spec, e, provider, applied));
                }
                Action::Updated {
                    id: existing.id.clone(),
                    record_type: spec.record_type.to_string(),
                    name: spec.name,
                    content: spec.content,
                }
            }
            None => {
                let result = provider.create_record(zone_id, &spec).await;
                match result {
                    Ok(id) => Action::Created {
                        id,
                        record_type: spec.record_type.to_string(),
                        name: spec.name,
                        content: spec.content,
                    },
                    Err(e) => return Err(apply_failed("create", &spec, e, provider, applied)),
                }
            }
        };

        info!("{}", action);
        applied.push(action);
        seen.insert(key);
    }

    Ok(seen)
}

/// Delete managed records of any type that were not synced this run
async fn prune(
    zone_id: &str,
    managed_suffix: &str,
    current: &[ExistingRecord],
    lookup: &HashMap<String, &ExistingRecord>,
    seen: &HashSet<String>,
    provider: &dyn DnsProvider,
    applied: &mut Vec<Action>,
) -> Result<(), ReconcileError> {
    for record in current {
        let key = record.key();

        // Walk `current` for a stable order but only act on lookup entries.
        if !lookup.get(&key).is_some_and(|kept| kept.id == record.id) {
            continue;
        }
        if !is_under_suffix(&record.name, managed_suffix) {
            continue;
        }
        if seen.contains(&key) {
            continue;
        }

        delete(zone_id, record, provider, applied).await?;
    }
    Ok(())
}

async fn delete(
    zone_id: &str,
    record: &ExistingRecord,
    provider: &dyn DnsProvider,
    applied: &mut Vec<Action>,
) -> Result<(), ReconcileError> {
    info!(
        "removing record with name {}, ip {}",
        record.name, record.content
    );

    if let Err(e) = provider.delete_record(zone_id, &record.id).await {
        let source = crate::Error::provider(
            provider.provider_name(),
            format!(
                "unable to delete {} record {} ({}, id {}): {}",
                record.record_type, record.name, record.content, record.id, detail(e)
            ),
        );
        return Err(ReconcileError::new(std::mem::take(applied), source));
    }

    applied.push(Action::Deleted {
        id: record.id.clone(),
        record_type: record.record_type.clone(),
        name: record.name.clone(),
        content: record.content.clone(),
    });
    Ok(())
}

fn apply_failed(
    verb: &str,
    spec: &RecordSpec,
    err: crate::Error,
    provider: &dyn DnsProvider,
    applied: &mut Vec<Action>,
) -> ReconcileError {
    let source = crate::Error::provider(
        provider.provider_name(),
        format!(
            "unable to {} {} record {} -> {}: {}",
            verb, spec.record_type, spec.name, spec.content, detail(err)
        ),
    );
    ReconcileError::new(std::mem::take(applied), source)
}

/// Provider message without the "Provider error (name):" prefix
fn detail(err: crate::Error) -> String {
    match err {
        crate::Error::Provider { message, .. } => message,
        other => other.to_string(),
    }
}
