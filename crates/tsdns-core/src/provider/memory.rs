// # Memory Provider
//
// In-memory implementation of DnsProvider.
//
// ## Purpose
//
// Provides a provider that keeps zones and records in a HashMap. Useful
// for testing the reconciler without a DNS vendor.
//
// ## Behavior
//
// - Zones must be registered up front; unknown zone names are `NotFound`
// - Record IDs are assigned from a counter, starting at 1
// - Nothing persists across restarts

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

use crate::Error;
use crate::config::ProviderConfig;
use crate::traits::{DnsProvider, DnsProviderFactory, ExistingRecord, RecordSpec};

#[derive(Debug, Default)]
struct Zones {
    /// zone name -> zone ID
    ids: HashMap<String, String>,
    /// zone ID -> records, in insertion order
    records: HashMap<String, Vec<ExistingRecord>>,
}

/// In-memory DNS provider
///
/// Clones share the same zones.
///
/// # Example
///
/// ```rust,no_run
/// use tsdns_core::provider::MemoryProvider;
/// use tsdns_core::traits::{DnsProvider, RecordSpec};
/// use tsdns_core::zone::RecordType;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let provider = MemoryProvider::with_zone("example.com", "zone-1");
///
///     let zone_id = provider.zone_id("example.com").await?;
///     let spec = RecordSpec::auto_ttl(RecordType::A, "host1.example.com", "10.0.0.1");
///     provider.create_record(&zone_id, &spec).await?;
///
///     assert_eq!(provider.list_records(&zone_id).await?.len(), 1);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    inner: Arc<RwLock<Zones>>,
    next_id: Arc<AtomicU64>,
}

impl MemoryProvider {
    /// Create a provider with no zones
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider with one empty zone
    pub fn with_zone(zone_name: impl Into<String>, zone_id: impl Into<String>) -> Self {
        let mut zones = Zones::default();
        let zone_id = zone_id.into();
        zones.ids.insert(zone_name.into().to_lowercase(), zone_id.clone());
        zones.records.insert(zone_id, Vec::new());

        Self {
            inner: Arc::new(RwLock::new(zones)),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Register an empty zone
    pub async fn add_zone(&self, zone_name: impl Into<String>, zone_id: impl Into<String>) {
        let mut guard = self.inner.write().await;
        let zone_id = zone_id.into();
        guard.ids.insert(zone_name.into().to_lowercase(), zone_id.clone());
        guard.records.entry(zone_id).or_default();
    }

    /// Seed a record, keeping its ID
    pub async fn insert_record(&self, zone_id: &str, record: ExistingRecord) {
        let mut guard = self.inner.write().await;
        guard.records.entry(zone_id.to_string()).or_default().push(record);
    }

    /// Snapshot of a zone's records
    pub async fn records(&self, zone_id: &str) -> Vec<ExistingRecord> {
        let guard = self.inner.read().await;
        guard.records.get(zone_id).cloned().unwrap_or_default()
    }

    fn allocate_id(&self) -> String {
        (self.next_id.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }
}

#[async_trait]
impl DnsProvider for MemoryProvider {
    async fn zone_id(&self, zone_name: &str) -> Result<String, Error> {
        let guard = self.inner.read().await;
        guard
            .ids
            .get(&zone_name.to_lowercase())
            .cloned()
            .ok_or_else(|| Error::not_found(format!("Zone not found: {}", zone_name)))
    }

    async fn list_records(&self, zone_id: &str) -> Result<Vec<ExistingRecord>, Error> {
        let guard = self.inner.read().await;
        guard
            .records
            .get(zone_id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("Zone ID not found: {}", zone_id)))
    }

    async fn create_record(&self, zone_id: &str, record: &RecordSpec) -> Result<String, Error> {
        let mut guard = self.inner.write().await;
        let records = guard
            .records
            .get_mut(zone_id)
            .ok_or_else(|| Error::not_found(format!("Zone ID not found: {}", zone_id)))?;

        let id = self.allocate_id();
        records.push(ExistingRecord::new(
            id.clone(),
            record.record_type.as_str(),
            record.name.clone(),
            record.content.clone(),
        ));
        Ok(id)
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record: &RecordSpec,
    ) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        let existing = guard
            .records
            .get_mut(zone_id)
            .and_then(|records| records.iter_mut().find(|r| r.id == record_id))
            .ok_or_else(|| Error::not_found(format!("DNS record not found: {}", record_id)))?;

        existing.record_type = record.record_type.as_str().to_string();
        existing.name = record.name.clone();
        existing.content = record.content.clone();
        Ok(())
    }

    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        let records = guard
            .records
            .get_mut(zone_id)
            .ok_or_else(|| Error::not_found(format!("Zone ID not found: {}", zone_id)))?;

        let before = records.len();
        records.retain(|r| r.id != record_id);
        if records.len() == before {
            return Err(Error::not_found(format!("DNS record not found: {}", record_id)));
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

/// Factory for creating in-memory providers
pub struct MemoryProviderFactory;

impl DnsProviderFactory for MemoryProviderFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>, Error> {
        match config {
            ProviderConfig::Memory => Ok(Box::new(MemoryProvider::new())),
            _ => Err(Error::config("Invalid config for memory provider")),
        }
    }
}
