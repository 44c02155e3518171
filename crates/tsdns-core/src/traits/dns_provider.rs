// # DNS Provider Trait
//
// Defines the gateway the reconciler uses to read and change records held
// by an authoritative DNS provider.
//
// ## Implementations
//
// - Cloudflare: `tsdns-provider-cloudflare` crate
// - In-memory: `tsdns_core::provider::MemoryProvider` (tests)
//
// ## Usage
//
// ```rust,ignore
// use tsdns_core::traits::{DnsProvider, RecordSpec};
// use tsdns_core::zone::RecordType;
//
// #[tokio::main]
// async fn main() -> Result<(), Box<dyn std::error::Error>> {
//     let provider = /* DnsProvider implementation */;
//
//     let zone_id = provider.zone_id("example.com").await?;
//     let spec = RecordSpec::auto_ttl(RecordType::A, "host1.wg.example.com", "10.0.0.1");
//     let id = provider.create_record(&zone_id, &spec).await?;
//     provider.delete_record(&zone_id, &id).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::zone::{AUTO_TTL, RecordType, record_key};

/// A record as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingRecord {
    /// The record ID (provider-specific)
    pub id: String,
    /// The record type as the provider spells it (A, AAAA, TXT, ...)
    #[serde(rename = "type")]
    pub record_type: String,
    /// Fully-qualified record name
    pub name: String,
    /// Record content (an address string for A/AAAA)
    pub content: String,
}

impl ExistingRecord {
    /// Create a new existing record
    pub fn new(
        id: impl Into<String>,
        record_type: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            record_type: record_type.into(),
            name: name.into(),
            content: content.into(),
        }
    }

    /// Lookup key, `lowercase(type + name)`
    pub fn key(&self) -> String {
        record_key(&self.record_type, &self.name)
    }

    /// Whether this is an A or AAAA record
    pub fn is_address(&self) -> bool {
        RecordType::parse(&self.record_type).is_some()
    }
}

/// Payload for creating or updating a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSpec {
    /// Record type
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// Fully-qualified record name
    pub name: String,
    /// Address string
    pub content: String,
    /// TTL; [`AUTO_TTL`] lets the provider choose
    pub ttl: u32,
}

impl RecordSpec {
    /// Build a payload carrying the automatic TTL sentinel
    pub fn auto_ttl(
        record_type: RecordType,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            record_type,
            name: name.into(),
            content: content.into(),
            ttl: AUTO_TTL,
        }
    }
}

/// Trait for DNS provider implementations
///
/// Every method is a single provider call. Implementations report failures
/// and never retry; the reconciler treats any error as fatal to the run.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so they can be boxed and held by
/// the engine, even though the engine calls them sequentially.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Resolve a zone name (e.g. "example.com") to the provider's zone ID
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The zone ID
    /// - `Err(Error::NotFound)`: If the provider has no such zone
    async fn zone_id(&self, zone_name: &str) -> Result<String, crate::Error>;

    /// List every record in a zone
    async fn list_records(&self, zone_id: &str) -> Result<Vec<ExistingRecord>, crate::Error>;

    /// Create a record
    ///
    /// # Returns
    ///
    /// The ID the provider assigned to the new record
    async fn create_record(&self, zone_id: &str, record: &RecordSpec)
    -> Result<String, crate::Error>;

    /// Overwrite the record `record_id` with `record`
    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record: &RecordSpec,
    ) -> Result<(), crate::Error>;

    /// Delete the record `record_id`
    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    ///
    /// # Returns
    ///
    /// A static string identifying the provider (e.g., "cloudflare", "memory")
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from configuration
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Configuration specific to this provider
    ///
    /// # Returns
    ///
    /// A boxed DnsProvider trait object
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn DnsProvider>, crate::Error>;
}
