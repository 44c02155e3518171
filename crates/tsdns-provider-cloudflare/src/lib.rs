// # Cloudflare DNS Provider
//
// This crate provides the Cloudflare API v4 implementation of the
// `DnsProvider` trait used by the tsdns reconciler.
//
// ## Behavior
//
// - One HTTP request per trait call, except listing, which follows
//   `result_info.total_pages` until every page has been read
// - HTTP timeout of 30 seconds
// - Status codes mapped to errors (401/403, 404, 409, 429, 5xx); every
//   failure is returned to the reconciler, which stops the run
// - No retries, no caching between calls
// - Dry-run mode: GET requests are made, changes are only logged
//
// ## Security Requirements
//
// - API token NEVER appears in logs or `Debug` output
// - Provider fails at construction if the token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List Zones: GET `/zones?name=...`
// - List DNS Records: GET `/zones/:zone_id/dns_records?page=..&per_page=..`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`
// - Delete DNS Record: DELETE `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tsdns_core::config::ProviderConfig;
use tsdns_core::traits::{DnsProvider, DnsProviderFactory, ExistingRecord, RecordSpec};
use tsdns_core::{Error, Result};

/// Cloudflare API base URL
const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Records requested per listing page
const PAGE_SIZE: u32 = 100;

/// Environment variable that switches the provider to dry-run
pub const MODE_ENV: &str = "TSDNS_MODE";

const PROVIDER: &str = "cloudflare";

/// Response envelope shared by every Cloudflare v4 endpoint
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResultInfo {
    #[serde(default)]
    total_pages: u32,
}

#[derive(Debug, Deserialize)]
struct Zone {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CreatedRecord {
    id: String,
}

impl<T> Envelope<T> {
    /// The `result` payload, or the API's own error list
    fn into_result(self, context: &str) -> Result<T> {
        if !self.success {
            let detail = self
                .errors
                .iter()
                .map(|e| format!("{} (code {})", e.message, e.code))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(Error::provider(
                PROVIDER,
                format!("{} rejected: {}", context, detail),
            ));
        }
        self.result.ok_or_else(|| {
            Error::provider(PROVIDER, format!("{}: response has no result", context))
        })
    }
}

/// Cloudflare DNS provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests (zone lookup, record listing)
/// - Log the intended POST/PUT/DELETE request
/// - **NOT** actually modify DNS records
///
/// Creates return synthetic IDs of the form `dry-run-N`.
pub struct CloudflareProvider {
    /// Cloudflare API token
    api_token: String,

    /// Zone ID (optional, looked up by zone name otherwise)
    zone_id: Option<String>,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// API root, overridable for tests
    base_url: String,

    /// Dry-run mode: if true, perform GET requests but skip changes
    dry_run: bool,

    /// Counter for synthetic dry-run IDs
    dry_run_ids: AtomicU64,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("zone_id", &self.zone_id)
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    /// - `zone_id`: Optional zone ID (skips the zone lookup)
    /// - `dry_run`: If true, perform GET requests but skip changes
    ///
    /// # Errors
    ///
    /// `Error::Config` if the token is empty, `Error::Http` if the HTTP
    /// client cannot be built.
    pub fn new(
        api_token: impl Into<String>,
        zone_id: Option<String>,
        dry_run: bool,
    ) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            zone_id: zone_id.filter(|id| !id.is_empty()),
            client,
            base_url: CLOUDFLARE_API_BASE.to_string(),
            dry_run,
            dry_run_ids: AtomicU64::new(0),
        })
    }

    /// Point the provider at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Whether changes are only logged
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn records_url(&self, zone_id: &str) -> String {
        format!("{}/zones/{}/dns_records", self.base_url, zone_id)
    }

    fn record_url(&self, zone_id: &str, record_id: &str) -> String {
        format!("{}/zones/{}/dns_records/{}", self.base_url, zone_id, record_id)
    }

    /// Send a request and decode the envelope
    ///
    /// `context` names the operation in error messages; `subject` is what a
    /// 404 refers to.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
        subject: &str,
    ) -> Result<Envelope<T>> {
        let response = request
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(status_error(status, context, subject, &error_text));
        }

        response
            .json()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("Failed to parse response: {}", e)))
    }
}

/// Map a non-success HTTP status to an error
fn status_error(status: reqwest::StatusCode, context: &str, subject: &str, body: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::provider(
            PROVIDER,
            format!(
                "Authentication failed: Invalid API token or insufficient permissions. Status: {}",
                status
            ),
        ),
        404 => Error::not_found(format!("{} not found", subject)),
        409 => Error::provider(
            PROVIDER,
            format!("Conflict: {} already changed. Status: {}", subject, status),
        ),
        429 => Error::provider(
            PROVIDER,
            format!("Rate limit exceeded. Status: {}", status),
        ),
        500..=599 => Error::provider(
            PROVIDER,
            format!("Cloudflare server error (transient): {} - {}", status, body),
        ),
        _ => Error::provider(PROVIDER, format!("{} failed: {} - {}", context, status, body)),
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    /// Resolve the zone ID
    ///
    /// If a zone ID was configured, returns it without an API call.
    ///
    /// ```http
    /// GET /zones?name=example.com
    /// Authorization: Bearer <token>
    /// ```
    async fn zone_id(&self, zone_name: &str) -> Result<String> {
        if let Some(ref zone_id) = self.zone_id {
            tracing::debug!("Using pre-configured zone ID");
            return Ok(zone_id.clone());
        }

        tracing::debug!("Looking up zone ID for {}", zone_name);
        let request = self
            .client
            .get(format!("{}/zones", self.base_url))
            .query(&[("name", zone_name)]);
        let zones: Vec<Zone> = self
            .send(request, "Zone lookup", &format!("Zone {}", zone_name))
            .await?
            .into_result("Zone lookup")?;

        let zone = zones
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("Zone not found: {}", zone_name)))?;

        tracing::debug!("Found zone ID: {}", zone.id);
        Ok(zone.id)
    }

    /// List every record, one page at a time
    async fn list_records(&self, zone_id: &str) -> Result<Vec<ExistingRecord>> {
        let mut records = Vec::new();
        let mut page: u32 = 1;

        loop {
            let request = self.client.get(self.records_url(zone_id)).query(&[
                ("page", page.to_string()),
                ("per_page", PAGE_SIZE.to_string()),
            ]);
            let envelope: Envelope<Vec<ExistingRecord>> = self
                .send(request, "Record listing", &format!("Zone ID {}", zone_id))
                .await?;
            let total_pages = envelope
                .result_info
                .as_ref()
                .map(|info| info.total_pages)
                .unwrap_or(1);
            records.extend(envelope.into_result("Record listing")?);

            if page >= total_pages {
                break;
            }
            page += 1;
        }

        tracing::debug!("Listed {} record(s) in zone {}", records.len(), zone_id);
        Ok(records)
    }

    async fn create_record(&self, zone_id: &str, record: &RecordSpec) -> Result<String> {
        let url = self.records_url(zone_id);

        if self.dry_run {
            let id = format!("dry-run-{}", self.dry_run_ids.fetch_add(1, Ordering::SeqCst) + 1);
            tracing::info!(
                "[DRY-RUN] Would send POST request to {} with payload: {}",
                url,
                serde_json::to_string(record)?
            );
            return Ok(id);
        }

        let request = self.client.post(&url).json(record);
        let created: CreatedRecord = self
            .send(request, "Record creation", &format!("Zone ID {}", zone_id))
            .await?
            .into_result("Record creation")?;
        Ok(created.id)
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record: &RecordSpec,
    ) -> Result<()> {
        let url = self.record_url(zone_id, record_id);

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PUT request to {} with payload: {}",
                url,
                serde_json::to_string(record)?
            );
            return Ok(());
        }

        let request = self.client.put(&url).json(record);
        let subject = format!("DNS record {}", record_id);
        self.send::<serde_json::Value>(request, "Record update", &subject)
            .await?
            .into_result("Record update")?;
        Ok(())
    }

    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<()> {
        let url = self.record_url(zone_id, record_id);

        if self.dry_run {
            tracing::info!("[DRY-RUN] Would send DELETE request to {}", url);
            return Ok(());
        }

        let request = self.client.delete(&url);
        let subject = format!("DNS record {}", record_id);
        self.send::<serde_json::Value>(request, "Record deletion", &subject)
            .await?
            .into_result("Record deletion")?;
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Whether dry-run was requested by config or by `TSDNS_MODE`
fn dry_run_requested(configured: bool, mode: Option<&str>) -> bool {
    configured || mode.is_some_and(|m| m.trim().eq_ignore_ascii_case("dry-run"))
}

/// Factory for creating Cloudflare providers
pub struct CloudflareFactory;

impl DnsProviderFactory for CloudflareFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::Cloudflare {
                api_token,
                zone_id,
                dry_run,
            } => {
                let mode = std::env::var(MODE_ENV).ok();
                let dry_run = dry_run_requested(*dry_run, mode.as_deref());

                if dry_run {
                    tracing::warn!(
                        "Cloudflare provider running in DRY-RUN mode - no changes will be made"
                    );
                }

                Ok(Box::new(CloudflareProvider::new(
                    api_token.clone(),
                    zone_id.clone(),
                    dry_run,
                )?))
            }
            _ => Err(Error::config("Invalid config for Cloudflare provider")),
        }
    }
}

/// Register the Cloudflare provider with a registry
///
/// # Example
///
/// ```rust
/// use tsdns_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::new();
/// tsdns_provider_cloudflare::register(&registry);
/// assert!(registry.has_provider("cloudflare"));
/// ```
pub fn register(registry: &tsdns_core::ProviderRegistry) {
    registry.register_provider(PROVIDER, Box::new(CloudflareFactory));
}
