//! Configuration types for tsdns
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

use crate::roster::AliasMap;
use crate::zone::ZoneDescriptor;

/// Which reconciliation the engine performs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileMode {
    /// Create or update every desired record
    #[default]
    Sync,
    /// Sync, then delete managed records that are no longer desired
    SyncAndPrune,
    /// Delete every managed address record and stop
    RemoveAll,
}

impl ReconcileMode {
    /// Select the mode from the two flags
    ///
    /// `remove_all` takes precedence over `remove_orphans`.
    pub fn from_flags(remove_all: bool, remove_orphans: bool) -> Self {
        if remove_all {
            ReconcileMode::RemoveAll
        } else if remove_orphans {
            ReconcileMode::SyncAndPrune
        } else {
            ReconcileMode::Sync
        }
    }

    /// Short name for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconcileMode::Sync => "sync",
            ReconcileMode::SyncAndPrune => "sync+prune",
            ReconcileMode::RemoveAll => "remove-all",
        }
    }
}

/// Main run configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Zone, subdomain and tag filter
    pub zone: ZoneDescriptor,

    /// Delete every managed record instead of syncing
    #[serde(default)]
    pub remove_all: bool,

    /// Delete managed records with no matching peer after syncing
    #[serde(default)]
    pub remove_orphans: bool,

    /// Alias specs, `"host=alias1,alias2"`
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl SyncConfig {
    /// Create a configuration for a zone with default flags
    pub fn new(zone: ZoneDescriptor) -> Self {
        Self {
            zone,
            remove_all: false,
            remove_orphans: false,
            aliases: Vec::new(),
        }
    }

    /// Set the remove-all flag
    pub fn with_remove_all(mut self, remove_all: bool) -> Self {
        self.remove_all = remove_all;
        self
    }

    /// Set the remove-orphans flag
    pub fn with_remove_orphans(mut self, remove_orphans: bool) -> Self {
        self.remove_orphans = remove_orphans;
        self
    }

    /// Add an alias spec
    pub fn with_alias(mut self, spec: impl Into<String>) -> Self {
        self.aliases.push(spec.into());
        self
    }

    /// The mode selected by the flags
    pub fn mode(&self) -> ReconcileMode {
        ReconcileMode::from_flags(self.remove_all, self.remove_orphans)
    }

    /// Parsed alias mappings
    pub fn alias_map(&self) -> AliasMap {
        AliasMap::parse(&self.aliases)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.zone.domain.trim().is_empty() {
            return Err(crate::Error::config("Zone is required, e.g. example.com"));
        }
        validate_domain_name(&self.zone.domain)?;

        if let Some(sub) = self.zone.subdomain.as_deref()
            && !sub.is_empty()
        {
            validate_domain_name(sub)?;
        }

        AliasMap::parse_strict(&self.aliases)?;

        Ok(())
    }
}

/// Validate that a string is a syntactically valid domain name
///
/// Basic RFC 1035 checks: length limits, non-empty labels, alphanumeric and
/// hyphen characters, no leading or trailing hyphen.
pub fn validate_domain_name(domain: &str) -> Result<(), crate::Error> {
    if domain.is_empty() {
        return Err(crate::Error::config("Domain name cannot be empty"));
    }

    if domain.len() > 253 {
        return Err(crate::Error::config(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(crate::Error::config(format!(
                "Domain name has empty label: '{}'",
                domain
            )));
        }

        if label.len() > 63 {
            return Err(crate::Error::config(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(crate::Error::config(format!(
                "Domain label contains invalid characters. Label: '{}'",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(crate::Error::config(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}

/// DNS provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Cloudflare provider
    Cloudflare {
        /// Cloudflare API token
        api_token: String,
        /// Zone ID (optional, looked up by zone name otherwise)
        zone_id: Option<String>,
        /// Log intended changes instead of making them
        #[serde(default)]
        dry_run: bool,
    },

    /// In-memory provider (starts empty, nothing persists)
    Memory,

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Cloudflare { api_token, .. } => {
                if api_token.is_empty() {
                    return Err(crate::Error::config("Cloudflare API token cannot be empty"));
                }
                Ok(())
            }
            ProviderConfig::Memory => Ok(()),
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Cloudflare { .. } => "cloudflare",
            ProviderConfig::Memory => "memory",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Cloudflare {
            api_token: String::new(),
            zone_id: None,
            dry_run: false,
        }
    }
}

/// Peer source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PeerSourceConfig {
    /// Run `tailscale status --json`
    Tailscale {
        /// Path to the tailscale binary (defaults to `tailscale` on PATH)
        binary: Option<String>,
    },

    /// Read `tailscale status --json` output from a file
    File {
        /// Path to the status file
        path: String,
    },

    /// Custom peer source
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl PeerSourceConfig {
    /// Validate the peer source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            PeerSourceConfig::Tailscale { binary } => {
                if binary.as_deref().is_some_and(str::is_empty) {
                    return Err(crate::Error::config("Tailscale binary path cannot be empty"));
                }
                Ok(())
            }
            PeerSourceConfig::File { path } => {
                if path.is_empty() {
                    return Err(crate::Error::config("Status file path cannot be empty"));
                }
                Ok(())
            }
            PeerSourceConfig::Custom { factory, .. } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom peer source factory cannot be empty",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the peer source type name
    pub fn type_name(&self) -> &str {
        match self {
            PeerSourceConfig::Tailscale { .. } => "tailscale",
            PeerSourceConfig::File { .. } => "file",
            PeerSourceConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for PeerSourceConfig {
    fn default() -> Self {
        PeerSourceConfig::Tailscale { binary: None }
    }
}
