//! Core sync engine
//!
//! The SyncEngine is responsible for one reconciliation pass:
//! - Reading the roster via PeerSource
//! - Assembling desired records (sanitization, tag filter, aliases)
//! - Resolving the zone and listing its records via DnsProvider
//! - Applying creates, updates and deletes for the selected mode
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐
//! │ PeerSource  │─── PeerSnapshot ────┐
//! └─────────────┘                     │
//!                                     ▼
//!                            ┌──────────────┐
//!                            │  SyncEngine  │
//!                            └──────────────┘
//!                                     │
//!         ┌───────────────────────────┼───────────────────────────┐
//!         │                           │                           │
//!         ▼                           ▼                           ▼
//! ┌─────────────┐           ┌──────────────┐           ┌─────────────┐
//! │   roster    │           │  reconcile   │           │ DnsProvider │
//! │ (assemble)  │           │   (diff)     │           │  (apply)    │
//! └─────────────┘           └──────────────┘           └─────────────┘
//! ```
//!
//! ## Run Flow
//!
//! 1. Read the peer snapshot
//! 2. Assemble desired records (skipped for remove-all)
//! 3. Look up the zone ID and list current records
//! 4. Reconcile; the first provider failure stops the run
//!
//! Every step is awaited before the next one starts. Steps 1-3 never
//! mutate anything, so a failure there leaves the zone untouched.

pub mod reconcile;

pub use reconcile::reconcile;

use std::fmt;
use tracing::{debug, info};

use crate::config::{ReconcileMode, SyncConfig};
use crate::error::{Error, ReconcileError};
use crate::roster::{self, DesiredRecord};
use crate::traits::{DnsProvider, PeerSource};

/// One change applied to the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Record was created
    Created {
        id: String,
        record_type: String,
        name: String,
        content: String,
    },

    /// Existing record was overwritten
    Updated {
        id: String,
        record_type: String,
        name: String,
        content: String,
    },

    /// Record was deleted
    Deleted {
        id: String,
        record_type: String,
        name: String,
        content: String,
    },
}

impl Action {
    /// Provider record ID
    pub fn id(&self) -> &str {
        match self {
            Action::Created { id, .. }
            | Action::Updated { id, .. }
            | Action::Deleted { id, .. } => id,
        }
    }

    /// Fully-qualified record name
    pub fn name(&self) -> &str {
        match self {
            Action::Created { name, .. }
            | Action::Updated { name, .. }
            | Action::Deleted { name, .. } => name,
        }
    }

    /// Past-tense verb for logs
    pub fn verb(&self) -> &'static str {
        match self {
            Action::Created { .. } => "created",
            Action::Updated { .. } => "updated",
            Action::Deleted { .. } => "removed",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (record_type, name, content) = match self {
            Action::Created { record_type, name, content, .. }
            | Action::Updated { record_type, name, content, .. }
            | Action::Deleted { record_type, name, content, .. } => (record_type, name, content),
        };
        write!(
            f,
            "{} dns record type {}, host {}, ip {}",
            self.verb(),
            record_type,
            name,
            content
        )
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Mode that ran
    pub mode: ReconcileMode,
    /// Number of desired records after assembly
    pub desired: usize,
    /// Changes made, in order
    pub actions: Vec<Action>,
}

impl RunReport {
    /// Count of actions matching `verb` ("created", "updated", "removed")
    pub fn count(&self, verb: &str) -> usize {
        self.actions.iter().filter(|a| a.verb() == verb).count()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} desired, {} created, {} updated, {} removed",
            self.mode.as_str(),
            self.desired,
            self.count("created"),
            self.count("updated"),
            self.count("removed")
        )
    }
}

/// Why a run stopped
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Failed before any change was made (config, roster, zone lookup, listing)
    #[error(transparent)]
    Setup(#[from] Error),

    /// Failed while applying changes
    #[error(transparent)]
    Apply(#[from] ReconcileError),
}

impl RunError {
    /// Changes made before the failure (empty for setup failures)
    pub fn applied(&self) -> &[Action] {
        match self {
            RunError::Setup(_) => &[],
            RunError::Apply(e) => &e.applied,
        }
    }
}

/// Core sync engine
///
/// Holds the configuration, the peer source and the provider for one or
/// more sequential runs. Nothing is cached between runs.
pub struct SyncEngine {
    /// Source of the tailnet roster
    peer_source: Box<dyn PeerSource>,

    /// DNS provider for listing and changing records
    provider: Box<dyn DnsProvider>,

    /// Zone, flags and aliases
    config: SyncConfig,
}

impl SyncEngine {
    /// Create a new engine
    ///
    /// # Parameters
    ///
    /// - `peer_source`: Peer source implementation
    /// - `provider`: DNS provider implementation
    /// - `config`: Run configuration (validated here)
    pub fn new(
        peer_source: Box<dyn PeerSource>,
        provider: Box<dyn DnsProvider>,
        config: SyncConfig,
    ) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self {
            peer_source,
            provider,
            config,
        })
    }

    /// The configuration this engine runs with
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Build the desired records from the current roster
    pub async fn desired_records(&self) -> Result<Vec<DesiredRecord>, Error> {
        let snapshot = self.peer_source.snapshot().await.map_err(|e| match e {
            Error::PeerSource(_) => e,
            other => Error::peer_source(format!(
                "{} status unavailable: {}",
                self.peer_source.source_name(),
                other
            )),
        })?;
        debug!(
            "Roster from {}: self {} and {} peer(s)",
            self.peer_source.source_name(),
            snapshot.self_peer.host_name,
            snapshot.peers.len()
        );

        let hosts = roster::assemble(
            &snapshot,
            self.config.zone.tag.as_deref(),
            &self.config.alias_map(),
        );
        Ok(roster::desired_records(&self.config.zone, &hosts))
    }

    /// Run one reconciliation pass
    ///
    /// # Returns
    ///
    /// - `Ok(RunReport)`: Every change was applied
    /// - `Err(RunError::Setup)`: Nothing was changed
    /// - `Err(RunError::Apply)`: Stopped part-way; see [`RunError::applied`]
    pub async fn run(&self) -> Result<RunReport, RunError> {
        let mode = self.config.mode();
        let suffix = self.config.zone.managed_suffix();
        info!(
            "Running {} for records under {} via {}",
            mode.as_str(),
            suffix,
            self.provider.provider_name()
        );

        // The roster is read even for remove-all so the run order stays fixed.
        let desired = self.desired_records().await?;

        let zone_id = self.provider.zone_id(&self.config.zone.domain).await?;
        let current = self.provider.list_records(&zone_id).await?;
        debug!("Zone {} has {} record(s)", self.config.zone.domain, current.len());

        let desired_count = match mode {
            ReconcileMode::RemoveAll => 0,
            _ => desired.len(),
        };

        let actions = reconcile(
            mode,
            &zone_id,
            &suffix,
            &desired,
            &current,
            self.provider.as_ref(),
        )
        .await?;

        Ok(RunReport {
            mode,
            desired: desired_count,
            actions,
        })
    }
}
