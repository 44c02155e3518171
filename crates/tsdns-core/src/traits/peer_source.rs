// # Peer Source Trait
//
// Defines the interface for reading the tailnet roster once per run.
//
// ## Implementations
//
// - Tailscale CLI / status file: `tsdns-peer-tailscale` crate
//
// ## Usage
//
// ```rust,ignore
// use tsdns_core::PeerSource;
//
// #[tokio::main]
// async fn main() -> Result<(), Box<dyn std::error::Error>> {
//     let source = /* PeerSource implementation */;
//
//     let snapshot = source.snapshot().await?;
//     println!("{} peers besides {}", snapshot.peers.len(), snapshot.self_peer.host_name);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::net::IpAddr;

/// One node of the tailnet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    /// Host name as reported by the node (may contain spaces)
    pub host_name: String,
    /// Tailnet addresses of the node
    pub addresses: Vec<IpAddr>,
    /// Whether the node is currently online
    pub online: bool,
    /// ACL tags of the node
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl Peer {
    /// Create an online peer without tags
    pub fn new(host_name: impl Into<String>, addresses: Vec<IpAddr>) -> Self {
        Self {
            host_name: host_name.into(),
            addresses,
            online: true,
            tags: BTreeSet::new(),
        }
    }

    /// Set the online flag
    pub fn with_online(mut self, online: bool) -> Self {
        self.online = online;
        self
    }

    /// Add a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }
}

/// Roster read from the peer source for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerSnapshot {
    /// The local node
    pub self_peer: Peer,
    /// Every other node, in source order
    pub peers: Vec<Peer>,
}

impl PeerSnapshot {
    /// Create a snapshot
    pub fn new(self_peer: Peer, peers: Vec<Peer>) -> Self {
        Self { self_peer, peers }
    }
}

/// Trait for peer-status sources
///
/// A source is read exactly once per run, before any provider call. A
/// failure aborts the run; no partial roster is acted upon.
#[async_trait]
pub trait PeerSource: Send + Sync {
    /// Read the current roster
    ///
    /// # Returns
    ///
    /// - `Ok(PeerSnapshot)`: Self and peers
    /// - `Err(Error)`: If the roster could not be retrieved
    async fn snapshot(&self) -> Result<PeerSnapshot, crate::Error>;

    /// Source name for logging
    fn source_name(&self) -> &'static str;
}

/// Helper trait for constructing peer sources from configuration
pub trait PeerSourceFactory: Send + Sync {
    /// Create a PeerSource instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Configuration specific to this peer source type
    ///
    /// # Returns
    ///
    /// A boxed PeerSource trait object
    fn create(
        &self,
        config: &crate::config::PeerSourceConfig,
    ) -> Result<Box<dyn PeerSource>, crate::Error>;
}
