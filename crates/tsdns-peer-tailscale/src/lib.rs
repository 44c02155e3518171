// # Tailscale Peer Source
//
// This crate reads the tailnet roster for tsdns from the local Tailscale
// node.
//
// ## Sources
//
// - `TailscaleCliSource`: runs `tailscale status --json` once per snapshot
// - `StatusFileSource`: reads previously captured `tailscale status --json`
//   output from a file (offline runs, CI)
//
// Both parse the same document. Only the fields the roster needs are read:
// `Self` and `Peer` entries with `HostName`, `TailscaleIPs`, `Online` and
// `Tags`. Peers are returned in node-key order.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

use tsdns_core::ProviderRegistry;
use tsdns_core::config::PeerSourceConfig;
use tsdns_core::traits::{Peer, PeerSnapshot, PeerSource, PeerSourceFactory};

/// Binary used when none is configured
pub const DEFAULT_BINARY: &str = "tailscale";

/// Upper bound on one `tailscale status` invocation
const STATUS_TIMEOUT: Duration = Duration::from_secs(30);

/// Failures reading the roster
#[derive(Debug, Error)]
pub enum TailscaleError {
    #[error("failed to run {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{binary} status exited with {status}: {stderr}")]
    Exit {
        binary: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("{binary} status timed out after {}s", .timeout.as_secs())]
    Timeout { binary: String, timeout: Duration },

    #[error("failed to read status file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed status JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("status has no Self node")]
    MissingSelf,
}

impl From<TailscaleError> for tsdns_core::Error {
    fn from(err: TailscaleError) -> Self {
        tsdns_core::Error::peer_source(err.to_string())
    }
}

/// `tailscale status --json`, reduced to what the roster needs
#[derive(Debug, Deserialize)]
struct Status {
    #[serde(rename = "Self")]
    self_node: Option<NodeStatus>,
    #[serde(rename = "Peer", default)]
    peers: Option<BTreeMap<String, NodeStatus>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NodeStatus {
    #[serde(default)]
    host_name: String,
    #[serde(rename = "TailscaleIPs", default)]
    tailscale_ips: Option<Vec<IpAddr>>,
    #[serde(default)]
    online: bool,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

impl NodeStatus {
    fn into_peer(self) -> Peer {
        Peer {
            host_name: self.host_name,
            addresses: self.tailscale_ips.unwrap_or_default(),
            online: self.online,
            tags: self.tags.unwrap_or_default().into_iter().collect::<BTreeSet<_>>(),
        }
    }
}

/// Parse `tailscale status --json` output into a snapshot
pub fn parse_status(json: &[u8]) -> Result<PeerSnapshot, TailscaleError> {
    let status: Status = serde_json::from_slice(json)?;
    let self_peer = status.self_node.ok_or(TailscaleError::MissingSelf)?.into_peer();
    let peers = status
        .peers
        .unwrap_or_default()
        .into_values()
        .map(NodeStatus::into_peer)
        .collect();

    Ok(PeerSnapshot::new(self_peer, peers))
}

/// Peer source that shells out to the Tailscale CLI
#[derive(Debug, Clone)]
pub struct TailscaleCliSource {
    binary: String,
}

impl TailscaleCliSource {
    /// Create a source using `binary` (or `tailscale` on PATH)
    pub fn new(binary: Option<String>) -> Self {
        Self {
            binary: binary.unwrap_or_else(|| DEFAULT_BINARY.to_string()),
        }
    }

    async fn read_status(&self) -> Result<PeerSnapshot, TailscaleError> {
        tracing::debug!("Running {} status --json", self.binary);

        let output = Command::new(&self.binary)
            .args(["status", "--json"])
            .kill_on_drop(true)
            .output();
        let output = tokio::time::timeout(STATUS_TIMEOUT, output)
            .await
            .map_err(|_| TailscaleError::Timeout {
                binary: self.binary.clone(),
                timeout: STATUS_TIMEOUT,
            })?
            .map_err(|source| TailscaleError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(TailscaleError::Exit {
                binary: self.binary.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_status(&output.stdout)
    }
}

#[async_trait]
impl PeerSource for TailscaleCliSource {
    async fn snapshot(&self) -> tsdns_core::Result<PeerSnapshot> {
        Ok(self.read_status().await?)
    }

    fn source_name(&self) -> &'static str {
        "tailscale"
    }
}

/// Peer source that reads captured status JSON from disk
#[derive(Debug, Clone)]
pub struct StatusFileSource {
    path: PathBuf,
}

impl StatusFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_status(&self) -> Result<PeerSnapshot, TailscaleError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| TailscaleError::Read {
                path: self.path.clone(),
                source,
            })?;
        parse_status(&bytes)
    }
}

#[async_trait]
impl PeerSource for StatusFileSource {
    async fn snapshot(&self) -> tsdns_core::Result<PeerSnapshot> {
        Ok(self.read_status().await?)
    }

    fn source_name(&self) -> &'static str {
        "file"
    }
}

/// Factory for [`TailscaleCliSource`]
pub struct TailscaleCliFactory;

impl PeerSourceFactory for TailscaleCliFactory {
    fn create(&self, config: &PeerSourceConfig) -> tsdns_core::Result<Box<dyn PeerSource>> {
        match config {
            PeerSourceConfig::Tailscale { binary } => {
                Ok(Box::new(TailscaleCliSource::new(binary.clone())))
            }
            _ => Err(tsdns_core::Error::config("Invalid config for tailscale peer source")),
        }
    }
}

/// Factory for [`StatusFileSource`]
pub struct StatusFileFactory;

impl PeerSourceFactory for StatusFileFactory {
    fn create(&self, config: &PeerSourceConfig) -> tsdns_core::Result<Box<dyn PeerSource>> {
        match config {
            PeerSourceConfig::File { path } => Ok(Box::new(StatusFileSource::new(path))),
            _ => Err(tsdns_core::Error::config("Invalid config for status file peer source")),
        }
    }
}

/// Register the `tailscale` and `file` peer sources with a registry
pub fn register(registry: &ProviderRegistry) {
    registry.register_peer_source("tailscale", Box::new(TailscaleCliFactory));
    registry.register_peer_source("file", Box::new(StatusFileFactory));
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const STATUS: &str = r#"{
        "Version": "1.70.0",
        "BackendState": "Running",
        "Self": {
            "ID": "n1",
            "HostName": "gateway",
            "DNSName": "gateway.tail1234.ts.net.",
            "TailscaleIPs": ["100.64.0.1", "fd7a:115c:a1e0::1"],
            "Online": true
        },
        "Peer": {
            "nodekey:bb": {
                "HostName": "Build Box",
                "TailscaleIPs": ["100.64.0.3"],
                "Online": false,
                "Tags": null
            },
            "nodekey:aa": {
                "HostName": "db",
                "TailscaleIPs": ["100.64.0.2"],
                "Online": true,
                "Tags": ["tag:prod", "tag:db"]
            }
        }
    }"#;

    #[test]
    fn test_parse_status() {
        let snapshot = parse_status(STATUS.as_bytes()).unwrap();

        assert_eq!(snapshot.self_peer.host_name, "gateway");
        assert_eq!(snapshot.self_peer.addresses.len(), 2);

        let names: Vec<&str> = snapshot.peers.iter().map(|p| p.host_name.as_str()).collect();
        assert_eq!(names, vec!["db", "Build Box"]);

        let db = &snapshot.peers[0];
        assert!(db.online);
        assert!(db.tags.contains("tag:prod"));

        let build = &snapshot.peers[1];
        assert!(!build.online);
        assert!(build.tags.is_empty());
    }

    #[test]
    fn test_parse_status_without_peers() {
        let snapshot = parse_status(
            br#"{"Self": {"HostName": "solo", "TailscaleIPs": ["100.64.0.9"]}, "Peer": null}"#,
        )
        .unwrap();

        assert_eq!(snapshot.self_peer.host_name, "solo");
        assert!(snapshot.peers.is_empty());
    }

    #[test]
    fn test_parse_status_errors() {
        assert!(matches!(
            parse_status(br#"{"Peer": {}}"#),
            Err(TailscaleError::MissingSelf)
        ));
        assert!(matches!(
            parse_status(br#"{"Self": {"TailscaleIPs": ["not-an-ip"]}}"#),
            Err(TailscaleError::Parse(_))
        ));
        assert!(matches!(parse_status(b"tailscaled not running"), Err(TailscaleError::Parse(_))));
    }

    #[tokio::test]
    async fn test_status_file_source() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("status.json");
        tokio::fs::write(&path, STATUS).await.unwrap();

        let source = StatusFileSource::new(&path);
        let snapshot = source.snapshot().await.unwrap();
        assert_eq!(snapshot.peers.len(), 2);
        assert_eq!(source.source_name(), "file");
    }

    #[tokio::test]
    async fn test_missing_status_file_is_peer_source_error() {
        let dir = tempdir().unwrap();
        let source = StatusFileSource::new(dir.path().join("absent.json"));

        let err = source.snapshot().await.unwrap_err();
        assert!(matches!(err, tsdns_core::Error::PeerSource(_)));
        assert!(err.to_string().contains("absent.json"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_peer_source_error() {
        let source = TailscaleCliSource::new(Some("/nonexistent/tailscale".to_string()));

        let err = source.snapshot().await.unwrap_err();
        assert!(matches!(err, tsdns_core::Error::PeerSource(_)));
        assert!(err.to_string().contains("/nonexistent/tailscale"));
    }

    #[test]
    fn test_register() {
        let registry = ProviderRegistry::new();
        register(&registry);

        assert_eq!(registry.list_peer_sources(), vec!["file", "tailscale"]);

        let source = registry
            .create_peer_source(&PeerSourceConfig::Tailscale { binary: None })
            .unwrap();
        assert_eq!(source.source_name(), "tailscale");

        let source = registry
            .create_peer_source(&PeerSourceConfig::File {
                path: "/tmp/status.json".to_string(),
            })
            .unwrap();
        assert_eq!(source.source_name(), "file");
    }

    #[test]
    fn test_factory_rejects_other_config() {
        assert!(TailscaleCliFactory
            .create(&PeerSourceConfig::File { path: "x".to_string() })
            .is_err());
        assert!(StatusFileFactory
            .create(&PeerSourceConfig::Tailscale { binary: None })
            .is_err());
    }
}
