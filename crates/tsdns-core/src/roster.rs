//! Roster assembly
//!
//! Turns a [`PeerSnapshot`] plus alias mappings into the flat list of
//! (host name, address) pairs that should be published, and from there into
//! fully-qualified [`DesiredRecord`]s.

use std::collections::HashMap;
use std::net::IpAddr;
use tracing::debug;

use crate::error::{Error, Result};
use crate::traits::{Peer, PeerSnapshot};
use crate::zone::{RecordType, ZoneDescriptor, record_key};

/// One (host name, address) pair to publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredHost {
    /// Sanitized host name (not yet qualified)
    pub name: String,
    /// Address to publish
    pub ip: IpAddr,
}

impl DesiredHost {
    /// Create a desired host; the name is sanitized
    pub fn new(name: &str, ip: IpAddr) -> Self {
        Self {
            name: sanitize_host(name),
            ip,
        }
    }

    /// A for IPv4, AAAA for IPv6
    pub fn record_type(&self) -> RecordType {
        RecordType::for_ip(&self.ip)
    }
}

/// A fully-qualified record that should exist after the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredRecord {
    /// Record type
    pub record_type: RecordType,
    /// Fully-qualified lower-cased name
    pub name: String,
    /// Address to publish
    pub ip: IpAddr,
}

impl DesiredRecord {
    /// Lookup key, `lowercase(type + name)`
    pub fn key(&self) -> String {
        record_key(self.record_type.as_str(), &self.name)
    }
}

/// Replace every space in a host name with a hyphen
pub fn sanitize_host(name: &str) -> String {
    name.replace(' ', "-")
}

/// Alias mappings: source host name -> alias names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    inner: HashMap<String, Vec<String>>,
}

impl AliasMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `"host=alias1,alias2"` specs
    ///
    /// Specs without `=` are skipped. A later spec for the same host
    /// replaces an earlier one. Empty alias names are dropped.
    pub fn parse<S: AsRef<str>>(specs: &[S]) -> Self {
        let mut map = Self::new();
        for spec in specs {
            let Some((host, aliases)) = spec.as_ref().split_once('=') else {
                continue;
            };
            let aliases: Vec<String> = aliases
                .split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .collect();
            if !aliases.is_empty() {
                map.insert(host.trim(), aliases);
            }
        }
        map
    }

    /// Parse specs, rejecting malformed ones
    pub fn parse_strict<S: AsRef<str>>(specs: &[S]) -> Result<Self> {
        for spec in specs {
            let spec = spec.as_ref();
            match spec.split_once('=') {
                Some((host, _)) if !host.trim().is_empty() => {}
                _ => {
                    return Err(Error::config(format!(
                        "invalid alias '{}', expected host=alias1,alias2",
                        spec
                    )));
                }
            }
        }
        Ok(Self::parse(specs))
    }

    /// Set the aliases of `host`
    pub fn insert(&mut self, host: impl Into<String>, aliases: Vec<String>) {
        self.inner.insert(host.into(), aliases);
    }

    /// Aliases of `host`, if any
    pub fn get(&self, host: &str) -> Option<&[String]> {
        self.inner.get(host).map(Vec::as_slice)
    }

    /// Number of mapped hosts
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether no host is mapped
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Whether a remote peer passes the online and tag checks
fn include_peer(peer: &Peer, tag_filter: Option<&str>) -> bool {
    if !peer.online {
        debug!("Peer {} is offline, skipping", peer.host_name);
        return false;
    }

    match tag_filter {
        Some(tag) if !tag.is_empty() => {
            if peer.tags.contains(tag) {
                debug!("Peer {} has tag {}", peer.host_name, tag);
                true
            } else {
                debug!("Peer {} lacks tag {}, skipping", peer.host_name, tag);
                false
            }
        }
        _ => true,
    }
}

/// Build the list of hosts to publish
///
/// Order is deterministic: self, then peers in snapshot order, then
/// aliases in host order.
pub fn assemble(
    snapshot: &PeerSnapshot,
    tag_filter: Option<&str>,
    aliases: &AliasMap,
) -> Vec<DesiredHost> {
    let mut hosts: Vec<DesiredHost> = snapshot
        .self_peer
        .addresses
        .iter()
        .map(|ip| DesiredHost::new(&snapshot.self_peer.host_name, *ip))
        .collect();

    for peer in &snapshot.peers {
        if !include_peer(peer, tag_filter) {
            continue;
        }
        hosts.extend(
            peer.addresses
                .iter()
                .map(|ip| DesiredHost::new(&peer.host_name, *ip)),
        );
    }

    let alias_hosts: Vec<DesiredHost> = hosts
        .iter()
        .filter_map(|host| aliases.get(&host.name).map(|names| (host.ip, names)))
        .flat_map(|(ip, names)| names.iter().map(move |alias| DesiredHost::new(alias, ip)))
        .collect();
    hosts.extend(alias_hosts);

    hosts
}

/// Qualify hosts under the zone and collapse duplicate keys
///
/// A later host with the same key replaces the earlier one in place, so the
/// output keeps first-seen order and last-assembled content.
pub fn desired_records(zone: &ZoneDescriptor, hosts: &[DesiredHost]) -> Vec<DesiredRecord> {
    let mut records: Vec<DesiredRecord> = Vec::with_capacity(hosts.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(hosts.len());

    for host in hosts {
        let record = DesiredRecord {
            record_type: host.record_type(),
            name: zone.build_hostname(&host.name),
            ip: host.ip,
        };
        match index.get(&record.key()) {
            Some(&pos) => {
                debug!("Duplicate desired record {}, last entry wins", record.name);
                records[pos] = record;
            }
            None => {
                index.insert(record.key(), records.len());
                records.push(record);
            }
        }
    }

    records
}
