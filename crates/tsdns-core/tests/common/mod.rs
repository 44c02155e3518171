//! Test doubles and common utilities for reconciliation contract tests
//!
//! This module provides minimal test doubles that record every provider
//! call and can inject failures at chosen points.

#![allow(dead_code)]

use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tsdns_core::error::{Error, Result};
use tsdns_core::provider::MemoryProvider;
use tsdns_core::traits::{
    DnsProvider, ExistingRecord, Peer, PeerSnapshot, PeerSource, RecordSpec,
};
use tsdns_core::{SyncConfig, ZoneDescriptor};

pub const ZONE: &str = "example.com";
pub const ZONE_ID: &str = "zone-1";
pub const SUBDOMAIN: &str = "wg";

/// One provider call as seen by the recording provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ZoneId(String),
    List(String),
    Create { name: String, record_type: String, content: String, ttl: u32 },
    Update { id: String, name: String, record_type: String, content: String, ttl: u32 },
    Delete(String),
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        matches!(self, Call::Create { .. } | Call::Update { .. } | Call::Delete(_))
    }
}

/// A DnsProvider backed by MemoryProvider that logs calls and fails on demand
#[derive(Clone)]
pub struct RecordingProvider {
    inner: MemoryProvider,
    calls: Arc<Mutex<Vec<Call>>>,
    /// Fail the N-th mutating call (1-based); 0 disables
    fail_on_mutation: Arc<AtomicUsize>,
    mutations: Arc<AtomicUsize>,
    fail_listing: bool,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self {
            inner: MemoryProvider::with_zone(ZONE, ZONE_ID),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_on_mutation: Arc::new(AtomicUsize::new(0)),
            mutations: Arc::new(AtomicUsize::new(0)),
            fail_listing: false,
        }
    }

    /// Seed the zone with records
    pub async fn seeded(records: Vec<ExistingRecord>) -> Self {
        let provider = Self::new();
        for record in records {
            provider.inner.insert_record(ZONE_ID, record).await;
        }
        provider
    }

    /// Make the N-th create/update/delete fail
    pub fn failing_on_mutation(self, n: usize) -> Self {
        self.fail_on_mutation.store(n, Ordering::SeqCst);
        self
    }

    /// Make `list_records` fail
    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub async fn records(&self) -> Vec<ExistingRecord> {
        self.inner.records(ZONE_ID).await
    }

    fn log(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_mutation(&self) -> Result<()> {
        let n = self.mutations.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_mutation.load(Ordering::SeqCst) == n {
            return Err(Error::provider("recording", format!("injected failure on call {}", n)));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl DnsProvider for RecordingProvider {
    async fn zone_id(&self, zone_name: &str) -> Result<String> {
        self.log(Call::ZoneId(zone_name.to_string()));
        self.inner.zone_id(zone_name).await
    }

    async fn list_records(&self, zone_id: &str) -> Result<Vec<ExistingRecord>> {
        self.log(Call::List(zone_id.to_string()));
        if self.fail_listing {
            return Err(Error::provider("recording", "listing unavailable"));
        }
        self.inner.list_records(zone_id).await
    }

    async fn create_record(&self, zone_id: &str, record: &RecordSpec) -> Result<String> {
        self.log(Call::Create {
            name: record.name.clone(),
            record_type: record.record_type.to_string(),
            content: record.content.clone(),
            ttl: record.ttl,
        });
        self.check_mutation()?;
        self.inner.create_record(zone_id, record).await
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record: &RecordSpec,
    ) -> Result<()> {
        self.log(Call::Update {
            id: record_id.to_string(),
            name: record.name.clone(),
            record_type: record.record_type.to_string(),
            content: record.content.clone(),
            ttl: record.ttl,
        });
        self.check_mutation()?;
        self.inner.update_record(zone_id, record_id, record).await
    }

    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<()> {
        self.log(Call::Delete(record_id.to_string()));
        self.check_mutation()?;
        self.inner.delete_record(zone_id, record_id).await
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

/// A peer source that returns a fixed snapshot and counts reads
pub struct StaticPeerSource {
    snapshot: Option<PeerSnapshot>,
    reads: Arc<AtomicUsize>,
}

impl StaticPeerSource {
    pub fn new(snapshot: PeerSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A source whose every read fails
    pub fn unavailable() -> Self {
        Self {
            snapshot: None,
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn reads(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.reads)
    }
}

#[async_trait::async_trait]
impl PeerSource for StaticPeerSource {
    async fn snapshot(&self) -> Result<PeerSnapshot> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.snapshot
            .clone()
            .ok_or_else(|| Error::peer_source("tailscaled is not running"))
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

pub fn ip(s: &str) -> IpAddr {
    s.parse().expect("valid test address")
}

/// Zone descriptor for `wg.example.com`
pub fn zone() -> ZoneDescriptor {
    ZoneDescriptor::new(ZONE).with_subdomain(SUBDOMAIN)
}

/// Configuration for `wg.example.com` with default flags
pub fn config() -> SyncConfig {
    SyncConfig::new(zone())
}

/// Snapshot with self `gateway` at 100.64.0.1 and the given peers
pub fn roster(peers: Vec<Peer>) -> PeerSnapshot {
    PeerSnapshot::new(Peer::new("gateway", vec![ip("100.64.0.1")]), peers)
}

pub fn a(id: &str, name: &str, content: &str) -> ExistingRecord {
    ExistingRecord::new(id, "A", name, content)
}

pub fn aaaa(id: &str, name: &str, content: &str) -> ExistingRecord {
    ExistingRecord::new(id, "AAAA", name, content)
}
