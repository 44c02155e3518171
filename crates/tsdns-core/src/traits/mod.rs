//! Core traits for tsdns
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`PeerSource`]: Read the tailnet roster
//! - [`DnsProvider`]: List and change records via provider APIs

pub mod peer_source;
pub mod dns_provider;

pub use peer_source::{Peer, PeerSnapshot, PeerSource, PeerSourceFactory};
pub use dns_provider::{DnsProvider, DnsProviderFactory, ExistingRecord, RecordSpec};
