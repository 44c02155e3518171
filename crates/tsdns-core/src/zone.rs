//! Managed zone and record naming
//!
//! A [`ZoneDescriptor`] fixes the part of a provider zone that tsdns is
//! allowed to touch (the managed suffix) and builds every record name
//! under it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// TTL value that tells the provider to pick its automatic/shortest TTL
pub const AUTO_TTL: u32 = 1;

/// Address record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// A record (IPv4)
    A,
    /// AAAA record (IPv6)
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    /// Derive the record type from an address
    pub fn for_ip(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => RecordType::A,
            IpAddr::V6(_) => RecordType::Aaaa,
        }
    }

    /// Wire name of the record type
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }

    /// Parse a provider type string; `None` for anything but A/AAAA
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("A") {
            Some(RecordType::A)
        } else if s.eq_ignore_ascii_case("AAAA") {
            Some(RecordType::Aaaa)
        } else {
            None
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lookup key shared by desired and existing records
///
/// Matching is exact on `lowercase(type + name)`.
pub fn record_key(record_type: &str, name: &str) -> String {
    format!("{}{}", record_type, name).to_lowercase()
}

/// The zone and subdomain boundary tsdns manages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneDescriptor {
    /// Base domain of the provider zone (e.g. "example.com")
    pub domain: String,

    /// Optional subdomain prefix (e.g. "wg")
    #[serde(default)]
    pub subdomain: Option<String>,

    /// Optional peer tag filter
    #[serde(default)]
    pub tag: Option<String>,
}

impl ZoneDescriptor {
    /// Create a descriptor for a bare domain
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            subdomain: None,
            tag: None,
        }
    }

    /// Set the subdomain prefix
    pub fn with_subdomain(mut self, subdomain: impl Into<String>) -> Self {
        self.subdomain = Some(subdomain.into());
        self
    }

    /// Set the tag filter
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Lower-cased suffix every managed record name ends with
    pub fn managed_suffix(&self) -> String {
        match self.subdomain.as_deref() {
            Some(sub) if !sub.is_empty() => format!("{}.{}", sub, self.domain).to_lowercase(),
            _ => self.domain.to_lowercase(),
        }
    }

    /// Build the fully-qualified record name for a bare host name
    ///
    /// An empty host name yields the bare suffix.
    pub fn build_hostname(&self, host: &str) -> String {
        let suffix = self.managed_suffix();
        if host.is_empty() {
            return suffix;
        }
        format!("{}.{}", host.to_lowercase(), suffix)
    }

    /// Whether `name` lies under the managed suffix
    ///
    /// Stricter than a plain `ends_with`: `xwg.example.com` is not managed
    /// by `wg.example.com`.
    pub fn manages(&self, name: &str) -> bool {
        is_under_suffix(name, &self.managed_suffix())
    }
}

impl fmt::Display for ZoneDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.managed_suffix())
    }
}

/// Whether `name` equals `suffix` or ends with `.suffix` (case-insensitive)
///
/// The label boundary keeps `xwg.example.com` out of `wg.example.com`.
pub fn is_under_suffix(name: &str, suffix: &str) -> bool {
    let name = name.trim_end_matches('.').to_lowercase();
    let suffix = suffix.to_lowercase();
    if name == suffix {
        return true;
    }
    name.strip_suffix(&suffix)
        .is_some_and(|head| head.ends_with('.'))
}
