//! Parsed representation of `ipsec statusall`

use serde::Serialize;
use std::collections::BTreeMap;

/// Everything learned from one status capture
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    /// Daemon version, e.g. `5.9.1`
    pub version: String,
    /// Tunnels keyed by connection name
    pub tunnels: BTreeMap<String, Tunnel>,
}

/// One IPsec connection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Tunnel {
    /// Connection name as printed by the daemon (hyphens kept)
    pub name: String,
    pub local_ip: String,
    pub remote_ip: String,
    pub local_subnets: Vec<String>,
    pub remote_subnets: Vec<String>,
    pub bytes_in: u64,
    pub bytes_out: u64,
    /// Re-declaration and installation events seen after the first declaration
    pub count: u64,
}

impl Tunnel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl StatusSnapshot {
    pub fn tunnel(&self, name: &str) -> Option<&Tunnel> {
        self.tunnels.get(name)
    }
}

/// Tunnel name as used in rendered keys (`site-a` -> `site_a`)
pub fn normalize_name(name: &str) -> String {
    name.replace('-', "_")
}
