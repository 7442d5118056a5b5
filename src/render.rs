//! JSON payloads for the monitoring system
//!
//! `discover` feeds low-level discovery with one item per tunnel/subnet pair,
//! `monitor` reports the current counters of every tunnel.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::endpoint::pingable_endpoint;
use crate::error::IpsecmonResult;
use crate::model::{normalize_name, StatusSnapshot};

/// One discovered tunnel/subnet pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryItem {
    #[serde(rename = "{#TUNNEL}")]
    pub tunnel: String,
    #[serde(rename = "{#LOCAL_PUBLIC_IP}")]
    pub local_ip: String,
    #[serde(rename = "{#REMOTE_PUBLIC_IP}")]
    pub remote_ip: String,
    #[serde(rename = "{#LOCAL_INTERNAL_SUBNET}")]
    pub local_subnet: String,
    #[serde(rename = "{#REMOTE_INTERNAL_SUBNET}")]
    pub remote_subnet: String,
    #[serde(rename = "{#LOCAL_PINGABLE_ENDPOINT}")]
    pub local_endpoint: String,
    #[serde(rename = "{#REMOTE_PINGABLE_ENDPOINT}")]
    pub remote_endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryPayload {
    pub data: Vec<DiscoveryItem>,
}

/// Counters of one tunnel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MonitorItem {
    pub name: String,
    pub bytes_in: u64,
    pub bytes_out: u64,
    pub count: u64,
}

pub type MonitorPayload = BTreeMap<String, MonitorItem>;

/// Cross product of remote and local subnets for every tunnel
pub fn discover(snapshot: &StatusSnapshot) -> DiscoveryPayload {
    let mut data = Vec::new();

    for tunnel in snapshot.tunnels.values() {
        let name = normalize_name(&tunnel.name);
        for remote in &tunnel.remote_subnets {
            for local in &tunnel.local_subnets {
                data.push(DiscoveryItem {
                    tunnel: name.clone(),
                    local_ip: tunnel.local_ip.clone(),
                    remote_ip: tunnel.remote_ip.clone(),
                    local_subnet: local.clone(),
                    remote_subnet: remote.clone(),
                    local_endpoint: pingable_endpoint(local),
                    remote_endpoint: pingable_endpoint(remote),
                });
            }
        }
    }

    DiscoveryPayload { data }
}

pub fn monitor(snapshot: &StatusSnapshot) -> MonitorPayload {
    snapshot
        .tunnels
        .iter()
        .map(|(name, tunnel)| {
            (
                normalize_name(name),
                MonitorItem {
                    name: tunnel.name.clone(),
                    bytes_in: tunnel.bytes_in,
                    bytes_out: tunnel.bytes_out,
                    count: tunnel.count,
                },
            )
        })
        .collect()
}

/// Serialize a payload, compact or pretty-printed
pub fn to_json<T: Serialize>(payload: &T, pretty: bool) -> IpsecmonResult<String> {
    let json = if pretty {
        serde_json::to_string_pretty(payload)?
    } else {
        serde_json::to_string(payload)?
    };
    Ok(json)
}
