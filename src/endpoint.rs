//! Pingable endpoint detection for traffic selectors

use std::net::Ipv4Addr;
use tracing::warn;

use crate::error::{IpsecmonError, IpsecmonResult};
use crate::patterns;

/// Split `a.b.c.d/len` into its network address and prefix length
///
/// Host bits are cleared, so `10.0.0.5/24` gives `10.0.0.0`.
pub fn parse_cidr(cidr: &str) -> IpsecmonResult<(Ipv4Addr, u8)> {
    let (addr, prefix) = cidr
        .split_once('/')
        .ok_or_else(|| IpsecmonError::InvalidParameter(format!("invalid CIDR address: {}", cidr)))?;

    let addr: Ipv4Addr = addr
        .parse()
        .map_err(|_| IpsecmonError::InvalidParameter(format!("invalid CIDR address: {}", cidr)))?;

    let prefix = prefix
        .parse::<u8>()
        .ok()
        .filter(|len| *len <= 32)
        .ok_or_else(|| IpsecmonError::InvalidParameter(format!("invalid CIDR prefix: {}", cidr)))?;

    let mask = u32::MAX.checked_shl(32 - prefix as u32).unwrap_or(0);
    Ok((Ipv4Addr::from(u32::from(addr) & mask), prefix))
}

/// Address inside `cidr` that is expected to answer a ping
///
/// Host routes and non-network addresses are returned as-is; a bare network
/// address `x.y.z.0` becomes `x.y.z.1`. Returns an empty string when the
/// subnet cannot be parsed.
pub fn pingable_endpoint(cidr: &str) -> String {
    let (network, prefix) = match parse_cidr(cidr) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Cannot derive pingable endpoint: {}", e);
            return String::new();
        }
    };

    let network = network.to_string();
    if prefix == 32 || patterns::is_pingable_ip(&network) {
        return network;
    }

    to_pingable(&network)
}

fn to_pingable(addr: &str) -> String {
    let mut pingable = addr.strip_suffix('0').unwrap_or(addr).to_string();
    pingable.push('1');
    pingable
}
