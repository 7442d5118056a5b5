//! Line patterns for `ipsec statusall` output
//!
//! Every regular expression is compiled once per process. The helpers return
//! `Option` or a zero value instead of failing, so a line that does not fit a
//! pattern is simply skipped by the caller.

use lazy_static::lazy_static;
use regex::Regex;

const OCTET: &str = r"(25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)";

lazy_static! {
    static ref VERSION_RE: Regex = Regex::new(r"Swan (.+)(, Lin)").unwrap();
    static ref IPV4_RE: Regex = Regex::new(&format!(r"{o}(\.{o}){{3}}", o = OCTET)).unwrap();
    static ref NETWORK_ADDR_RE: Regex =
        Regex::new(&format!(r"^{o}(\.{o}){{2}}\.0$", o = OCTET)).unwrap();
    static ref SUBNET_RE: Regex =
        Regex::new(&format!(r"{o}(\.{o}){{3}}/[0-9]{{1,2}}", o = OCTET)).unwrap();
    static ref ESTABLISHED_RE: Regex = Regex::new(r"ESTABLISHED").unwrap();
    static ref TUNNEL_CHILD_RE: Regex = Regex::new(r"child:.+TUNNEL").unwrap();
    static ref INSTALLED_RE: Regex = Regex::new(r"INSTALLED").unwrap();
    static ref NAME_ESTABLISHED_RE: Regex = Regex::new(r"^(.+?)\[").unwrap();
    static ref NAME_TUNNEL_CHILD_RE: Regex = Regex::new(r"^(.+?):").unwrap();
    static ref NAME_INSTALLED_RE: Regex = Regex::new(r"^(.+?)\{").unwrap();
    static ref BYTES_RE: Regex = Regex::new(r"(\d*)\sbytes_").unwrap();
    static ref PEER_ID_RE: Regex = Regex::new(r"\[[^\]]*\]").unwrap();
}

/// Delimiter that terminates the connection name on a status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameDelimiter {
    /// `name[1]: ESTABLISHED ...`
    Bracket,
    /// `name:  child:  ... TUNNEL`
    Colon,
    /// `name{1}:  INSTALLED ...`
    Brace,
}

impl NameDelimiter {
    fn regex(self) -> &'static Regex {
        match self {
            NameDelimiter::Bracket => &NAME_ESTABLISHED_RE,
            NameDelimiter::Colon => &NAME_TUNNEL_CHILD_RE,
            NameDelimiter::Brace => &NAME_INSTALLED_RE,
        }
    }
}

/// Extract the daemon version from a `strongSwan 5.9.1, Linux ...` line
pub fn parse_version(line: &str) -> Option<String> {
    VERSION_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn has_tunnel_child(line: &str) -> bool {
    TUNNEL_CHILD_RE.is_match(line)
}

pub fn has_established(line: &str) -> bool {
    ESTABLISHED_RE.is_match(line)
}

pub fn has_installed(line: &str) -> bool {
    INSTALLED_RE.is_match(line)
}

pub fn has_bytes(line: &str) -> bool {
    BYTES_RE.is_match(line)
}

/// Everything from line start up to (not including) the first delimiter
pub fn parse_name(delimiter: NameDelimiter, line: &str) -> Option<String> {
    delimiter
        .regex()
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Byte counters of a child SA: `(bytes_in, bytes_out)`
///
/// Only a line with exactly two `<n> bytes_` occurrences yields counters;
/// anything else gives `(0, 0)`.
pub fn parse_bytes(line: &str) -> (u64, u64) {
    let counters: Vec<&str> = BYTES_RE
        .captures_iter(line)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect();

    if counters.len() != 2 {
        return (0, 0);
    }

    match (counters[0].parse::<u64>(), counters[1].parse::<u64>()) {
        (Ok(bytes_in), Ok(bytes_out)) => (bytes_in, bytes_out),
        _ => (0, 0),
    }
}

/// Local and remote public IP of an established IKE SA
///
/// Bracketed peer identities (`203.0.113.1[CN=gw]`) are dropped first so that
/// an identity that happens to be an address is not mistaken for the remote
/// endpoint. The first two remaining IPv4 addresses are `(local, remote)`.
pub fn parse_ips(line: &str) -> Option<(String, String)> {
    let endpoints = PEER_ID_RE.replace_all(line, "");
    let mut addrs = IPV4_RE.find_iter(&endpoints).map(|m| m.as_str().to_string());

    match (addrs.next(), addrs.next()) {
        (Some(local), Some(remote)) => Some((local, remote)),
        _ => None,
    }
}

/// Local and remote traffic selectors of a `local === remote` line
///
/// The line must split into exactly two halves on `===`, otherwise both lists
/// are empty.
pub fn parse_subnets(line: &str) -> (Vec<String>, Vec<String>) {
    let halves: Vec<&str> = line.split("===").collect();
    if halves.len() != 2 {
        return (Vec::new(), Vec::new());
    }

    let collect = |half: &str| -> Vec<String> {
        SUBNET_RE
            .find_iter(half)
            .map(|m| m.as_str().to_string())
            .collect()
    };

    (collect(halves[0]), collect(halves[1]))
}

/// An address is pingable unless it is a bare network address (`x.y.z.0`)
pub fn is_pingable_ip(addr: &str) -> bool {
    !NETWORK_ADDR_RE.is_match(addr)
}
