//! Tunnel correlation
//!
//! `ipsec statusall` describes one connection across several unrelated lines:
//! the `child:` declaration in the Connections section carries the traffic
//! selectors, the `name[n]: ESTABLISHED` line carries the public endpoints and
//! the `name{n}:` child SA lines carry the byte counters. Lines are joined on
//! the exact connection name.

use std::collections::HashMap;
use tracing::debug;

use crate::classifier;
use crate::model::{StatusSnapshot, Tunnel};
use crate::patterns::{self, NameDelimiter};

/// Endpoints and counters found anywhere in the capture, keyed by name
///
/// Later lines overwrite earlier ones for the same name.
#[derive(Debug, Default)]
struct LineIndex {
    endpoints: HashMap<String, (String, String)>,
    bytes: HashMap<String, (u64, u64)>,
}

impl LineIndex {
    fn build(lines: &[&str]) -> Self {
        let mut index = Self::default();

        for line in lines {
            if patterns::has_established(line) {
                if let Some(name) = patterns::parse_name(NameDelimiter::Bracket, line) {
                    if let Some(ips) = patterns::parse_ips(line) {
                        index.endpoints.insert(name, ips);
                    }
                }
            }

            if patterns::has_bytes(line) {
                if let Some(name) = patterns::parse_name(NameDelimiter::Brace, line) {
                    index.bytes.insert(name, patterns::parse_bytes(line));
                }
            }
        }

        index
    }
}

/// Build a snapshot from the lines of one status capture
///
/// Lines are trimmed and blank lines ignored. Parsing never fails: a line that
/// does not fit its pattern is skipped and missing fields stay zero-valued.
pub fn parse<S: AsRef<str>>(lines: &[S]) -> StatusSnapshot {
    let lines: Vec<&str> = lines
        .iter()
        .map(|l| l.as_ref().trim())
        .filter(|l| !l.is_empty())
        .collect();

    let index = LineIndex::build(&lines);
    let mut snapshot = StatusSnapshot::default();

    for line in &lines {
        let classified = classifier::classify(line);

        if let Some(version) = classified.version.as_ref() {
            snapshot.version = version.clone();
        }

        if let Some(name) = classified.tunnel_child_name() {
            declare_tunnel(&mut snapshot, &index, name, line);
        }

        // An INSTALLED child SA also bumps the counter, on top of any bump from
        // a repeated declaration. This can count one re-establishment twice,
        // but existing dashboards are calibrated to these values, so keep it.
        if let Some(name) = classified.installed_name() {
            if let Some(tunnel) = snapshot.tunnels.get_mut(name) {
                tunnel.count += 1;
                debug!("Installed child SA for {}, count now {}", name, tunnel.count);
            }
        }
    }

    snapshot
}

fn declare_tunnel(snapshot: &mut StatusSnapshot, index: &LineIndex, name: &str, line: &str) {
    if let Some(existing) = snapshot.tunnels.get_mut(name) {
        existing.count += 1;
        debug!("Repeated declaration of {}, count now {}", name, existing.count);
        return;
    }

    let mut tunnel = Tunnel::new(name);
    let (local_subnets, remote_subnets) = patterns::parse_subnets(line);
    tunnel.local_subnets = local_subnets;
    tunnel.remote_subnets = remote_subnets;

    if let Some((local_ip, remote_ip)) = index.endpoints.get(name) {
        tunnel.local_ip = local_ip.clone();
        tunnel.remote_ip = remote_ip.clone();
    }

    if let Some(&(bytes_in, bytes_out)) = index.bytes.get(name) {
        tunnel.bytes_in = bytes_in;
        tunnel.bytes_out = bytes_out;
    }

    debug!(
        "Declared tunnel {}: {:?} === {:?}",
        name, tunnel.local_subnets, tunnel.remote_subnets
    );
    snapshot.tunnels.insert(name.to_string(), tunnel);
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUSALL: &str = include_str!("../tests/fixtures/statusall.txt");

    fn fixture_lines() -> Vec<&'static str> {
        STATUSALL.lines().collect()
    }

    #[test]
    fn test_end_to_end_single_tunnel() {
        let lines = [
            "Status of IKE charon daemon (strongSwan 5.9.1, Linux 5.15.0-91-generic, x86_64):",
            "site-a:  child:  10.1.0.0/24 === 10.2.0.0/24 TUNNEL, dpdaction=restart",
            "site-a[1]: ESTABLISHED 3 minutes ago, 203.0.113.1 ... 198.51.100.1",
            "site-a{1}: INSTALLED, TUNNEL, reqid 1, 1024 bytes_i, 2048 bytes_o",
        ];
        let snapshot = parse(&lines);

        assert_eq!(snapshot.version, "5.9.1");
        assert_eq!(snapshot.tunnels.len(), 1);

        let tunnel = snapshot.tunnel("site-a").unwrap();
        assert_eq!(tunnel.name, "site-a");
        assert_eq!(tunnel.local_ip, "203.0.113.1");
        assert_eq!(tunnel.remote_ip, "198.51.100.1");
        assert_eq!(tunnel.bytes_in, 1024);
        assert_eq!(tunnel.bytes_out, 2048);
        assert_eq!(tunnel.local_subnets, vec!["10.1.0.0/24"]);
        assert_eq!(tunnel.remote_subnets, vec!["10.2.0.0/24"]);
        assert_eq!(tunnel.count, 1);
    }

    #[test]
    fn test_fixture_tunnels() {
        let snapshot = parse(&fixture_lines());
        assert_eq!(snapshot.version, "5.9.1");
        assert_eq!(
            snapshot.tunnels.keys().collect::<Vec<_>>(),
            vec!["branch-office-2", "site-a"]
        );

        let site_a = snapshot.tunnel("site-a").unwrap();
        assert_eq!(site_a.local_ip, "203.0.113.1");
        assert_eq!(site_a.remote_ip, "198.51.100.1");
        assert_eq!((site_a.bytes_in, site_a.bytes_out), (1024, 2048));
        assert_eq!(site_a.count, 1);

        let branch = snapshot.tunnel("branch-office-2").unwrap();
        assert_eq!(branch.local_ip, "203.0.113.1");
        assert_eq!(branch.remote_ip, "192.0.2.50");
        assert_eq!(branch.local_subnets, vec!["10.1.0.0/24", "10.1.8.0/22"]);
        assert_eq!(
            branch.remote_subnets,
            vec!["172.16.5.0/24", "172.16.6.0/24", "172.16.7.7/32"]
        );
        // Last counter line for the name wins
        assert_eq!((branch.bytes_in, branch.bytes_out), (99, 300));
        // Two INSTALLED child SAs
        assert_eq!(branch.count, 2);
    }

    #[test]
    fn test_repeated_declaration_keeps_first() {
        let lines = [
            "dup:  child:  10.0.1.0/24 === 10.0.2.0/24 TUNNEL",
            "dup:  child:  10.9.1.0/24 === 10.9.2.0/24 TUNNEL",
            "dup:  child:  10.8.1.0/24 === 10.8.2.0/24 TUNNEL",
        ];
        let snapshot = parse(&lines);
        let tunnel = snapshot.tunnel("dup").unwrap();

        assert_eq!(tunnel.count, 2);
        assert_eq!(tunnel.local_subnets, vec!["10.0.1.0/24"]);
        assert_eq!(tunnel.remote_subnets, vec!["10.0.2.0/24"]);
    }

    #[test]
    fn test_repeated_declaration_and_installed_both_count() {
        let lines = [
            "vpn:  child:  10.0.1.0/24 === 10.0.2.0/24 TUNNEL",
            "vpn{1}:  INSTALLED, TUNNEL, reqid 1",
            "vpn:  child:  10.0.1.0/24 === 10.0.2.0/24 TUNNEL",
            "vpn{2}:  INSTALLED, TUNNEL, reqid 1",
        ];
        let snapshot = parse(&lines);
        assert_eq!(snapshot.tunnel("vpn").unwrap().count, 3);
    }

    #[test]
    fn test_installed_before_declaration_is_not_counted() {
        let lines = [
            "late{1}:  INSTALLED, TUNNEL, reqid 1",
            "late:  child:  10.0.1.0/24 === 10.0.2.0/24 TUNNEL",
        ];
        let snapshot = parse(&lines);
        assert_eq!(snapshot.tunnel("late").unwrap().count, 0);
    }

    #[test]
    fn test_unmatched_declaration_keeps_defaults() {
        let lines = [
            "lonely:  child:  10.0.1.0/24 === 10.0.2.0/24 TUNNEL",
            "other[1]: ESTABLISHED 1 minute ago, 192.0.2.1[a]...192.0.2.2[b]",
            "other{1}:  AES_GCM_16_256, 5 bytes_i, 6 bytes_o",
        ];
        let snapshot = parse(&lines);
        let tunnel = snapshot.tunnel("lonely").unwrap();

        assert!(tunnel.local_ip.is_empty());
        assert!(tunnel.remote_ip.is_empty());
        assert_eq!((tunnel.bytes_in, tunnel.bytes_out), (0, 0));
        assert!(snapshot.tunnel("other").is_none());
    }

    #[test]
    fn test_names_must_match_exactly() {
        let lines = [
            "site:  child:  10.0.1.0/24 === 10.0.2.0/24 TUNNEL",
            "site-a[1]: ESTABLISHED 1 minute ago, 192.0.2.1...192.0.2.2",
            "Site{1}:  AES_GCM_16_256, 5 bytes_i, 6 bytes_o",
        ];
        let snapshot = parse(&lines);
        let tunnel = snapshot.tunnel("site").unwrap();

        assert!(tunnel.local_ip.is_empty());
        assert_eq!((tunnel.bytes_in, tunnel.bytes_out), (0, 0));
    }

    #[test]
    fn test_last_matching_counter_line_wins() {
        let lines = [
            "t{1}:  AES_GCM_16_256, 5 bytes_i, 6 bytes_o",
            "t:  child:  10.0.1.0/24 === 10.0.2.0/24 TUNNEL",
            "t{2}:  AES_GCM_16_256, 7 bytes_i",
        ];
        let snapshot = parse(&lines);
        let tunnel = snapshot.tunnel("t").unwrap();

        // The last line has a single counter, which resets both to zero
        assert_eq!((tunnel.bytes_in, tunnel.bytes_out), (0, 0));
    }

    #[test]
    fn test_declaration_without_separator_has_no_subnets() {
        let lines = ["bare:  child:  dynamic TUNNEL"];
        let snapshot = parse(&lines);
        let tunnel = snapshot.tunnel("bare").unwrap();

        assert!(tunnel.local_subnets.is_empty());
        assert!(tunnel.remote_subnets.is_empty());
    }

    #[test]
    fn test_blank_and_padded_lines() {
        let lines = [
            "",
            "   ",
            "      pad:  child:  10.0.1.0/24 === 10.0.2.0/24 TUNNEL   ",
            "  pad[1]: ESTABLISHED 1 minute ago, 192.0.2.1...192.0.2.2",
        ];
        let snapshot = parse(&lines);
        let tunnel = snapshot.tunnel("pad").unwrap();
        assert_eq!(tunnel.local_ip, "192.0.2.1");
        assert_eq!(tunnel.remote_ip, "192.0.2.2");
    }

    #[test]
    fn test_parse_is_idempotent() {
        let lines = fixture_lines();
        let first = parse(&lines);
        let second = parse(&lines);

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_empty_input() {
        let snapshot = parse::<&str>(&[]);
        assert!(snapshot.version.is_empty());
        assert!(snapshot.tunnels.is_empty());
    }
}
