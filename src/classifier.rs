//! Per-line classification
//!
//! A status line may fall into several categories at once, so classification
//! records every predicate separately instead of picking a single kind.

use crate::patterns::{self, NameDelimiter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCategory {
    Version,
    TunnelChild,
    Established,
    Installed,
    Other,
}

/// Result of matching one line against the pattern library
///
/// For the name-bearing categories the outer `Option` says whether the line
/// matched, the inner one whether a name could be extracted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedLine {
    pub version: Option<String>,
    pub tunnel_child: Option<Option<String>>,
    pub established: Option<Option<String>>,
    pub installed: Option<Option<String>>,
}

impl ClassifiedLine {
    /// Every category the line matched, or `[Other]`
    pub fn categories(&self) -> Vec<LineCategory> {
        let mut categories = Vec::new();
        if self.version.is_some() {
            categories.push(LineCategory::Version);
        }
        if self.tunnel_child.is_some() {
            categories.push(LineCategory::TunnelChild);
        }
        if self.established.is_some() {
            categories.push(LineCategory::Established);
        }
        if self.installed.is_some() {
            categories.push(LineCategory::Installed);
        }
        if categories.is_empty() {
            categories.push(LineCategory::Other);
        }
        categories
    }

    /// Tunnel name of a declaration line
    pub fn tunnel_child_name(&self) -> Option<&str> {
        self.tunnel_child.as_ref().and_then(|n| n.as_deref())
    }

    pub fn established_name(&self) -> Option<&str> {
        self.established.as_ref().and_then(|n| n.as_deref())
    }

    pub fn installed_name(&self) -> Option<&str> {
        self.installed.as_ref().and_then(|n| n.as_deref())
    }
}

pub fn classify(line: &str) -> ClassifiedLine {
    let named = |matched: bool, delimiter: NameDelimiter| {
        matched.then(|| patterns::parse_name(delimiter, line))
    };

    ClassifiedLine {
        version: patterns::parse_version(line),
        tunnel_child: named(patterns::has_tunnel_child(line), NameDelimiter::Colon),
        established: named(patterns::has_established(line), NameDelimiter::Bracket),
        installed: named(patterns::has_installed(line), NameDelimiter::Brace),
    }
}
