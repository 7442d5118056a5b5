//! ipsecmon - IPsec status parsing library
//!
//! Turns the text of `ipsec statusall` into a tunnel model and renders it for
//! a monitoring system:
//! - Line patterns and per-line classification
//! - Correlation of declaration, established and installed lines by name
//! - Pingable endpoint detection for traffic selectors
//! - Discovery and monitor JSON payloads
//! - Status input from stdin or the status command

pub mod error;
pub mod config;
pub mod patterns;
pub mod classifier;
pub mod model;
pub mod correlator;
pub mod endpoint;
pub mod render;
pub mod source;

// Re-export commonly used types
pub use error::{IpsecmonError, IpsecmonResult};
pub use config::{IpsecmonConfig, OutputSettings, StatusCommandConfig};
pub use classifier::{classify, ClassifiedLine, LineCategory};
pub use model::{StatusSnapshot, Tunnel};
pub use correlator::parse;
pub use endpoint::pingable_endpoint;
pub use render::{discover, monitor, DiscoveryItem, DiscoveryPayload, MonitorItem, MonitorPayload};
pub use source::{CommandSource, StatusSource, StdinSource};
