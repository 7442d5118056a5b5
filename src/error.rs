//! Error types for ipsecmon

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IpsecmonError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Status command execution failed
    #[error("{}", command_failed_message(.cmd, .code, .stderr))]
    CommandFailed { cmd: String, code: Option<i32>, stderr: String },
    /// Nothing was piped into standard input
    #[error("{0}")]
    NoInput(String),
    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// Parse or serialization error
    #[error("Parse error: {0}")]
    ParseError(String),
}

fn command_failed_message(cmd: &str, code: &Option<i32>, stderr: &str) -> String {
    match code {
        Some(code) => format!("Command '{}' failed with code {}: {}", cmd, code, stderr),
        None => format!("Command '{}' failed: {}", cmd, stderr),
    }
}

impl From<serde_json::Error> for IpsecmonError {
    fn from(error: serde_json::Error) -> Self {
        IpsecmonError::ParseError(error.to_string())
    }
}

pub type IpsecmonResult<T> = Result<T, IpsecmonError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failed_display() {
        let err = IpsecmonError::CommandFailed {
            cmd: "ipsec statusall".to_string(),
            code: Some(7),
            stderr: "charon is not running".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Command 'ipsec statusall' failed with code 7: charon is not running"
        );

        let err = IpsecmonError::CommandFailed {
            cmd: "ipsec statusall".to_string(),
            code: None,
            stderr: "killed".to_string(),
        };
        assert_eq!(err.to_string(), "Command 'ipsec statusall' failed: killed");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: IpsecmonError = json_err.into();
        assert!(matches!(err, IpsecmonError::ParseError(_)));
    }
}
