//! Where status lines come from
//!
//! The parser only needs an ordered list of lines. They are either piped into
//! standard input (`ipsec statusall | ipsecmon -a monitor`) or captured by
//! running the status command directly.

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::StatusCommandConfig;
use crate::error::{IpsecmonError, IpsecmonResult};

#[async_trait]
pub trait StatusSource: Send {
    /// Short name used in log messages
    fn name(&self) -> &str;

    /// Read the complete status output as trimmed, non-empty lines
    async fn read_lines(&mut self) -> IpsecmonResult<Vec<String>>;
}

/// Split captured output into trimmed, non-empty lines
pub fn split_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read every line from `reader` until end of input
///
/// Bytes that are not valid UTF-8 (x509 DNs in a legacy encoding) are replaced
/// per line instead of failing the whole read.
pub async fn read_all_lines<R>(mut reader: R) -> IpsecmonResult<Vec<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = Vec::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim();
        if !line.is_empty() {
            lines.push(line.to_string());
        }
    }

    Ok(lines)
}

/// True when stdin is attached to a terminal rather than a pipe or file
pub fn stdin_is_terminal() -> bool {
    atty::is(atty::Stream::Stdin)
}

/// Status output piped into standard input
#[derive(Debug, Default)]
pub struct StdinSource;

impl StdinSource {
    pub fn new() -> Self {
        Self
    }

    /// Fail early when nothing is piped in
    pub fn ensure_piped() -> IpsecmonResult<()> {
        Self::check_piped(stdin_is_terminal())
    }

    fn check_piped(is_terminal: bool) -> IpsecmonResult<()> {
        if is_terminal {
            return Err(IpsecmonError::NoInput(
                "Pipe here the output of ipsec statusall".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl StatusSource for StdinSource {
    fn name(&self) -> &str {
        "stdin"
    }

    async fn read_lines(&mut self) -> IpsecmonResult<Vec<String>> {
        let lines = read_all_lines(BufReader::new(tokio::io::stdin())).await?;
        debug!("Read {} lines from stdin", lines.len());
        Ok(lines)
    }
}

/// Runs the daemon status command and captures its output
#[derive(Debug, Clone)]
pub struct CommandSource {
    binary: String,
    args: Vec<String>,
}

impl CommandSource {
    pub fn new(config: &StatusCommandConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            args: config.args.clone(),
        }
    }

    fn command_line(&self) -> String {
        std::iter::once(self.binary.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Raw stdout of the status command
    pub async fn capture(&self) -> IpsecmonResult<String> {
        info!("Running {}", self.command_line());

        let output = Command::new(&self.binary)
            .args(&self.args)
            .output()
            .await
            .map_err(|e| IpsecmonError::CommandFailed {
                cmd: self.command_line(),
                code: None,
                stderr: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(IpsecmonError::CommandFailed {
                cmd: self.command_line(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl StatusSource for CommandSource {
    fn name(&self) -> &str {
        &self.binary
    }

    async fn read_lines(&mut self) -> IpsecmonResult<Vec<String>> {
        let output = self.capture().await?;
        Ok(split_lines(&output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(binary: &str, args: &[&str]) -> CommandSource {
        CommandSource::new(&StatusCommandConfig {
            binary: binary.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        })
    }

    #[test]
    fn test_split_lines() {
        let lines = split_lines("  first  \n\n\tsecond\r\n   \nthird");
        assert_eq!(lines, vec!["first", "second", "third"]);
        assert!(split_lines("").is_empty());
    }

    #[tokio::test]
    async fn test_read_all_lines_preserves_order() {
        let input: &[u8] = b"Connections:\n   site-a:  child:  10.1.0.0/24 === 10.2.0.0/24 TUNNEL\n\n  tail  \n";
        let lines = read_all_lines(input).await.unwrap();
        assert_eq!(
            lines,
            vec![
                "Connections:",
                "site-a:  child:  10.1.0.0/24 === 10.2.0.0/24 TUNNEL",
                "tail",
            ]
        );
    }

    #[tokio::test]
    async fn test_read_all_lines_replaces_invalid_utf8() {
        let input: &[u8] = b"site-a:   local:  [CN=M\xfcller] uses public key authentication\n\
                             site-a:  child:  10.1.0.0/24 === 10.2.0.0/24 TUNNEL\n";
        let lines = read_all_lines(input).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "site-a:   local:  [CN=M\u{fffd}ller] uses public key authentication"
        );
        assert_eq!(lines[1], "site-a:  child:  10.1.0.0/24 === 10.2.0.0/24 TUNNEL");
    }

    #[test]
    fn test_check_piped() {
        assert!(StdinSource::check_piped(false).is_ok());
        match StdinSource::check_piped(true) {
            Err(IpsecmonError::NoInput(msg)) => {
                assert_eq!(msg, "Pipe here the output of ipsec statusall");
            }
            other => panic!("expected NoInput, got {:?}", other),
        }
    }

    #[test]
    fn test_command_line() {
        assert_eq!(command("ipsec", &["statusall"]).command_line(), "ipsec statusall");
        assert_eq!(command("swanctl", &[]).command_line(), "swanctl");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_source_captures_stdout() {
        let mut source = command("sh", &["-c", "printf 'one\\n\\n  two\\n'"]);
        let lines = source.read_lines().await.unwrap();
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_source_surfaces_stderr() {
        let source = command("sh", &["-c", "echo 'charon not running' >&2; exit 3"]);
        match source.capture().await {
            Err(IpsecmonError::CommandFailed { code, stderr, .. }) => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "charon not running");
            }
            other => panic!("expected CommandFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let source = command("ipsecmon-no-such-binary", &["statusall"]);
        assert!(matches!(
            source.capture().await,
            Err(IpsecmonError::CommandFailed { code: None, .. })
        ));
    }
}
