//! External command delivery.
//!
//! Monitoring daemons accept external commands (acknowledgements, downtimes,
//! rechecks, ...) through a named pipe, one `[timestamp] COMMAND` line per
//! command. This is independent of the livestatus query protocol.
//!
//! - [`LocalPipe`]: the daemon runs on this host; the line is appended to its pipe directly.
//! - [`SecureShell`]: the daemon runs elsewhere; the line is appended remotely over `ssh`.
//!
//! Delivery is fire-and-forget in both cases. Success means the line was
//! handed over, never that the daemon consumed it.
mod local;
mod ssh;

use std::{
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

use crate::error::TransportError;

pub use local::LocalPipe;
pub use ssh::{Delivery, SecureShell};

pub const DEFAULT_PIPE_PATH: &str = "/usr/local/icinga/var/rw/icinga.cmd";
pub const DEFAULT_SSH_PORT: u16 = 22;
pub const DEFAULT_HOST: &str = "localhost";

/// Where a command pipe lives. Unset fields fall back to the defaults above.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointOptions {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub path: Option<PathBuf>,
}

impl EndpointOptions {
    fn path_or_default(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PIPE_PATH))
    }
}

pub trait CommandTransport {
    fn configure(&mut self, options: &EndpointOptions);

    /// Hands one command over for delivery.
    fn send(&self, command: &str) -> Result<(), TransportError>;
}

/// Picks remote delivery when a host is configured, the local pipe otherwise.
pub fn select(options: &EndpointOptions) -> Box<dyn CommandTransport> {
    let mut transport: Box<dyn CommandTransport> = match options.host {
        Some(_) => Box::new(SecureShell::default()),
        None => Box::new(LocalPipe::default()),
    };
    transport.configure(options);
    transport
}

/// Formats `command` the way the command pipe expects it, without newline.
///
/// The pipe takes one command per line, so a command with an embedded line
/// break is refused.
pub fn command_line(command: &str, at: SystemTime) -> Result<String, TransportError> {
    let command = command.trim();
    if command.contains(['\n', '\r']) {
        return Err(TransportError::MultiLine {
            command: command.to_string(),
        });
    }

    let secs = at
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    Ok(format!("[{secs}] {command}"))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn command_line_is_timestamped() {
        let at = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        assert_eq!(
            command_line("SCHEDULE_FORCED_HOST_CHECK;web01;1700000000\n", at).unwrap(),
            "[1700000000] SCHEDULE_FORCED_HOST_CHECK;web01;1700000000"
        );
    }

    #[test]
    fn command_line_rejects_line_breaks() {
        let inputs = vec![
            "ACKNOWLEDGE_HOST_PROBLEM;web01;1;1;0;admin;x\n[0] SHUTDOWN_PROGRAM",
            "ENABLE_NOTIFICATIONS\r[0] SHUTDOWN_PROGRAM",
        ];

        for input in inputs {
            match command_line(input, UNIX_EPOCH) {
                Err(TransportError::MultiLine { command }) => {
                    assert!(command.contains("SHUTDOWN_PROGRAM"))
                }
                other => panic!("expected multi-line error for {input:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn default_options() {
        let options = EndpointOptions::default();
        assert_eq!(options.path_or_default(), PathBuf::from(DEFAULT_PIPE_PATH));
    }
}
