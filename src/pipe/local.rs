use std::{fs::OpenOptions, io::Write, path::PathBuf, time::SystemTime};

use log::{debug, info};

use crate::error::TransportError;

use super::{CommandTransport, DEFAULT_PIPE_PATH, EndpointOptions, command_line};

/// Appends commands to a command pipe on this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPipe {
    path: PathBuf,
}

impl LocalPipe {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for LocalPipe {
    fn default() -> Self {
        Self::new(DEFAULT_PIPE_PATH)
    }
}

impl CommandTransport for LocalPipe {
    fn configure(&mut self, options: &EndpointOptions) {
        self.path = options.path_or_default();
    }

    fn send(&self, command: &str) -> Result<(), TransportError> {
        let line = command_line(command, SystemTime::now())?;
        debug!("writing command {line:?} to {}", self.path.display());

        let pipe_error = |source| TransportError::Pipe {
            path: self.path.clone(),
            source,
        };
        // never create: a missing pipe means the daemon is not running
        let mut pipe = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(pipe_error)?;
        pipe.write_all(format!("{line}\n").as_bytes())
            .map_err(pipe_error)?;

        info!("sent command to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempdir::TempDir;

    use super::*;

    #[test]
    fn send_appends_line() {
        let temp = TempDir::new("pipe").unwrap();
        let path = temp.path().join("icinga.cmd");
        fs::write(&path, "").unwrap();

        let mut pipe = LocalPipe::default();
        pipe.configure(&EndpointOptions {
            path: Some(path.clone()),
            ..Default::default()
        });
        pipe.send("ENABLE_NOTIFICATIONS").unwrap();
        pipe.send("DISABLE_NOTIFICATIONS").unwrap();

        let written = fs::read_to_string(&path).unwrap();
        let lines = written.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("] ENABLE_NOTIFICATIONS"));
        assert!(lines[1].ends_with("] DISABLE_NOTIFICATIONS"));
    }

    #[test]
    fn send_refuses_second_line() {
        let temp = TempDir::new("pipe").unwrap();
        let path = temp.path().join("icinga.cmd");
        fs::write(&path, "").unwrap();

        let pipe = LocalPipe::new(&path);
        let err = pipe
            .send("DISABLE_NOTIFICATIONS\n[0] SHUTDOWN_PROGRAM")
            .unwrap_err();

        assert!(matches!(err, TransportError::MultiLine { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn send_to_missing_pipe() {
        let temp = TempDir::new("pipe").unwrap();
        let pipe = LocalPipe::new(temp.path().join("missing.cmd"));

        let err = pipe.send("ENABLE_NOTIFICATIONS").unwrap_err();
        assert!(matches!(err, TransportError::Pipe { .. }));
        assert!(!temp.path().join("missing.cmd").exists());
    }
}
