use std::{
    io::Read,
    path::{Path, PathBuf},
    process::{Child, Command, ExitStatus, Stdio},
    thread::{self, JoinHandle},
    time::SystemTime,
};

use log::{debug, error, info};

use crate::error::TransportError;

use super::{
    CommandTransport, DEFAULT_HOST, DEFAULT_PIPE_PATH, DEFAULT_SSH_PORT, EndpointOptions,
    command_line,
};

const SSH_PROGRAM: &str = "ssh";

/// Appends commands to the command pipe of a daemon on another host.
///
/// The remote host must accept key based authentication for the
/// configured user; the invocation never prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecureShell {
    host: String,
    port: u16,
    user: Option<String>,
    path: PathBuf,
    program: String,
}

impl Default for SecureShell {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_SSH_PORT,
            user: None,
            path: PathBuf::from(DEFAULT_PIPE_PATH),
            program: SSH_PROGRAM.to_string(),
        }
    }
}

impl SecureShell {
    pub fn new(options: &EndpointOptions) -> Self {
        let mut transport = Self::default();
        transport.configure(options);
        transport
    }

    /// Runs `program` in place of `ssh`.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{user}@{}", self.host),
            None => self.host.clone(),
        }
    }

    /// `[user@]host:port/path`, for messages.
    pub fn target(&self) -> String {
        format!("{}:{}{}", self.destination(), self.port, self.path.display())
    }

    /// Arguments of the remote invocation appending `line` to the pipe.
    pub fn args(&self, line: &str) -> Vec<String> {
        let remote = format!(
            "printf '%s\\n' {} >> {}",
            quote(line),
            quote(&self.path.to_string_lossy())
        );
        vec![
            "-o".into(),
            "BatchMode=yes".into(),
            "-o".into(),
            "KbdInteractiveAuthentication=no".into(),
            "-p".into(),
            self.port.to_string(),
            self.destination(),
            remote,
        ]
    }

    /// Starts delivering `command` without waiting for it.
    pub fn launch(&self, command: &str) -> Result<Delivery, TransportError> {
        let line = command_line(command, SystemTime::now())?;
        let args = self.args(&line);
        debug!(
            "icinga instance is on a different host, sending command {line:?} via {} to {}",
            self.program,
            self.target()
        );

        let mut ssh = Command::new(&self.program);
        ssh.args(&args);
        Delivery::spawn(ssh, &self.program, self.target())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CommandTransport for SecureShell {
    fn configure(&mut self, options: &EndpointOptions) {
        self.host = options
            .host
            .clone()
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        self.port = options.port.unwrap_or(DEFAULT_SSH_PORT);
        self.user = options.user.clone();
        self.path = options.path_or_default();
    }

    fn send(&self, command: &str) -> Result<(), TransportError> {
        self.launch(command)?.wait()
    }
}

/// A launched remote invocation.
///
/// Completion only reflects the local `ssh` process; whether the remote
/// daemon read the command cannot be observed from here. Stdout is
/// discarded; stderr is collected on a separate thread so a chatty process
/// never blocks on a full pipe.
#[derive(Debug)]
pub struct Delivery {
    child: Child,
    stderr: Option<JoinHandle<String>>,
    program: String,
    target: String,
}

impl Delivery {
    fn spawn(mut command: Command, program: &str, target: String) -> Result<Self, TransportError> {
        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| TransportError::Spawn {
                program: program.to_string(),
                target: target.clone(),
                source,
            })?;

        let stderr = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut output = Vec::new();
                let _ = pipe.read_to_end(&mut output);
                String::from_utf8_lossy(&output).into_owned()
            })
        });

        Ok(Delivery {
            child,
            stderr,
            program: program.to_string(),
            target,
        })
    }

    /// `Some(())` once the invocation finished successfully, `None` while running.
    pub fn try_wait(&mut self) -> Result<Option<()>, TransportError> {
        match self.child.try_wait() {
            Ok(None) => Ok(None),
            Ok(Some(status)) => {
                let output = self.output();
                finish(status, output, &self.target).map(Some)
            }
            Err(source) => Err(self.wait_error(source)),
        }
    }

    /// Blocks until the invocation finished.
    pub fn wait(mut self) -> Result<(), TransportError> {
        let status = self
            .child
            .wait()
            .map_err(|source| self.wait_error(source))?;
        let output = self.output();
        finish(status, output, &self.target)
    }

    /// Everything the process wrote to stderr. Only call once it exited.
    fn output(&mut self) -> String {
        self.stderr
            .take()
            .and_then(|reader| reader.join().ok())
            .unwrap_or_default()
    }

    fn wait_error(&self, source: std::io::Error) -> TransportError {
        TransportError::Spawn {
            program: self.program.clone(),
            target: self.target.clone(),
            source,
        }
    }
}

fn finish(status: ExitStatus, output: String, target: &str) -> Result<(), TransportError> {
    debug!("{target}: {status}: {output:?}");
    if status.success() {
        info!("handed command over to {target}");
        return Ok(());
    }

    let status = status
        .code()
        .map_or_else(|| status.to_string(), |code| code.to_string());
    let err = TransportError::Remote {
        target: target.to_string(),
        status,
        output: output.trim().to_string(),
    };
    error!("{err}");
    Err(err)
}

/// Single-quotes `s` for a POSIX shell.
fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}
