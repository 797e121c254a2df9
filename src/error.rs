//! Error taxonomy shared by the query client and the command pipe transports.
//!
//! Errors fall into four groups, mirroring where a failure is detected:
//!
//! - [`Error::Configuration`]: the caller handed us something unusable; found before any I/O.
//! - [`Error::Permission`]: the environment denies access to a local socket; found before any I/O.
//! - [`TransportError`]: the I/O layer failed (connect, read, write, process launch).
//! - [`ProtocolError`]: the backend answered, but with an error status or a malformed frame.
//!
//! Nothing here is retried internally.
use std::{io, path::PathBuf};

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid livestatus endpoint \"{endpoint}\": {reason}")]
    Configuration { endpoint: String, reason: String },

    #[error("cannot write to livestatus socket \"{}\"", .path.display())]
    Permission { path: PathBuf },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Failures of the byte-moving layer.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("cannot connect to livestatus socket \"{endpoint}\": {source}")]
    Connect { endpoint: String, source: io::Error },

    #[error("failed to read from livestatus socket \"{endpoint}\" ({read} of {expected} bytes): {source}")]
    Read {
        endpoint: String,
        read: usize,
        expected: usize,
        source: io::Error,
    },

    #[error("writing {expected} bytes to livestatus socket \"{endpoint}\" failed: {source}")]
    Write {
        endpoint: String,
        expected: usize,
        source: io::Error,
    },

    #[error("short write to livestatus socket \"{endpoint}\": wrote {written} of {expected} bytes")]
    ShortWrite {
        endpoint: String,
        written: usize,
        expected: usize,
    },

    #[error("failed to launch `{program}` for {target}: {source}")]
    Spawn {
        program: String,
        target: String,
        source: io::Error,
    },

    #[error("could not send command to remote icinga host {target}: {output} (exit status {status})")]
    Remote {
        target: String,
        status: String,
        output: String,
    },

    #[error("cannot write to command pipe \"{}\": {source}", .path.display())]
    Pipe { path: PathBuf, source: io::Error },

    #[error("refusing to send command {command:?}: it spans more than one line")]
    MultiLine { command: String },
}

/// The backend answered, but not with something we can use.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("malformed response header {header:?} from \"{endpoint}\"")]
    MalformedHeader { endpoint: String, header: String },

    #[error("short read from \"{endpoint}\": got {read} of {expected} bytes")]
    ShortRead {
        endpoint: String,
        read: usize,
        expected: usize,
    },

    #[error("problem while reading {length} bytes from livestatus (status {status}): {message}")]
    Status {
        status: u16,
        length: usize,
        message: String,
    },

    #[error("got invalid response body from livestatus: {reason}")]
    MalformedBody { reason: String },

    #[error("row {row} has {cells} cells but only {columns} column names")]
    ColumnMismatch {
        row: usize,
        cells: usize,
        columns: usize,
    },

    #[error("row {row} has {columns} column(s), key/value pairs need at least two")]
    PairColumns { row: usize, columns: usize },

    #[error("count query returned no rows")]
    MissingCount,

    #[error("count query returned non-numeric value {0}")]
    InvalidCount(String),
}
