//! Response framing.
//!
//! Every response starts with a 16 byte header: a three digit status code,
//! a space, and the body length as a space padded decimal, terminated by a
//! newline.
//!
//! ```text
//! +-----+---+-------------+----+
//! | 200 |   |          15 | \n |
//! +-----+---+-------------+----+
//!  3 b   1 b     11 b      1 b
//! ```
use std::io::{ErrorKind, Read};

use log::trace;

use crate::error::{ProtocolError, Result, TransportError};

use super::Endpoint;

pub const HEADER_SIZE: usize = 16;
pub const STATUS_OK: u16 = 200;

const STATUS_SIZE: usize = 3;
const LENGTH_OFFSET: usize = STATUS_SIZE + 1;
const CHUNK_SIZE: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub status: u16,
    pub length: usize,
}

impl Header {
    pub fn parse(bytes: &[u8], endpoint: &Endpoint) -> Result<Self, ProtocolError> {
        let malformed = || ProtocolError::MalformedHeader {
            endpoint: endpoint.to_string(),
            header: String::from_utf8_lossy(bytes).into_owned(),
        };

        if bytes.len() != HEADER_SIZE {
            return Err(malformed());
        }

        let status = std::str::from_utf8(&bytes[..STATUS_SIZE])
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .ok_or_else(malformed)?;
        let length = std::str::from_utf8(&bytes[LENGTH_OFFSET..])
            .ok()
            .and_then(|s| s.trim().parse::<usize>().ok())
            .ok_or_else(malformed)?;

        Ok(Header { status, length })
    }

    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}

/// Reads exactly `expected` bytes, tolerating delivery across many reads.
///
/// The buffer grows with the bytes actually received, so a header announcing
/// more than the peer sends costs no more memory than what arrived. A
/// zero-byte read before `expected` is reached means the peer closed the
/// connection and is reported as [`ProtocolError::ShortRead`].
pub fn read_exact<R: Read>(reader: &mut R, expected: usize, endpoint: &Endpoint) -> Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(expected.min(CHUNK_SIZE));
    let mut chunk = [0; CHUNK_SIZE];

    while buffer.len() < expected {
        let want = (expected - buffer.len()).min(CHUNK_SIZE);
        let size = match reader.read(&mut chunk[..want]) {
            Ok(size) => size,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(TransportError::Read {
                    endpoint: endpoint.to_string(),
                    read: buffer.len(),
                    expected,
                    source,
                }
                .into());
            }
        };
        if size == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..size]);
        trace!("read {size} bytes ({} of {expected})", buffer.len());
    }

    if buffer.len() != expected {
        return Err(ProtocolError::ShortRead {
            endpoint: endpoint.to_string(),
            read: buffer.len(),
            expected,
        }
        .into());
    }

    Ok(buffer)
}
