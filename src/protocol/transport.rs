use std::io::{Read, Write};

use log::trace;

use crate::error::{ProtocolError, Result, TransportError};

use super::{
    Endpoint,
    frame::{HEADER_SIZE, Header, read_exact},
};

/// One live byte stream to a livestatus backend, speaking the fixed16 framing.
pub struct ProtocolTransport<T: Read + Write> {
    stream: T,
    endpoint: Endpoint,
}

impl<T: Read + Write> ProtocolTransport<T> {
    pub fn new(stream: T, endpoint: Endpoint) -> Self {
        Self { stream, endpoint }
    }

    pub fn get_ref(&self) -> &T {
        &self.stream
    }

    /// Writes the rendered query with a single write call.
    pub fn write_query(&mut self, query: &str) -> Result<()> {
        let bytes = query.as_bytes();
        let expected = bytes.len();

        let written = self
            .stream
            .write(bytes)
            .and_then(|written| self.stream.flush().map(|_| written))
            .map_err(|source| TransportError::Write {
                endpoint: self.endpoint.to_string(),
                expected,
                source,
            })?;

        if written != expected {
            return Err(TransportError::ShortWrite {
                endpoint: self.endpoint.to_string(),
                written,
                expected,
            }
            .into());
        }
        trace!("wrote {written} bytes to {}", self.endpoint);
        Ok(())
    }

    /// Reads one framed response and returns its body.
    ///
    /// A non-200 status turns the body into the error message.
    pub fn read_response(&mut self) -> Result<Vec<u8>> {
        let raw = read_exact(&mut self.stream, HEADER_SIZE, &self.endpoint)?;
        let header = Header::parse(&raw, &self.endpoint)?;
        trace!("response header: {header:?}");

        let body = read_exact(&mut self.stream, header.length, &self.endpoint)?;
        if !header.is_ok() {
            return Err(ProtocolError::Status {
                status: header.status,
                length: header.length,
                message: String::from_utf8_lossy(&body).trim_end().to_string(),
            }
            .into());
        }

        Ok(body)
    }
}
