use std::{
    io::{self, Read, Write},
    net::{Shutdown, TcpStream, ToSocketAddrs},
    time::Duration,
};

#[cfg(unix)]
use std::os::unix::net::UnixStream;

use log::{info, trace};

use super::Endpoint;

/// Optional limits for each blocking socket operation. `None` blocks forever.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Option<Duration>,
    pub read: Option<Duration>,
    pub write: Option<Duration>,
}

impl Timeouts {
    pub fn uniform(timeout: Duration) -> Self {
        Self {
            connect: Some(timeout),
            read: Some(timeout),
            write: Some(timeout),
        }
    }
}

/// Establishes byte streams to an [`Endpoint`].
pub trait Connector {
    type Stream: Read + Write;

    fn connect(&mut self, endpoint: &Endpoint, timeouts: &Timeouts) -> io::Result<Self::Stream>;
}

/// Connector opening real TCP or local domain sockets.
#[derive(Debug, Default, Clone, Copy)]
pub struct SocketConnector;

impl Connector for SocketConnector {
    type Stream = Socket;

    fn connect(&mut self, endpoint: &Endpoint, timeouts: &Timeouts) -> io::Result<Socket> {
        let socket = match endpoint {
            Endpoint::Tcp { host, port } => Socket::connect_tcp(host, *port, timeouts.connect)?,
            #[cfg(unix)]
            Endpoint::Local(path) => Socket {
                kind: Kind::Unix(UnixStream::connect(path)?),
            },
            #[cfg(not(unix))]
            Endpoint::Local(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    "local sockets are not supported on this platform",
                ));
            }
        };
        socket.set_timeouts(timeouts)?;
        info!("connected to livestatus at {endpoint}");
        Ok(socket)
    }
}

/// Either a `TcpStream` or a `UnixStream`, readable and writable transparently.
#[derive(Debug)]
pub struct Socket {
    kind: Kind,
}

#[derive(Debug)]
enum Kind {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Socket {
    fn connect_tcp(host: &str, port: u16, timeout: Option<Duration>) -> io::Result<Socket> {
        let stream = match timeout {
            None => TcpStream::connect((host, port))?,
            Some(timeout) => {
                let mut last_err = None;
                let mut connected = None;
                for addr in (host, port).to_socket_addrs()? {
                    trace!("trying {addr}");
                    match TcpStream::connect_timeout(&addr, timeout) {
                        Ok(stream) => {
                            connected = Some(stream);
                            break;
                        }
                        Err(e) => last_err = Some(e),
                    }
                }
                match connected {
                    Some(stream) => stream,
                    None => {
                        return Err(last_err.unwrap_or_else(|| {
                            io::Error::new(
                                io::ErrorKind::InvalidInput,
                                "host did not resolve to any address",
                            )
                        }));
                    }
                }
            }
        };
        stream.set_nodelay(true)?;
        Ok(Socket {
            kind: Kind::Tcp(stream),
        })
    }

    fn set_timeouts(&self, timeouts: &Timeouts) -> io::Result<()> {
        match &self.kind {
            Kind::Tcp(s) => {
                s.set_read_timeout(timeouts.read)?;
                s.set_write_timeout(timeouts.write)
            }
            #[cfg(unix)]
            Kind::Unix(s) => {
                s.set_read_timeout(timeouts.read)?;
                s.set_write_timeout(timeouts.write)
            }
        }
    }

    /// Returns a handle able to shut this socket down from another thread.
    pub fn abort_handle(&self) -> io::Result<AbortHandle> {
        let kind = match &self.kind {
            Kind::Tcp(s) => Kind::Tcp(s.try_clone()?),
            #[cfg(unix)]
            Kind::Unix(s) => Kind::Unix(s.try_clone()?),
        };
        Ok(AbortHandle {
            socket: Socket { kind },
        })
    }

    fn shutdown(&self) -> io::Result<()> {
        match &self.kind {
            Kind::Tcp(s) => s.shutdown(Shutdown::Both),
            #[cfg(unix)]
            Kind::Unix(s) => s.shutdown(Shutdown::Both),
        }
    }
}

impl Read for Socket {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.kind {
            Kind::Tcp(s) => s.read(buf),
            #[cfg(unix)]
            Kind::Unix(s) => s.read(buf),
        }
    }
}

impl Write for Socket {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.kind {
            Kind::Tcp(s) => s.write(buf),
            #[cfg(unix)]
            Kind::Unix(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.kind {
            Kind::Tcp(s) => s.flush(),
            #[cfg(unix)]
            Kind::Unix(s) => s.flush(),
        }
    }
}

/// Shuts down a live socket, failing any read or write blocked on it.
#[derive(Debug)]
pub struct AbortHandle {
    socket: Socket,
}

impl AbortHandle {
    pub fn abort(&self) -> io::Result<()> {
        self.socket.shutdown()
    }
}
