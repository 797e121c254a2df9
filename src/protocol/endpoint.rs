use std::{
    fmt,
    path::{Path, PathBuf},
};

use crate::error::{Error, Result};

const TCP_SCHEME: &str = "tcp://";

/// Resolved connection target of a livestatus backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Local domain socket, e.g. `/var/lib/icinga/rw/live`
    Local(PathBuf),
    /// TCP socket, configured as `tcp://host:port`
    Tcp { host: String, port: u16 },
}

/// Platform capabilities consulted while resolving an endpoint.
///
/// Handed to the connection explicitly so that construction never probes
/// global state on its own; tests substitute their own view of the world.
#[derive(Debug, Clone, Copy)]
pub struct Environment {
    /// Whether local domain sockets can be opened at all.
    pub unix_sockets: bool,
    /// Whether the current process may write to the given path.
    pub is_writable: fn(&Path) -> bool,
}

impl Environment {
    pub fn detect() -> Self {
        Self {
            unix_sockets: cfg!(unix),
            is_writable: process_can_write,
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::detect()
    }
}

#[cfg(unix)]
fn process_can_write(path: &Path) -> bool {
    use nix::unistd::{AccessFlags, access};

    access(path, AccessFlags::W_OK).is_ok()
}

#[cfg(not(unix))]
fn process_can_write(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| !m.permissions().readonly())
        .unwrap_or(false)
}

impl Endpoint {
    /// Parses a configured endpoint string.
    ///
    /// A value starting with `/` names a local socket, which must be writable
    /// by this process. Anything else has to look like `tcp://host:port`.
    pub fn parse(endpoint: &str, env: &Environment) -> Result<Self> {
        if endpoint.starts_with('/') {
            if !env.unix_sockets {
                return Err(Error::Configuration {
                    endpoint: endpoint.to_string(),
                    reason: "local sockets are not supported on this platform".to_string(),
                });
            }

            let path = PathBuf::from(endpoint);
            if !(env.is_writable)(&path) {
                return Err(Error::Permission { path });
            }
            return Ok(Endpoint::Local(path));
        }

        let invalid = |reason: &str| Error::Configuration {
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        };

        let rest = endpoint
            .strip_prefix(TCP_SCHEME)
            .ok_or_else(|| invalid("invalid TCP socket syntax, expected tcp://host:port"))?;
        let (host, port) = rest
            .rsplit_once(':')
            .ok_or_else(|| invalid("missing port, expected tcp://host:port"))?;

        if host.is_empty() || host.contains(':') {
            return Err(invalid("invalid host, expected tcp://host:port"));
        }
        if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("port must be a decimal number"));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| invalid("port out of range"))?;

        Ok(Endpoint::Tcp {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Local(path) => write!(f, "{}", path.display()),
            Endpoint::Tcp { host, port } => write!(f, "{host}:{port}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;

    use tempdir::TempDir;

    use super::*;

    fn permissive() -> Environment {
        Environment {
            unix_sockets: true,
            is_writable: |_| true,
        }
    }

    #[test]
    fn parse_tcp_endpoint() {
        let endpoint = Endpoint::parse("tcp://monitoring.example.com:6557", &permissive()).unwrap();
        assert_eq!(
            endpoint,
            Endpoint::Tcp {
                host: "monitoring.example.com".into(),
                port: 6557
            }
        );
        assert_eq!(endpoint.to_string(), "monitoring.example.com:6557");
    }

    #[test]
    fn parse_invalid_endpoints() {
        let inputs = vec![
            "",
            "live",
            "localhost:6557",
            "udp://localhost:6557",
            "tcp://localhost",
            "tcp://:6557",
            "tcp://localhost:",
            "tcp://localhost:65536",
            "tcp://localhost:65x",
            "tcp://a:b:1",
        ];

        for input in inputs {
            match Endpoint::parse(input, &permissive()) {
                Err(Error::Configuration { endpoint, .. }) => assert_eq!(endpoint, input),
                other => panic!("expected configuration error for {input:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn parse_writable_local_socket() {
        let temp = TempDir::new("endpoint").unwrap();
        let path = temp.path().join("live");
        File::create(&path).unwrap();

        let endpoint = Endpoint::parse(path.to_str().unwrap(), &Environment::detect()).unwrap();
        assert_eq!(endpoint, Endpoint::Local(path));
    }

    #[test]
    fn parse_missing_local_socket() {
        let temp = TempDir::new("endpoint").unwrap();
        let path = temp.path().join("does-not-exist");

        match Endpoint::parse(path.to_str().unwrap(), &Environment::detect()) {
            Err(Error::Permission { path: denied }) => assert_eq!(denied, path),
            other => panic!("expected permission error, got {other:?}"),
        }
    }

    #[test]
    fn parse_unwritable_local_socket() {
        let env = Environment {
            unix_sockets: true,
            is_writable: |_| false,
        };

        let err = Endpoint::parse("/var/lib/icinga/rw/live", &env).unwrap_err();
        assert!(matches!(err, Error::Permission { .. }));
        assert!(err.to_string().contains("/var/lib/icinga/rw/live"));
    }

    #[test]
    fn parse_local_socket_without_support() {
        let env = Environment {
            unix_sockets: false,
            is_writable: |_| true,
        };

        let err = Endpoint::parse("/var/lib/icinga/rw/live", &env).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }
}
