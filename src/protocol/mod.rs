//! Livestatus client protocol.
//!
//! This module implements the client side of the Livestatus line protocol used
//! by monitoring daemons (Icinga, Nagios with MK Livestatus, ...). A query is
//! free-form text; the answer is a fixed 16 byte header followed by a JSON body
//! of exactly the announced length.
//!
//! # Overview
//!
//! A [`Connection`] is created from an endpoint string, either a local
//! socket path or `tcp://host:port`. The socket itself is opened lazily by
//! the first query and kept for the lifetime of the connection.
//!
//! ```text
//! Query ──render──▶ Connection ──write──▶ socket
//!                       ▲                   │
//!                   RowSet ◀─shape◀─decode◀─┘ header + body
//! ```
//!
//! # Key Components
//!
//! - [`Endpoint`]: Where to connect, resolved once at construction.
//! - [`Connector`] / [`Socket`]: Establishes the byte stream; swappable in tests.
//! - [`ProtocolTransport`]: One write of the query, one framed read of the answer.
//! - [`Connection`]: Row-set, single row, key/value and count retrieval.
//!
//! # Example
//! ```no_run
//! use livestatus::{Connection, TableQuery};
//!
//! let mut conn = Connection::new("/var/lib/icinga/rw/live").unwrap();
//! let query = TableQuery::new("hosts").columns(["host_name", "state"]);
//!
//! for row in conn.fetch_all(&query).unwrap() {
//!     println!("{:?} {:?}", row.get("host_name"), row.get("state"));
//! }
//! ```
//!
//! # See Also
//!
//! - [`pipe`](crate::pipe): Delivery of external commands, which does not use this protocol.
mod connection;
mod endpoint;
mod frame;
mod response;
mod row;
mod socket;
mod transport;

pub use connection::{Connection, TABLES};
pub use endpoint::{Endpoint, Environment};
pub use frame::{HEADER_SIZE, Header};
pub use response::{RowSet, decode_body, shape};
pub use row::{Cell, Row, cell_to_string};
pub use socket::{AbortHandle, Connector, Socket, SocketConnector, Timeouts};
pub use transport::ProtocolTransport;
