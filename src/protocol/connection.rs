use std::{collections::HashMap, time::Instant};

use log::{debug, info, trace};
use serde_json::Value;

use crate::{
    error::{Error, ProtocolError, Result, TransportError},
    query::Query,
};

use super::{
    AbortHandle, Cell, Connector, Endpoint, Environment, ProtocolTransport, Row, RowSet, Socket,
    SocketConnector, Timeouts, cell_to_string,
    response::{decode_body, shape},
};

/// Tables a livestatus backend is known to provide.
pub const TABLES: &[&str] = &[
    "hosts",
    "services",
    "hostgroups",
    "servicegroups",
    "contactgroups",
    "servicesbygroup",
    "servicesbyhostgroup",
    "hostsbygroup",
    "contacts",
    "commands",
    "timeperiods",
    "downtimes",
    "comments",
    "log",
    "status",
    "columns",
    "statehist",
];

/// A client connection to one livestatus backend.
///
/// The underlying stream is opened lazily on first use and kept open
/// between queries. At most one stream is held at a time; after
/// [`Connection::disconnect`] the next query opens a fresh one. Dropping the
/// connection closes the stream.
///
/// A connection is not meant to be shared between threads; use one
/// connection per thread instead.
pub struct Connection<C: Connector = SocketConnector> {
    endpoint: Endpoint,
    connector: C,
    timeouts: Timeouts,
    transport: Option<ProtocolTransport<C::Stream>>,
}

impl Connection<SocketConnector> {
    /// Creates a connection to `endpoint`, either a local socket path
    /// (`/var/lib/icinga/rw/live`) or `tcp://host:port`.
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_environment(endpoint, &Environment::detect())
    }

    pub fn with_environment(endpoint: &str, env: &Environment) -> Result<Self> {
        Self::with_connector(endpoint, env, SocketConnector)
    }

    /// Handle able to abort a query blocked on this connection from another
    /// thread. `None` while disconnected.
    pub fn abort_handle(&self) -> Result<Option<AbortHandle>> {
        let Some(transport) = &self.transport else {
            return Ok(None);
        };
        let socket: &Socket = transport.get_ref();
        let handle = socket
            .abort_handle()
            .map_err(|source| TransportError::Connect {
                endpoint: self.endpoint.to_string(),
                source,
            })?;
        Ok(Some(handle))
    }
}

impl<C: Connector> Connection<C> {
    pub fn with_connector(endpoint: &str, env: &Environment, connector: C) -> Result<Self> {
        let endpoint = Endpoint::parse(endpoint, env)?;
        Ok(Self {
            endpoint,
            connector,
            timeouts: Timeouts::default(),
            transport: None,
        })
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    pub fn has_table(&self, name: &str) -> bool {
        TABLES.contains(&name)
    }

    /// Opens the stream unless one is already open.
    pub fn connect(&mut self) -> Result<&mut Self> {
        self.transport()?;
        Ok(self)
    }

    /// Closes the stream, if any.
    pub fn disconnect(&mut self) {
        if self.transport.take().is_some() {
            info!("disconnected from livestatus at {}", self.endpoint);
        }
    }

    fn transport(&mut self) -> Result<&mut ProtocolTransport<C::Stream>> {
        let transport = match self.transport.take() {
            Some(transport) => transport,
            None => {
                let stream = self
                    .connector
                    .connect(&self.endpoint, &self.timeouts)
                    .map_err(|source| TransportError::Connect {
                        endpoint: self.endpoint.to_string(),
                        source,
                    })?;
                ProtocolTransport::new(stream, self.endpoint.clone())
            }
        };
        Ok(self.transport.insert(transport))
    }

    /// Sends raw query text and returns the decoded rows of cells.
    ///
    /// No header association, ordering or pagination happens here.
    pub fn do_fetch(&mut self, query: &str) -> Result<Vec<Vec<Cell>>> {
        trace!("livestatus query:\n{query}");
        let transport = self.transport()?;
        let body = match transport
            .write_query(query)
            .and_then(|_| transport.read_response())
        {
            Ok(body) => body,
            Err(err) => {
                // a complete error frame leaves the stream usable
                if !matches!(err, Error::Protocol(ProtocolError::Status { .. })) {
                    self.disconnect();
                }
                return Err(err);
            }
        };
        Ok(decode_body(&body)?)
    }

    pub fn fetch_all<Q: Query + ?Sized>(&mut self, query: &Q) -> Result<RowSet> {
        let started = Instant::now();
        debug!("sending livestatus query");
        let data = self.do_fetch(&query.render())?;
        debug!("got livestatus data after {:?}", started.elapsed());

        let rows = shape(query, data)?;
        debug!(
            "{} rows sorted and limited after {:?}",
            rows.len(),
            started.elapsed()
        );
        Ok(rows)
    }

    pub fn fetch_row<Q: Query + ?Sized>(&mut self, query: &Q) -> Result<Option<Row>> {
        Ok(self.fetch_all(query)?.into_iter().next())
    }

    /// Maps the first cell of every row to its second cell, by position in
    /// the response even when header names repeat. Later rows win on
    /// duplicate keys.
    pub fn fetch_pairs<Q: Query + ?Sized>(&mut self, query: &Q) -> Result<HashMap<String, Value>> {
        let rows = self.fetch_all(query)?;
        let mut pairs = HashMap::with_capacity(rows.len());

        for (i, row) in rows.into_iter().enumerate() {
            let (Some(key), Some(value)) = (row.value(0), row.value(1)) else {
                return Err(ProtocolError::PairColumns {
                    row: i,
                    columns: row.width(),
                }
                .into());
            };
            pairs.insert(cell_to_string(key), value.clone());
        }

        Ok(pairs)
    }

    /// Counts the rows matching the query, ignoring its pagination.
    ///
    /// The backend answers with a 400 status when the query's stats
    /// expression names a column its table lacks; see
    /// [`TableQuery::count_stats`](crate::TableQuery::count_stats).
    pub fn count<Q: Query + ?Sized>(&mut self, query: &Q) -> Result<u64> {
        let started = Instant::now();
        debug!("sending livestatus count query");
        let data = self.do_fetch(&query.render_count())?;
        debug!("got livestatus count result after {:?}", started.elapsed());

        let cell = data
            .first()
            .and_then(|row| row.first())
            .ok_or(ProtocolError::MissingCount)?;

        let count = match cell {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        Ok(count.ok_or_else(|| ProtocolError::InvalidCount(cell.to_string()))?)
    }
}

impl<C: Connector> Drop for Connection<C> {
    fn drop(&mut self) {
        self.disconnect();
    }
}
