pub mod cli;
pub mod command;
pub mod error;
pub mod pipe;
pub mod protocol;
pub mod query;

pub use cli::{print_rows, prompt};
pub use command::{Command, CommandError};
pub use error::{Error, ProtocolError, Result, TransportError};
pub use protocol::{Connection, Endpoint, Environment, Row, RowSet, Timeouts};
pub use query::{Direction, Query, TableQuery};
