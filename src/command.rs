//! Interactive client commands.
//!
//! This module defines the [`Command`] enum, the commands understood by the
//! `livestatus_cli` shell, and parses them from user input into
//! [`TableQuery`] values ready for a [`Connection`](crate::Connection).
//!
//! # Overview
//!
//! - `.exit`: Close the session.
//! - `.tables`: List the tables known to livestatus.
//! - `get <table> [column ...] [clauses]`: Fetch rows.
//! - `count <table> [clauses]`: Count matching rows.
//! - `pairs <table> <key> <value> [clauses]`: Fetch a key/value mapping.
//!
//! Clauses may follow in any order:
//!
//! - `filter <expression>`: e.g. `filter state = 2`, may repeat.
//! - `order <column> [asc|desc]`: may repeat.
//! - `limit <n>` / `offset <n>`
//!
//! # Example
//! ```rust
//! use livestatus::{Command, TableQuery};
//!
//! let cmd: Command = "get hosts host_name filter state = 1 limit 5".try_into().unwrap();
//! let expected = TableQuery::new("hosts").column("host_name").filter("state = 1").limit(5);
//! assert_eq!(cmd, Command::Get(expected));
//! ```
use thiserror::Error;

use crate::query::{Direction, TableQuery};

const CLAUSES: &[&str] = &["filter", "order", "limit", "offset"];

/// List of possible errors when parsing a command.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("unrecognized command '{0}'")]
    UnrecognizedCommand(String),

    #[error("invalid '{command}' command, {reason}")]
    InvalidCommandArguments { command: String, reason: String },

    #[error("no command provided")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Close the session `.exit`
    Exit,
    /// List known tables `.tables`
    Tables,
    /// Fetch all matching rows
    Get(TableQuery),
    /// Count matching rows
    Count(TableQuery),
    /// Fetch the first two columns as key/value pairs
    Pairs(TableQuery),
}

impl TryFrom<&str> for Command {
    type Error = CommandError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let mut parts = value.split_whitespace();
        let Some(name) = parts.next() else {
            return Err(CommandError::Empty);
        };
        let rest = parts.collect::<Vec<&str>>();

        match name.to_lowercase().as_str() {
            ".exit" => Ok(Command::Exit),
            ".tables" => Ok(Command::Tables),
            "get" => Ok(Command::Get(parse_query("get", &rest)?)),
            "count" => {
                let (query, columns) = parse_table("count", &rest)?;
                if !columns.is_empty() {
                    return Err(invalid("count", "takes no columns. Example: count hosts filter state = 1"));
                }
                Ok(Command::Count(query))
            }
            "pairs" => {
                let (query, columns) = parse_table("pairs", &rest)?;
                if columns.len() != 2 {
                    return Err(invalid(
                        "pairs",
                        "requires a key and a value column. Example: pairs hosts host_name state",
                    ));
                }
                Ok(Command::Pairs(query.columns(columns)))
            }
            _ => Err(CommandError::UnrecognizedCommand(value.trim().to_string())),
        }
    }
}

fn invalid(command: &str, reason: &str) -> CommandError {
    CommandError::InvalidCommandArguments {
        command: command.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_query(command: &str, parts: &[&str]) -> Result<TableQuery, CommandError> {
    let (query, columns) = parse_table(command, parts)?;
    Ok(query.columns(columns))
}

/// Parses `<table> [column ...] [clauses]`, returning the columns separately.
fn parse_table<'a>(command: &str, parts: &[&'a str]) -> Result<(TableQuery, Vec<&'a str>), CommandError> {
    let Some((table, rest)) = parts.split_first() else {
        return Err(invalid(command, "requires a table name. Example: get hosts"));
    };
    if CLAUSES.contains(table) {
        return Err(invalid(command, "requires a table name before any clause"));
    }

    let mut query = TableQuery::new(*table);
    let columns_end = rest
        .iter()
        .position(|p| CLAUSES.contains(p))
        .unwrap_or(rest.len());
    let columns = rest[..columns_end].to_vec();

    let mut clauses = &rest[columns_end..];
    while let Some((clause, tail)) = clauses.split_first() {
        let arg_end = tail
            .iter()
            .position(|p| CLAUSES.contains(p))
            .unwrap_or(tail.len());
        let args = &tail[..arg_end];
        clauses = &tail[arg_end..];

        query = match *clause {
            "filter" if !args.is_empty() => query.filter(args.join(" ")),
            "filter" => return Err(invalid(command, "filter requires an expression")),
            "order" => match args {
                [column] => query.order_by(*column, Direction::Asc),
                [column, dir] if dir.eq_ignore_ascii_case("asc") => query.order_by(*column, Direction::Asc),
                [column, dir] if dir.eq_ignore_ascii_case("desc") => {
                    query.order_by(*column, Direction::Desc)
                }
                _ => return Err(invalid(command, "order requires a column and optional asc|desc")),
            },
            "limit" => query.limit(parse_number(command, "limit", args)?),
            "offset" => query.offset(parse_number(command, "offset", args)?),
            other => return Err(invalid(command, &format!("unknown clause '{other}'"))),
        };
    }

    Ok((query, columns))
}

fn parse_number(command: &str, clause: &str, args: &[&str]) -> Result<usize, CommandError> {
    match args {
        [n] => n.parse::<usize>().map_err(|_| {
            invalid(
                command,
                &format!("{clause} requires a non-negative integer"),
            )
        }),
        _ => Err(invalid(command, &format!("{clause} requires exactly one number"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_from_string() {
        let inputs = vec![
            (".exit", Command::Exit),
            (".tables", Command::Tables),
            ("get status", Command::Get(TableQuery::new("status"))),
            (
                "GET hosts host_name state",
                Command::Get(TableQuery::new("hosts").columns(["host_name", "state"])),
            ),
            (
                "count services filter state = 2 filter acknowledged = 0",
                Command::Count(
                    TableQuery::new("services")
                        .filter("state = 2")
                        .filter("acknowledged = 0"),
                ),
            ),
            (
                "pairs hosts host_name state",
                Command::Pairs(TableQuery::new("hosts").columns(["host_name", "state"])),
            ),
        ];

        for (cmd, expected) in inputs {
            let command: Command = cmd.try_into().unwrap();
            assert_eq!(command, expected);
        }
    }

    #[test]
    fn command_with_all_clauses() {
        let command: Command = "get hosts host_name state order state desc order host_name limit 2 offset 1"
            .try_into()
            .unwrap();

        let expected = TableQuery::new("hosts")
            .columns(["host_name", "state"])
            .order_by("state", Direction::Desc)
            .order_by("host_name", Direction::Asc)
            .limit(2)
            .offset(1);
        assert_eq!(command, Command::Get(expected));
    }

    #[test]
    fn command_errors() {
        let inputs = vec![
            ("", CommandError::Empty),
            ("   ", CommandError::Empty),
            (".quit", CommandError::UnrecognizedCommand(".quit".into())),
        ];

        for (cmd, expected) in inputs {
            let err = Command::try_from(cmd).unwrap_err();
            assert_eq!(err, expected);
        }
    }

    #[test]
    fn invalid_arguments() {
        let inputs = vec![
            "get",
            "get limit 5",
            "get hosts limit",
            "get hosts limit five",
            "get hosts offset -1",
            "get hosts filter",
            "get hosts order",
            "get hosts order state sideways",
            "count hosts host_name",
            "pairs hosts host_name",
        ];

        for cmd in inputs {
            match Command::try_from(cmd) {
                Err(CommandError::InvalidCommandArguments { .. }) => {}
                other => panic!("expected invalid arguments for {cmd:?}, got {other:?}"),
            }
        }
    }
}
