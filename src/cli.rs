//! CLI utilities for the livestatus shell.
//!
//! The utilities present in this module can be used to create a CLI tool
//! around a [`Connection`](crate::Connection).
use std::io::{self, BufRead, Write};

use crate::protocol::Row;

/// Prompts for one line of input; `None` once the input is exhausted.
pub fn prompt<R, W>(mut reader: R, mut writer: W) -> io::Result<Option<String>>
where
    R: BufRead,
    W: Write,
{
    write!(&mut writer, "> ")?;
    writer.flush()?;

    let mut s = String::default();
    if reader.read_line(&mut s)? == 0 {
        return Ok(None);
    }
    Ok(Some(s.trim_end().to_string()))
}

/// Writes every row as one JSON object per line.
pub fn print_rows<W: Write>(mut writer: W, rows: Vec<Row>) -> io::Result<()> {
    for row in rows {
        writeln!(writer, "{}", serde_json::Value::Object(row.into_map()))?;
    }
    Ok(())
}
