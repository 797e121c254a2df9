use serde_json::Value;

use crate::{error::ProtocolError, query::Query};

use super::{Cell, Row, cell_to_string};

/// Ordered result rows after header association, ordering and pagination.
pub type RowSet = Vec<Row>;

/// Decodes a response body into rows of raw cells.
pub fn decode_body(body: &[u8]) -> Result<Vec<Vec<Cell>>, ProtocolError> {
    let malformed = |reason: String| ProtocolError::MalformedBody { reason };

    let value: Value = serde_json::from_slice(body).map_err(|e| malformed(e.to_string()))?;
    let Value::Array(rows) = value else {
        return Err(malformed(format!("expected a list of rows, got {value}")));
    };

    rows.into_iter()
        .enumerate()
        .map(|(i, row)| match row {
            Value::Array(cells) => Ok(cells),
            other => Err(malformed(format!("row {i} is not a list: {other}"))),
        })
        .collect()
}

/// Pairs decoded rows with column names and applies the query's ordering
/// and pagination.
///
/// Without explicit columns the first decoded row is the header record.
pub fn shape<Q: Query + ?Sized>(query: &Q, mut data: Vec<Vec<Cell>>) -> Result<RowSet, ProtocolError> {
    let headers = if query.has_columns() {
        query.column_aliases()
    } else if data.is_empty() {
        vec![]
    } else {
        data.remove(0).iter().map(cell_to_string).collect()
    };

    let mut rows = data
        .into_iter()
        .enumerate()
        .map(|(i, cells)| Row::from_cells(&headers, cells, i))
        .collect::<Result<RowSet, _>>()?;

    if query.has_order() {
        rows.sort_by(|a, b| query.compare(a, b));
    }

    if query.has_limit() {
        rows = rows
            .into_iter()
            .skip(query.offset())
            .take(query.limit().unwrap_or(usize::MAX))
            .collect();
    }

    Ok(rows)
}
