use serde_json::{Map, Value};

use crate::error::ProtocolError;

/// One raw cell of a livestatus response.
pub type Cell = Value;

/// A result row: cells named after the query columns, in column order.
///
/// Column names are unique; when a header repeats a name the later cell
/// is the one found under that name, at the position of the first. The
/// cells themselves keep their positions in the response, see
/// [`Row::value`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    cells: Vec<Cell>,
    names: Vec<(String, usize)>,
}

impl Row {
    /// Pairs the decoded cells of row number `index` with `headers`.
    pub fn from_cells(headers: &[String], cells: Vec<Cell>, index: usize) -> Result<Self, ProtocolError> {
        if cells.len() > headers.len() {
            return Err(ProtocolError::ColumnMismatch {
                row: index,
                cells: cells.len(),
                columns: headers.len(),
            });
        }

        let mut names: Vec<(String, usize)> = Vec::with_capacity(cells.len());
        for (position, name) in headers.iter().take(cells.len()).enumerate() {
            match names.iter_mut().find(|(n, _)| n == name) {
                Some((_, existing)) => *existing = position,
                None => names.push((name.clone(), position)),
            }
        }
        Ok(Row { cells, names })
    }

    pub fn get(&self, name: &str) -> Option<&Cell> {
        self.names
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, position)| &self.cells[*position])
    }

    /// Cell at position `index` of the response row, duplicates included.
    pub fn value(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    /// Number of cells in the response row, duplicates included.
    pub fn width(&self) -> usize {
        self.cells.len()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Cell)> {
        self.names
            .iter()
            .map(|(n, position)| (n.as_str(), &self.cells[*position]))
    }

    /// Number of distinct columns.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn into_map(mut self) -> Map<String, Value> {
        self.names
            .into_iter()
            .map(|(name, position)| (name, self.cells[position].take()))
            .collect()
    }
}

/// Renders a cell as a plain string, without JSON quoting for strings.
pub fn cell_to_string(cell: &Cell) -> String {
    match cell {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn row_keeps_column_order() {
        let row = Row::from_cells(
            &headers(&["name", "state", "address"]),
            vec![json!("web01"), json!(0), json!("10.0.0.1")],
            0,
        )
        .unwrap();

        assert_eq!(row.columns().collect::<Vec<_>>(), ["name", "state", "address"]);
        assert_eq!(row.get("state"), Some(&json!(0)));
        assert_eq!(row.value(2), Some(&json!("10.0.0.1")));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn row_duplicate_column_replaces_value() {
        let row = Row::from_cells(&headers(&["name", "name"]), vec![json!("a"), json!("b")], 0).unwrap();

        assert_eq!(row.len(), 1);
        assert_eq!(row.get("name"), Some(&json!("b")));
        assert_eq!(row.width(), 2);
        assert_eq!(row.value(0), Some(&json!("a")));
        assert_eq!(row.value(1), Some(&json!("b")));
        assert_eq!(row.into_map().len(), 1);
    }

    #[test]
    fn row_with_too_many_cells() {
        let err = Row::from_cells(&headers(&["name"]), vec![json!("a"), json!(1)], 3).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::ColumnMismatch {
                row: 3,
                cells: 2,
                columns: 1
            }
        );
    }

    #[test]
    fn cell_strings_are_unquoted() {
        assert_eq!(cell_to_string(&json!("web01")), "web01");
        assert_eq!(cell_to_string(&json!(3)), "3");
        assert_eq!(cell_to_string(&json!(null)), "null");
    }
}
