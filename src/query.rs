//! Query contract consumed by [`Connection`](crate::Connection).
//!
//! The connection only ever talks to a query through the [`Query`] trait: it
//! renders the request text, learns whether explicit columns were asked for
//! (and their aliases), and whether ordering or pagination has to be applied
//! client side. [`TableQuery`] is a small builder implementing the contract
//! for plain `GET <table>` requests.
//!
//! # Example
//! ```rust
//! use livestatus::{Query, TableQuery};
//!
//! let query = TableQuery::new("hosts")
//!     .columns(["host_name", "state"])
//!     .filter("state != 0")
//!     .limit(10);
//!
//! assert!(query.render().starts_with("GET hosts\nColumns: host_name state\n"));
//! assert_eq!(query.column_aliases(), ["host_name", "state"]);
//! ```
use std::{cmp::Ordering, fmt::Write};

use serde_json::Value;

use crate::protocol::{Cell, Row, cell_to_string};

/// Stats expression matching every row of `table`, for counting.
///
/// Livestatus rejects a stats expression on a column the table lacks, so
/// each table is counted through a column it is known to have.
pub fn default_count_stats(table: &str) -> &'static str {
    match table {
        "hostgroups" | "servicegroups" | "contactgroups" | "contacts" | "commands"
        | "timeperiods" | "columns" => "name !=",
        "downtimes" | "comments" => "id >= 0",
        "log" | "statehist" => "time >= 0",
        "status" => "program_start >= 0",
        _ => "state >= 0",
    }
}

/// What the connection needs to know about a query.
pub trait Query {
    /// Full request text, including the terminating blank line.
    fn render(&self) -> String;

    /// Request text for counting the rows the query would match, ignoring
    /// columns, ordering and pagination. The backend answers with a single
    /// row holding the count.
    fn render_count(&self) -> String;

    fn has_columns(&self) -> bool;

    /// Names for the cells of each row, used when [`Query::has_columns`].
    fn column_aliases(&self) -> Vec<String>;

    fn has_order(&self) -> bool {
        false
    }

    fn compare(&self, _a: &Row, _b: &Row) -> Ordering {
        Ordering::Equal
    }

    fn has_limit(&self) -> bool {
        false
    }

    fn offset(&self) -> usize {
        0
    }

    /// `None` means no upper bound after the offset.
    fn limit(&self) -> Option<usize> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Column {
    name: String,
    alias: Option<String>,
}

impl Column {
    fn alias(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Builder for `GET <table>` queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    table: String,
    columns: Vec<Column>,
    filters: Vec<String>,
    order: Vec<(String, Direction)>,
    limit: Option<usize>,
    offset: usize,
    count_stats: Option<String>,
    counting: bool,
}

impl TableQuery {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: vec![],
            filters: vec![],
            order: vec![],
            limit: None,
            offset: 0,
            count_stats: None,
            counting: false,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.columns.push(Column {
            name: name.into(),
            alias: None,
        });
        self
    }

    /// Requests column `name`, exposing it in result rows as `alias`.
    pub fn column_as(mut self, name: impl Into<String>, alias: impl Into<String>) -> Self {
        self.columns.push(Column {
            name: name.into(),
            alias: Some(alias.into()),
        });
        self
    }

    pub fn columns<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().fold(self, |query, name| query.column(name))
    }

    /// Adds a raw filter expression, e.g. `state = 2`. Filters are ANDed.
    pub fn filter(mut self, expr: impl Into<String>) -> Self {
        self.filters.push(expr.into());
        self
    }

    /// Orders rows by the column known as `alias` in the result.
    pub fn order_by(mut self, alias: impl Into<String>, direction: Direction) -> Self {
        self.order.push((alias.into(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Stats expression used when counting. Defaults to
    /// [`default_count_stats`] for the table; tables unknown there need one.
    pub fn count_stats(mut self, expr: impl Into<String>) -> Self {
        self.count_stats = Some(expr.into());
        self
    }

    /// Turns this query into its counting form.
    pub fn count(&mut self) {
        self.counting = true;
    }

    fn render_lines(&self) -> String {
        let mut out = format!("GET {}\n", self.table);

        if !self.counting && !self.columns.is_empty() {
            let names = self
                .columns
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>();
            let _ = writeln!(out, "Columns: {}", names.join(" "));
        }
        for filter in &self.filters {
            let _ = writeln!(out, "Filter: {filter}");
        }
        if self.counting {
            let stats = self
                .count_stats
                .as_deref()
                .unwrap_or_else(|| default_count_stats(&self.table));
            let _ = writeln!(out, "Stats: {stats}");
        }

        out.push_str("KeepAlive: on\n");
        out.push_str("OutputFormat: json\n");
        out.push_str("ResponseHeader: fixed16\n");
        out.push('\n');
        out
    }
}

impl Query for TableQuery {
    fn render(&self) -> String {
        self.render_lines()
    }

    fn render_count(&self) -> String {
        let mut count = self.clone();
        count.count();
        count.render_lines()
    }

    fn has_columns(&self) -> bool {
        !self.columns.is_empty()
    }

    fn column_aliases(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.alias().to_string()).collect()
    }

    fn has_order(&self) -> bool {
        !self.order.is_empty()
    }

    fn compare(&self, a: &Row, b: &Row) -> Ordering {
        for (alias, direction) in &self.order {
            let ord = compare_cells(a.get(alias), b.get(alias));
            let ord = match direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    fn has_limit(&self) -> bool {
        self.limit.is_some() || self.offset > 0
    }

    fn offset(&self) -> usize {
        self.offset
    }

    fn limit(&self) -> Option<usize> {
        self.limit
    }
}

/// Orders two cells; missing cells sort first, numbers numerically.
pub fn compare_cells(a: Option<&Cell>, b: Option<&Cell>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(a)), Some(Value::Number(b))) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => a
                .as_f64()
                .partial_cmp(&b.as_f64())
                .unwrap_or(Ordering::Equal),
        },
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (Some(a), Some(b)) => cell_to_string(a).cmp(&cell_to_string(b)),
    }
}
