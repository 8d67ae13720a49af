//! Builds parameterized SELECT, COUNT, INSERT, UPDATE, DELETE from static table metadata.

use crate::config::{ColumnDef, TableDef};
use crate::query::ResolvedQuery;
use serde_json::{Map, Value};

/// Quote identifier for PostgreSQL (safe: only from table metadata).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
pub fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(table))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }

    /// Push a value and return its placeholder cast to the column type (e.g. `$2::numeric`).
    fn push_cast(&mut self, column: &ColumnDef, v: Value) -> String {
        let n = self.push_param(v);
        format!("${}::{}", n, column.ty.cast())
    }
}

fn select_column_list(table: &TableDef) -> String {
    table
        .columns
        .iter()
        .map(|c| quoted(c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Escape LIKE wildcards so the term matches literally, then wrap for "contains".
pub fn contains_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

/// Filters ANDed together, then one ORed search group over the searchable columns.
fn where_clause(table: &TableDef, q: &mut QueryBuf, query: &ResolvedQuery) -> String {
    let mut parts = Vec::new();
    for (column, value) in &query.filters {
        let ph = q.push_cast(column, value.clone());
        parts.push(format!("{} = {}", quoted(column.name), ph));
    }
    if let Some(term) = &query.search {
        if !table.searchable.is_empty() {
            let n = q.push_param(Value::String(contains_pattern(term)));
            let group = table
                .searchable
                .iter()
                .map(|c| format!("{} ILIKE ${}", quoted(c), n))
                .collect::<Vec<_>>()
                .join(" OR ");
            parts.push(format!("({})", group));
        }
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

/// One page of rows ordered by the requested column; ties broken by primary key ascending.
pub fn select_page(table: &TableDef, schema: &str, query: &ResolvedQuery) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(table, &mut q, query);
    let mut order = format!(" ORDER BY {} {}", quoted(query.sort.name), query.order.as_sql());
    if query.sort.name != table.primary_key {
        order.push_str(&format!(", {} ASC", quoted(table.primary_key)));
    }
    q.sql = format!(
        "SELECT {} FROM {}{}{} LIMIT {} OFFSET {}",
        select_column_list(table),
        qualified_table(schema, table.name),
        where_sql,
        order,
        query.limit(),
        query.offset()
    );
    q
}

/// Total rows matching the same filters and search as `select_page`.
pub fn count(table: &TableDef, schema: &str, query: &ResolvedQuery) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(table, &mut q, query);
    q.sql = format!(
        "SELECT COUNT(*) FROM {}{}",
        qualified_table(schema, table.name),
        where_sql
    );
    q
}

/// SELECT by primary key.
pub fn select_by_id(table: &TableDef, schema: &str, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(Value::from(id));
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = ${}",
        select_column_list(table),
        qualified_table(schema, table.name),
        quoted(table.primary_key),
        n
    );
    q
}

/// INSERT of the writable columns. Absent values with a column default are omitted so the
/// database applies the default; other absent values are inserted as NULL.
pub fn insert(table: &TableDef, schema: &str, body: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in table.writable() {
        let val = body.get(c.name).cloned();
        if val.is_none() && c.default.is_some() {
            continue;
        }
        let ph = q.push_cast(c, val.unwrap_or(Value::Null));
        cols.push(quoted(c.name));
        placeholders.push(ph);
    }
    let target = qualified_table(schema, table.name);
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", target, select_column_list(table))
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            target,
            cols.join(", "),
            placeholders.join(", "),
            select_column_list(table)
        )
    };
    q
}

/// UPDATE by id: SET only writable columns present in body, and bump `updated_at`.
pub fn update(table: &TableDef, schema: &str, id: i64, body: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let target = qualified_table(schema, table.name);
    let mut sets = Vec::new();
    for c in table.writable() {
        let Some(v) = body.get(c.name) else { continue };
        let rhs = q.push_cast(c, v.clone());
        sets.push(format!("{} = {}", quoted(c.name), rhs));
    }
    if table.has_column("updated_at") {
        sets.push(format!("{} = NOW()", quoted("updated_at")));
    }
    let id_param = q.push_param(Value::from(id));
    if sets.is_empty() {
        q.sql = format!(
            "SELECT {} FROM {} WHERE {} = ${}",
            select_column_list(table),
            target,
            quoted(table.primary_key),
            id_param
        );
        return q;
    }
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ${} RETURNING {}",
        target,
        sets.join(", "),
        quoted(table.primary_key),
        id_param,
        select_column_list(table)
    );
    q
}

/// DELETE by id, returning the id so a missing row is detectable.
pub fn delete(table: &TableDef, schema: &str, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(Value::from(id));
    q.sql = format!(
        "DELETE FROM {} WHERE {} = ${} RETURNING {}",
        qualified_table(schema, table.name),
        quoted(table.primary_key),
        n,
        quoted(table.primary_key)
    );
    q
}

/// Whether another row already holds `value` in `column`, optionally ignoring one id.
pub fn exists(
    table: &TableDef,
    schema: &str,
    column: &ColumnDef,
    value: &Value,
    except_id: Option<i64>,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_cast(column, value.clone());
    let mut cond = format!("{} = {}", quoted(column.name), ph);
    if let Some(id) = except_id {
        let n = q.push_param(Value::from(id));
        cond.push_str(&format!(" AND {} <> ${}", quoted(table.primary_key), n));
    }
    q.sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE {})",
        qualified_table(schema, table.name),
        cond
    );
    q
}
