//! Static table metadata: columns, constraints, and the per-resource query allow-lists.

use rust_decimal::Decimal;
use serde_json::Value;
use std::cmp::Ordering;
use std::str::FromStr;

/// Storage type of a column. Drives DDL, bind casts, filter parsing and in-memory comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    BigSerial,
    Integer,
    Decimal { precision: u32, scale: u32 },
    Varchar(u32),
    Text,
    Timestamp,
}

impl ColumnType {
    /// Type used in CREATE TABLE.
    pub fn sql_type(&self) -> String {
        match self {
            ColumnType::BigSerial => "BIGSERIAL".into(),
            ColumnType::Integer => "INTEGER".into(),
            ColumnType::Decimal { precision, scale } => format!("NUMERIC({}, {})", precision, scale),
            ColumnType::Varchar(n) => format!("VARCHAR({})", n),
            ColumnType::Text => "TEXT".into(),
            ColumnType::Timestamp => "TIMESTAMPTZ".into(),
        }
    }

    /// Cast applied to bound parameters (e.g. `$1::numeric`).
    pub fn cast(&self) -> &'static str {
        match self {
            ColumnType::BigSerial => "bigint",
            ColumnType::Integer => "integer",
            ColumnType::Decimal { .. } => "numeric",
            ColumnType::Varchar(_) | ColumnType::Text => "text",
            ColumnType::Timestamp => "timestamptz",
        }
    }

    /// Parse a query-string value for an equality filter on this column.
    pub fn parse_filter(&self, raw: &str) -> Result<Value, String> {
        let raw = raw.trim();
        match self {
            ColumnType::BigSerial => raw
                .parse::<i64>()
                .map(|n| Value::Number(n.into()))
                .map_err(|_| "expects an integer".to_string()),
            ColumnType::Integer => match raw.parse::<i64>() {
                Ok(n) => i32::try_from(n)
                    .map(|n| Value::Number(n.into()))
                    .map_err(|_| format!("is out of range [{}, {}]", i32::MIN, i32::MAX)),
                Err(_) => Err("expects an integer".to_string()),
            },
            ColumnType::Decimal { scale, .. } => Decimal::from_str(raw)
                .map(|d| Value::String(rescaled(d, *scale)))
                .map_err(|_| "expects a number".to_string()),
            ColumnType::Timestamp => chrono::DateTime::parse_from_rfc3339(raw)
                .map(|d| Value::String(d.with_timezone(&chrono::Utc).to_rfc3339()))
                .map_err(|_| "expects an RFC 3339 timestamp".to_string()),
            ColumnType::Varchar(_) | ColumnType::Text => Ok(Value::String(raw.to_string())),
        }
    }

    /// Inclusive bounds of the values the column can hold; `None` for non-numeric columns.
    /// `NUMERIC(10, 2)` holds at most `99999999.99`.
    pub fn range(&self) -> Option<(Decimal, Decimal)> {
        match self {
            ColumnType::BigSerial => Some((Decimal::from(i64::MIN), Decimal::from(i64::MAX))),
            ColumnType::Integer => Some((Decimal::from(i32::MIN), Decimal::from(i32::MAX))),
            ColumnType::Decimal { precision, scale } => {
                let max = Decimal::from_i128_with_scale(10i128.pow(*precision) - 1, *scale);
                Some((-max, max))
            }
            ColumnType::Varchar(_) | ColumnType::Text | ColumnType::Timestamp => None,
        }
    }

    /// Whether a stored value fits the column's numeric range. Non-numeric values pass.
    pub fn fits(&self, v: &Value) -> bool {
        match (self.range(), decimal_of(v)) {
            (Some((min, max)), Some(d)) => d >= min && d <= max,
            _ => true,
        }
    }

    /// Normalize a value the way the database would store it (decimals to their scale).
    pub fn coerce(&self, v: &Value) -> Value {
        match (self, v) {
            (ColumnType::Decimal { scale, .. }, Value::String(s)) => Decimal::from_str(s)
                .map(|d| Value::String(rescaled(d, *scale)))
                .unwrap_or_else(|_| v.clone()),
            (ColumnType::Decimal { scale, .. }, Value::Number(n)) => n
                .to_string()
                .parse::<Decimal>()
                .map(|d| Value::String(rescaled(d, *scale)))
                .unwrap_or_else(|_| v.clone()),
            _ => v.clone(),
        }
    }

    /// Ordering of two stored values. NULL sorts after everything, as PostgreSQL does for ASC.
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        match (a.is_null(), b.is_null()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            _ => {}
        }
        match self {
            ColumnType::BigSerial | ColumnType::Integer => a.as_i64().cmp(&b.as_i64()),
            ColumnType::Decimal { .. } => decimal_of(a).cmp(&decimal_of(b)),
            ColumnType::Timestamp => timestamp_of(a).cmp(&timestamp_of(b)),
            ColumnType::Varchar(_) | ColumnType::Text => a.as_str().cmp(&b.as_str()),
        }
    }
}

fn rescaled(mut d: Decimal, scale: u32) -> String {
    d.rescale(scale);
    d.to_string()
}

fn decimal_of(v: &Value) -> Option<Decimal> {
    match v {
        Value::String(s) => Decimal::from_str(s).ok(),
        Value::Number(n) => n.to_string().parse().ok(),
        _ => None,
    }
}

fn timestamp_of(v: &Value) -> Option<chrono::DateTime<chrono::Utc>> {
    v.as_str()
        .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&chrono::Utc))
}

#[derive(Clone, Copy, Debug)]
pub struct ColumnDef {
    pub name: &'static str,
    pub ty: ColumnType,
    pub nullable: bool,
    /// SQL default expression.
    pub default: Option<&'static str>,
    /// SQL CHECK expression.
    pub check: Option<&'static str>,
    /// Maintained by the store (primary key and timestamps); never written from input.
    pub managed: bool,
}

impl ColumnDef {
    pub const fn new(name: &'static str, ty: ColumnType) -> Self {
        ColumnDef {
            name,
            ty,
            nullable: false,
            default: None,
            check: None,
            managed: false,
        }
    }

    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub const fn default(mut self, expr: &'static str) -> Self {
        self.default = Some(expr);
        self
    }

    pub const fn check(mut self, expr: &'static str) -> Self {
        self.check = Some(expr);
        self
    }

    pub const fn managed(mut self) -> Self {
        self.managed = true;
        self
    }
}

#[derive(Debug)]
pub struct TableDef {
    pub name: &'static str,
    pub primary_key: &'static str,
    pub columns: &'static [ColumnDef],
    pub unique: &'static [&'static str],
    /// Columns accepted in `filters[...]`.
    pub filterable: &'static [&'static str],
    /// Columns matched by `search`.
    pub searchable: &'static [&'static str],
    /// Columns accepted in `sort_by`.
    pub sortable: &'static [&'static str],
}

impl TableDef {
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Columns that may be written from validated input.
    pub fn writable(&self) -> impl Iterator<Item = &ColumnDef> {
        self.columns.iter().filter(|c| !c.managed)
    }
}
