//! Resource binding validation: allow-lists and request schemas must refer to real columns.

use crate::config::{ColumnType, TableDef};
use crate::error::ConfigError;
use crate::resource::Resource;
use crate::service::RequestSchema;

pub fn validate_table(resource: &'static str, table: &TableDef) -> Result<(), ConfigError> {
    let unknown = |column: &str, role: &'static str| ConfigError::UnknownColumn {
        resource,
        column: column.to_string(),
        role,
    };

    if !table.has_column(table.primary_key) {
        return Err(unknown(table.primary_key, "primary key"));
    }
    for (role, cols) in [
        ("unique", table.unique),
        ("filterable", table.filterable),
        ("sortable", table.sortable),
    ] {
        if let Some(c) = cols.iter().find(|c| !table.has_column(c)) {
            return Err(unknown(c, role));
        }
    }
    for c in table.searchable {
        match table.column(c).map(|c| c.ty) {
            Some(ColumnType::Text) | Some(ColumnType::Varchar(_)) => {}
            _ => return Err(unknown(c, "searchable text")),
        }
    }
    Ok(())
}

pub fn validate_schema(
    resource: &'static str,
    table: &TableDef,
    schema: &RequestSchema,
) -> Result<(), ConfigError> {
    let unusable = || ConfigError::UnknownRequestSchema {
        resource,
        schema: schema.name().to_string(),
    };
    if schema.is_empty() {
        return Err(unusable());
    }
    for field in schema.fields() {
        let writable = table.column(field).map(|c| !c.managed).unwrap_or(false);
        if !writable {
            return Err(unusable());
        }
    }
    Ok(())
}

/// Checks everything a resource binds before routes are mounted.
pub fn validate_resource<R: Resource>() -> Result<(), ConfigError> {
    let table = R::table();
    validate_table(R::NAME, table)?;
    validate_schema(R::NAME, table, &R::store_schema())?;
    validate_schema(R::NAME, table, &R::update_schema())?;
    Ok(())
}
