//! DDL for resource tables, generated from their static `TableDef`.
//! Idempotent: schema and tables use IF NOT EXISTS.

use crate::config::TableDef;
use crate::error::AppError;
use crate::sql::{qualified_table, quoted};
use sqlx::PgPool;

/// `CREATE TABLE IF NOT EXISTS` with NOT NULL, defaults, primary key, named unique
/// constraints (`{table}_{column}_unique`) and checks (`{table}_{column}_check`).
pub fn create_table_sql(table: &TableDef, schema: &str) -> String {
    let mut defs: Vec<String> = Vec::new();
    for c in table.columns {
        let mut def = format!("{} {}", quoted(c.name), c.ty.sql_type());
        if !c.nullable {
            def.push_str(" NOT NULL");
        }
        if let Some(d) = c.default {
            def.push_str(" DEFAULT ");
            def.push_str(d);
        }
        defs.push(def);
    }
    defs.push(format!("PRIMARY KEY ({})", quoted(table.primary_key)));
    for u in table.unique {
        defs.push(format!(
            "CONSTRAINT {} UNIQUE ({})",
            quoted(&format!("{}_{}_unique", table.name, u)),
            quoted(u)
        ));
    }
    for c in table.columns {
        if let Some(expr) = c.check {
            defs.push(format!(
                "CONSTRAINT {} CHECK ({})",
                quoted(&format!("{}_{}_check", table.name, c.name)),
                expr
            ));
        }
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
        qualified_table(schema, table.name),
        defs.join(",\n  ")
    )
}

/// Create `schema` and every table in `tables` if missing.
pub async fn apply_migrations(pool: &PgPool, schema: &str, tables: &[&TableDef]) -> Result<(), AppError> {
    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(schema)))
        .execute(pool)
        .await?;
    for t in tables {
        sqlx::query(&create_table_sql(t, schema)).execute(pool).await?;
        tracing::info!(schema = %schema, table = t.name, "table ready");
    }
    Ok(())
}
