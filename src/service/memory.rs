//! In-process gateway with the same contract as the PostgreSQL one.
//! The whole table sits behind one mutex, so every mutation is all-or-nothing.

use super::{column_map, not_found, ResourceService};
use crate::config::TableDef;
use crate::error::AppError;
use crate::page::Page;
use crate::query::{ListQuery, ResolvedQuery, SortOrder};
use crate::resource::Resource;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::{Mutex, MutexGuard};

type Row = Map<String, Value>;

#[derive(Default)]
struct Table {
    rows: BTreeMap<i64, Row>,
    /// Last id handed out; ids are never reused.
    last_id: i64,
}

pub struct MemoryResourceService<R> {
    table: Mutex<Table>,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> Default for MemoryResourceService<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Resource> MemoryResourceService<R> {
    pub fn new() -> Self {
        MemoryResourceService {
            table: Mutex::new(Table::default()),
            _resource: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn to_model(row: &Row) -> Result<R::Model, AppError> {
        serde_json::from_value(Value::Object(row.clone()))
            .map_err(|e| AppError::BadRequest(format!("stored {} is malformed: {}", R::NAME, e)))
    }

    /// Copy writable input columns into `row`, normalized to their column types.
    fn apply(table: &TableDef, row: &mut Row, input: &Row) {
        for c in table.writable() {
            if let Some(v) = input.get(c.name) {
                row.insert(c.name.to_string(), c.ty.coerce(v));
            }
        }
    }

    /// Enforce NOT NULL, numeric range and unique columns, as the storage constraints would.
    fn check_constraints(table: &TableDef, rows: &BTreeMap<i64, Row>, id: i64, row: &Row) -> Result<(), AppError> {
        for c in table.columns {
            match row.get(c.name) {
                None | Some(Value::Null) if !c.nullable => {
                    return Err(AppError::BadRequest(format!("{} must not be null", c.name)));
                }
                Some(v) if !c.ty.fits(v) => {
                    return Err(AppError::BadRequest(format!("{} is out of range", c.name)));
                }
                _ => {}
            }
        }
        for name in table.unique {
            let Some(v) = row.get(*name).filter(|v| !v.is_null()) else { continue };
            let clash = rows
                .iter()
                .any(|(other, r)| *other != id && r.get(*name) == Some(v));
            if clash {
                tracing::warn!(resource = R::NAME, column = %name, "unique constraint violated");
                return Err(AppError::Conflict(format!("{}_{}_unique", table.name, name)));
            }
        }
        Ok(())
    }

    fn matches(table: &TableDef, row: &Row, query: &ResolvedQuery) -> bool {
        let filters_ok = query.filters.iter().all(|(c, v)| {
            row.get(c.name)
                .map_or(false, |stored| c.ty.compare(stored, v) == Ordering::Equal && !stored.is_null())
        });
        if !filters_ok {
            return false;
        }
        match &query.search {
            None => true,
            Some(term) => {
                let needle = term.to_lowercase();
                table.searchable.iter().any(|c| {
                    row.get(*c)
                        .and_then(Value::as_str)
                        .map_or(false, |s| s.to_lowercase().contains(&needle))
                })
            }
        }
    }
}

#[async_trait]
impl<R: Resource> ResourceService<R> for MemoryResourceService<R> {
    async fn get_all(&self, query: &ListQuery) -> Result<Page<R::Model>, AppError> {
        let table = R::table();
        let resolved = query.resolve(table)?;
        let guard = self.lock();
        let mut hits: Vec<(&i64, &Row)> = guard
            .rows
            .iter()
            .filter(|(_, row)| Self::matches(table, row, &resolved))
            .collect();
        let sort = resolved.sort;
        hits.sort_by(|(a_id, a), (b_id, b)| {
            let (av, bv) = (
                a.get(sort.name).unwrap_or(&Value::Null),
                b.get(sort.name).unwrap_or(&Value::Null),
            );
            let primary = match resolved.order {
                SortOrder::Asc => sort.ty.compare(av, bv),
                SortOrder::Desc => sort.ty.compare(bv, av),
            };
            primary.then_with(|| a_id.cmp(b_id))
        });
        let total = hits.len() as u64;
        let items = hits
            .into_iter()
            .skip(resolved.offset() as usize)
            .take(resolved.limit() as usize)
            .map(|(_, row)| Self::to_model(row))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total, resolved.per_page, resolved.page))
    }

    async fn create(&self, input: R::CreateInput) -> Result<R::Model, AppError> {
        let table = R::table();
        let input = column_map(&input)?;
        let mut guard = self.lock();
        let id = guard.last_id + 1;
        let now = Value::String(Utc::now().to_rfc3339());

        let mut row = Row::new();
        for c in table.columns {
            row.insert(c.name.to_string(), Value::Null);
        }
        row.insert(table.primary_key.to_string(), Value::from(id));
        for ts in ["created_at", "updated_at"] {
            if table.has_column(ts) {
                row.insert(ts.to_string(), now.clone());
            }
        }
        Self::apply(table, &mut row, &input);
        Self::check_constraints(table, &guard.rows, id, &row)?;
        let model = Self::to_model(&row)?;

        guard.last_id = id;
        guard.rows.insert(id, row);
        tracing::info!(resource = R::NAME, id, "created");
        Ok(model)
    }

    async fn find(&self, id: i64) -> Result<R::Model, AppError> {
        let guard = self.lock();
        let row = guard.rows.get(&id).ok_or_else(|| not_found::<R>(id))?;
        Self::to_model(row)
    }

    async fn update(&self, model: &R::Model, input: R::UpdateInput) -> Result<R::Model, AppError> {
        let table = R::table();
        let id = R::id(model);
        let input = column_map(&input)?;
        let mut guard = self.lock();
        let mut row = guard.rows.get(&id).cloned().ok_or_else(|| not_found::<R>(id))?;
        Self::apply(table, &mut row, &input);
        if table.has_column("updated_at") {
            row.insert("updated_at".into(), Value::String(Utc::now().to_rfc3339()));
        }
        Self::check_constraints(table, &guard.rows, id, &row)?;
        let updated = Self::to_model(&row)?;
        guard.rows.insert(id, row);
        tracing::info!(resource = R::NAME, id, "updated");
        Ok(updated)
    }

    async fn delete(&self, model: &R::Model) -> Result<(), AppError> {
        let id = R::id(model);
        self.lock().rows.remove(&id).ok_or_else(|| not_found::<R>(id))?;
        tracing::info!(resource = R::NAME, id, "deleted");
        Ok(())
    }

    async fn is_taken(
        &self,
        column: &str,
        value: &Value,
        except_id: Option<i64>,
    ) -> Result<bool, AppError> {
        let table = R::table();
        let column = table
            .column(column)
            .ok_or_else(|| AppError::BadRequest(format!("unknown column '{}'", column)))?;
        let needle = column.ty.coerce(value);
        let guard = self.lock();
        Ok(guard.rows.iter().any(|(id, row)| {
            Some(*id) != except_id
                && row
                    .get(column.name)
                    .map_or(false, |v| !v.is_null() && column.ty.compare(v, &needle) == Ordering::Equal)
        }))
    }
}
