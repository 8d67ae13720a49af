//! Generic CRUD execution against PostgreSQL.

use super::{column_map, not_found, ResourceService};
use crate::error::AppError;
use crate::page::Page;
use crate::query::ListQuery;
use crate::resource::Resource;
use crate::sql::{self, PgBindValue, QueryBuf};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgArguments;
use sqlx::query::{QueryAs, QueryScalar};
use sqlx::{PgPool, Postgres};
use std::marker::PhantomData;

pub struct PgResourceService<R> {
    pool: PgPool,
    schema: String,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> PgResourceService<R> {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        PgResourceService {
            pool,
            schema: schema.into(),
            _resource: PhantomData,
        }
    }

    fn rows<'q>(q: &'q QueryBuf) -> Result<QueryAs<'q, Postgres, R::Model, PgArguments>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_as::<_, R::Model>(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p)?);
        }
        Ok(query)
    }

    fn scalar<'q, O>(q: &'q QueryBuf) -> Result<QueryScalar<'q, Postgres, O, PgArguments>, AppError>
    where
        (O,): for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow>,
    {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_scalar::<_, O>(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p)?);
        }
        Ok(query)
    }
}

impl<R> Clone for PgResourceService<R> {
    fn clone(&self) -> Self {
        PgResourceService {
            pool: self.pool.clone(),
            schema: self.schema.clone(),
            _resource: PhantomData,
        }
    }
}

#[async_trait]
impl<R: Resource> ResourceService<R> for PgResourceService<R> {
    async fn get_all(&self, query: &ListQuery) -> Result<Page<R::Model>, AppError> {
        let table = R::table();
        let resolved = query.resolve(table)?;
        let count_q = sql::count(table, &self.schema, &resolved);
        let total: i64 = Self::scalar(&count_q)?.fetch_one(&self.pool).await?;
        let page_q = sql::select_page(table, &self.schema, &resolved);
        let items = Self::rows(&page_q)?.fetch_all(&self.pool).await?;
        Ok(Page::new(items, total.max(0) as u64, resolved.per_page, resolved.page))
    }

    async fn create(&self, input: R::CreateInput) -> Result<R::Model, AppError> {
        let body = column_map(&input)?;
        let q = sql::insert(R::table(), &self.schema, &body);
        let mut tx = self.pool.begin().await?;
        let row = Self::rows(&q)?.fetch_one(&mut *tx).await?;
        tx.commit().await?;
        tracing::info!(resource = R::NAME, id = R::id(&row), "created");
        Ok(row)
    }

    async fn find(&self, id: i64) -> Result<R::Model, AppError> {
        let q = sql::select_by_id(R::table(), &self.schema, id);
        Self::rows(&q)?
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found::<R>(id))
    }

    async fn update(&self, model: &R::Model, input: R::UpdateInput) -> Result<R::Model, AppError> {
        let id = R::id(model);
        let body = column_map(&input)?;
        let q = sql::update(R::table(), &self.schema, id, &body);
        let mut tx = self.pool.begin().await?;
        let row = Self::rows(&q)?
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| not_found::<R>(id))?;
        tx.commit().await?;
        tracing::info!(resource = R::NAME, id, "updated");
        Ok(row)
    }

    async fn delete(&self, model: &R::Model) -> Result<(), AppError> {
        let id = R::id(model);
        let q = sql::delete(R::table(), &self.schema, id);
        let mut tx = self.pool.begin().await?;
        let deleted: Option<i64> = Self::scalar(&q)?.fetch_optional(&mut *tx).await?;
        if deleted.is_none() {
            return Err(not_found::<R>(id));
        }
        tx.commit().await?;
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
        let q = sql::exists(table, &self.schema, column, value, except_id);
        let taken: bool = Self::scalar(&q)?.fetch_one(&self.pool).await?;
        Ok(taken)
    }
}
