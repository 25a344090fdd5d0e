//! Generic CRUD execution against PostgreSQL.

use crate::error::AppError;
use crate::model::EntityDef;
use crate::sql::{self, PgBindValue, QueryBuf, Scope};
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use std::collections::HashMap;

pub struct CrudService;

impl CrudService {
    /// List rows with exact-match filters, optional owner scope, newest first.
    pub async fn list(
        pool: &PgPool,
        entity: &EntityDef,
        filters: &[(String, Value)],
        scope: Option<&Scope<'_>>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Value>, AppError> {
        let q = sql::select_list(entity, filters, scope, limit, offset);
        Self::query_many(pool, &q).await
    }

    /// Total rows matching the same filters and scope as `list`.
    pub async fn count(
        pool: &PgPool,
        entity: &EntityDef,
        filters: &[(String, Value)],
        scope: Option<&Scope<'_>>,
    ) -> Result<u64, AppError> {
        let q = sql::count(entity, filters, scope);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_scalar::<_, i64>(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let total = query.fetch_one(pool).await?;
        Ok(total.max(0) as u64)
    }

    /// Fetch one row by primary key. Returns JSON object or None.
    pub async fn read(pool: &PgPool, entity: &EntityDef, id: i64) -> Result<Option<Value>, AppError> {
        let mut q = sql::select_by_id(entity);
        q.params.push(Value::from(id));
        Self::query_optional(pool, &q).await
    }

    /// Insert one row. `owner` fills the owner column from the caller. Returns the created row.
    pub async fn create(
        pool: &PgPool,
        entity: &EntityDef,
        body: &HashMap<String, Value>,
        owner: Option<(&str, i64)>,
    ) -> Result<Value, AppError> {
        let q = sql::insert(entity, body, owner);
        Self::query_optional(pool, &q)
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    /// Update one row by id, stamping `stamps` columns with NOW(). Returns the updated row.
    pub async fn update(
        pool: &PgPool,
        entity: &EntityDef,
        id: i64,
        body: &HashMap<String, Value>,
        stamps: &[&str],
    ) -> Result<Option<Value>, AppError> {
        let q = sql::update(entity, id, body, stamps);
        Self::query_optional(pool, &q).await
    }

    /// Delete one row by id. Returns deleted row or None.
    pub async fn delete(pool: &PgPool, entity: &EntityDef, id: i64) -> Result<Option<Value>, AppError> {
        let mut q = sql::delete(entity);
        q.params.push(Value::from(id));
        Self::query_optional(pool, &q).await
    }

    async fn query_optional(pool: &PgPool, q: &QueryBuf) -> Result<Option<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let row = query.fetch_optional(pool).await?;
        Ok(row.map(|r| row_to_json(&r)))
    }

    async fn query_many(pool: &PgPool, q: &QueryBuf) -> Result<Vec<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let rows = query.fetch_all(pool).await?;
        Ok(rows.iter().map(row_to_json).collect())
    }
}

/// Integer id of a row returned by `CrudService`.
pub fn row_id(row: &Value) -> Option<i64> {
    row.get("id").and_then(Value::as_i64)
}

/// Integer value of `column` in a row, None when absent or NULL.
pub fn row_owner(row: &Value, column: &str) -> Option<i64> {
    row.get(column).and_then(Value::as_i64)
}

fn row_to_json(row: &PgRow) -> Value {
    use sqlx::{Column, Row};
    let mut map = serde_json::Map::new();
    for col in row.columns() {
        let name = col.name();
        map.insert(name.to_string(), cell_to_value(row, name));
    }
    Value::Object(map)
}

fn cell_to_value(row: &PgRow, name: &str) -> Value {
    use sqlx::Row;
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(d.to_rfc3339());
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<Value>, _>(name) {
        return j;
    }
    Value::Null
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn owner_of_broadcast_row_is_none() {
        let row = json!({"id": 4, "user_id": null});
        assert_eq!(row_id(&row), Some(4));
        assert_eq!(row_owner(&row, "user_id"), None);
        assert_eq!(row_owner(&json!({"user_id": 9}), "user_id"), Some(9));
    }
}
