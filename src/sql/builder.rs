//! Builds parameterized INSERT, SELECT, UPDATE, DELETE from an entity definition.

use crate::model::{EntityDef, ValueKind};
use serde_json::Value;
use std::collections::HashMap;

/// Quote identifier for PostgreSQL (safe: only from the static model).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
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

    fn push_param(&mut self, v: Value) -> usize {
        self.params.push(v);
        self.params.len()
    }

    /// Placeholder with a cast to the column type so text and JSON values bind correctly.
    fn placeholder(&mut self, v: Value, pg_type: &str) -> String {
        let n = self.push_param(v);
        format!("${}::{}", n, pg_type)
    }
}

/// Restricts rows to those tied to one user, optionally plus rows tied to nobody.
#[derive(Clone, Copy, Debug)]
pub struct Scope<'a> {
    pub owner_column: &'a str,
    pub owner_id: i64,
    pub include_unowned: bool,
}

/// SELECT list: visible columns, enums read back as text.
fn select_column_list(entity: &EntityDef) -> String {
    entity
        .visible_columns()
        .map(|c| {
            let q = quoted(c.name);
            if c.kind == ValueKind::Enum {
                format!("{}::text AS {}", q, q)
            } else {
                q
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn where_clause(q: &mut QueryBuf, entity: &EntityDef, filters: &[(String, Value)], scope: Option<&Scope<'_>>) -> String {
    let mut parts = Vec::new();
    for (col, val) in filters {
        let Some(c) = entity.column(col) else { continue };
        if !entity.filters.contains(&c.name) {
            continue;
        }
        let ph = q.placeholder(val.clone(), c.pg_type);
        parts.push(format!("{} = {}", quoted(c.name), ph));
    }
    if let Some(scope) = scope {
        let n = q.push_param(Value::from(scope.owner_id));
        let owner = quoted(scope.owner_column);
        if scope.include_unowned {
            parts.push(format!("({} = ${}::integer OR {} IS NULL)", owner, n, owner));
        } else {
            parts.push(format!("{} = ${}::integer", owner, n));
        }
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

/// SELECT by primary key. Caller binds id as $1.
pub fn select_by_id(entity: &EntityDef) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = $1::integer",
        select_column_list(entity),
        quoted(entity.table_name),
        quoted(entity.pk())
    );
    q
}

/// SELECT list with exact-match filters (declared filter columns only), optional owner scope,
/// newest first, LIMIT/OFFSET.
pub fn select_list(
    entity: &EntityDef,
    filters: &[(String, Value)],
    scope: Option<&Scope<'_>>,
    limit: u32,
    offset: u32,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, entity, filters, scope);
    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY {} DESC LIMIT {} OFFSET {}",
        select_column_list(entity),
        quoted(entity.table_name),
        where_sql,
        quoted(entity.pk()),
        limit,
        offset
    );
    q
}

/// SELECT count(*) with the same filters and scope as `select_list`.
pub fn count(entity: &EntityDef, filters: &[(String, Value)], scope: Option<&Scope<'_>>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, entity, filters, scope);
    q.sql = format!("SELECT count(*) FROM {}{}", quoted(entity.table_name), where_sql);
    q
}

/// INSERT: writable columns present in body, plus the owner column when given.
/// Columns absent from the body are omitted so the DB default applies.
pub fn insert(entity: &EntityDef, body: &HashMap<String, Value>, owner: Option<(&str, i64)>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in &entity.columns {
        if let Some((owner_col, owner_id)) = owner {
            if c.name == owner_col {
                placeholders.push(q.placeholder(Value::from(owner_id), c.pg_type));
                cols.push(quoted(c.name));
                continue;
            }
        }
        if !entity.is_payload_column(c.name) {
            continue;
        }
        let Some(val) = body.get(c.name) else { continue };
        placeholders.push(q.placeholder(val.clone(), c.pg_type));
        cols.push(quoted(c.name));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        quoted(entity.table_name),
        cols.join(", "),
        placeholders.join(", "),
        select_column_list(entity)
    );
    q
}

/// UPDATE by id: SET writable columns present in body, `stamps` to NOW(), and `updated_at`.
pub fn update(entity: &EntityDef, id: i64, body: &HashMap<String, Value>, stamps: &[&str]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for c in &entity.columns {
        if !entity.is_payload_column(c.name) {
            continue;
        }
        let Some(val) = body.get(c.name) else { continue };
        let ph = q.placeholder(val.clone(), c.pg_type);
        sets.push(format!("{} = {}", quoted(c.name), ph));
    }
    for stamp in stamps {
        if entity.column(stamp).is_some() {
            sets.push(format!("{} = NOW()", quoted(stamp)));
        }
    }
    if entity.column("updated_at").is_some() {
        sets.push(format!("{} = NOW()", quoted("updated_at")));
    }
    let id_param = q.push_param(Value::from(id));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ${}::integer RETURNING {}",
        quoted(entity.table_name),
        sets.join(", "),
        quoted(entity.pk()),
        id_param,
        select_column_list(entity)
    );
    q
}

/// DELETE by id. Caller binds id as $1.
pub fn delete(entity: &EntityDef) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "DELETE FROM {} WHERE {} = $1::integer RETURNING {}",
        quoted(entity.table_name),
        quoted(entity.pk()),
        select_column_list(entity)
    );
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::primary_model;
    use serde_json::json;

    fn body(v: Value) -> HashMap<String, Value> {
        v.as_object().unwrap().clone().into_iter().collect()
    }

    #[test]
    fn insert_injects_owner_and_ignores_read_only_fields() {
        let model = primary_model();
        let soil = model.entity_by_path("soil-analyses").unwrap();
        let q = insert(
            soil,
            &body(json!({"title": "Setor A", "location": "Fazenda", "user_id": 99, "created_at": "x"})),
            Some(("user_id", 7)),
        );
        assert!(q.sql.starts_with("INSERT INTO \"soil_analyses\" (\"title\", \"location\", \"user_id\")"));
        assert!(q.sql.contains("VALUES ($1::varchar, $2::varchar, $3::integer)"));
        assert_eq!(q.params, vec![json!("Setor A"), json!("Fazenda"), json!(7)]);
    }

    #[test]
    fn enums_are_cast_on_write_and_read_back_as_text() {
        let model = primary_model();
        let occ = model.entity_by_path("environmental-occurrences").unwrap();
        let q = insert(occ, &body(json!({"severity": "high"})), Some(("reported_by_id", 1)));
        assert!(q.sql.contains("$1::severitylevel"));
        assert!(q.sql.contains("\"severity\"::text AS \"severity\""));
    }

    #[test]
    fn list_applies_declared_filters_and_scope() {
        let model = primary_model();
        let alerts = model.entity_by_path("alerts").unwrap();
        let filters = vec![
            ("status".to_string(), json!("active")),
            ("title".to_string(), json!("not a filter")),
        ];
        let scope = Scope {
            owner_column: "user_id",
            owner_id: 3,
            include_unowned: true,
        };
        let q = select_list(alerts, &filters, Some(&scope), 20, 40);
        assert!(q.sql.contains("WHERE \"status\" = $1::alertstatus AND (\"user_id\" = $2::integer OR \"user_id\" IS NULL)"));
        assert!(q.sql.ends_with("ORDER BY \"id\" DESC LIMIT 20 OFFSET 40"));
        assert_eq!(q.params, vec![json!("active"), json!(3)]);

        let c = count(alerts, &filters, Some(&scope));
        assert!(c.sql.starts_with("SELECT count(*) FROM \"alerts\" WHERE"));
        assert_eq!(c.params.len(), 2);
    }

    #[test]
    fn update_stamps_and_binds_id_last() {
        let model = primary_model();
        let occ = model.entity_by_path("environmental-occurrences").unwrap();
        let q = update(occ, 12, &body(json!({"status": "resolved", "reported_by_id": 5})), &["resolved_at"]);
        assert!(q.sql.contains("SET \"status\" = $1::occurrencestatus, \"resolved_at\" = NOW(), \"updated_at\" = NOW()"));
        assert!(q.sql.contains("WHERE \"id\" = $2::integer"));
        assert_eq!(q.params, vec![json!("resolved"), json!(12)]);
    }

    #[test]
    fn sensitive_columns_are_never_selected() {
        let model = primary_model();
        let users = model.entity_by_table("users").unwrap();
        assert!(!select_by_id(users).sql.contains("hashed_password"));
    }
}
