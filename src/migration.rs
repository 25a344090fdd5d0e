//! Apply the primary model to the database: enum types, tables with foreign keys, and
//! indexes on reference columns. Idempotent: existing types and tables are left alone.

use crate::error::{AppError, ConfigError};
use crate::model::{ColumnInfo, EntityDef, EnumType, Model};
use sqlx::PgPool;
use std::collections::HashSet;

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn enum_ddl(e: &EnumType) -> String {
    let values: Vec<String> = e.values.iter().map(|v| format!("'{}'", v.replace('\'', "''"))).collect();
    format!("CREATE TYPE {} AS ENUM ({})", quote(e.name), values.join(", "))
}

fn column_ddl(c: &ColumnInfo) -> String {
    if c.primary_key {
        return format!("{} SERIAL PRIMARY KEY", quote(c.name));
    }
    let typ = if c.pg_type.chars().all(|ch| ch.is_ascii_lowercase()) && !is_builtin(c.pg_type) {
        quote(c.pg_type)
    } else {
        c.pg_type.to_string()
    };
    let mut def = format!("{} {}", quote(c.name), typ);
    if !c.nullable {
        def.push_str(" NOT NULL");
    }
    if let Some(d) = c.default {
        def.push_str(&format!(" DEFAULT {}", d));
    }
    if c.unique {
        def.push_str(" UNIQUE");
    }
    if let Some((table, column)) = c.references {
        def.push_str(&format!(" REFERENCES {}({})", quote(table), quote(column)));
    }
    def
}

fn is_builtin(pg_type: &str) -> bool {
    matches!(
        pg_type,
        "integer" | "text" | "varchar" | "boolean" | "timestamptz" | "jsonb" | "double precision"
    )
}

fn table_ddl(entity: &EntityDef) -> String {
    let cols: Vec<String> = entity.columns.iter().map(column_ddl).collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        quote(entity.table_name),
        cols.join(",\n    ")
    )
}

fn index_ddl(entity: &EntityDef) -> Vec<String> {
    entity
        .columns
        .iter()
        .filter(|c| c.references.is_some() || entity.filters.contains(&c.name))
        .map(|c| {
            format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                quote(&format!("ix_{}_{}", entity.table_name, c.name)),
                quote(entity.table_name),
                quote(c.name)
            )
        })
        .collect()
}

/// Checks that every reference targets an earlier table and every enum column a declared type.
pub fn validate_model(model: &Model) -> Result<(), ConfigError> {
    let enums: HashSet<&str> = model.enums.iter().map(|e| e.name).collect();
    let mut created: HashSet<&str> = HashSet::new();
    for entity in &model.entities {
        for c in &entity.columns {
            if c.kind == crate::model::ValueKind::Enum && !enums.contains(c.pg_type) {
                return Err(ConfigError::MissingReference {
                    kind: "enum",
                    id: c.pg_type.to_string(),
                });
            }
            if let Some((table, _)) = c.references {
                if !created.contains(table) {
                    return Err(ConfigError::MissingReference {
                        kind: "table",
                        id: table.to_string(),
                    });
                }
            }
        }
        created.insert(entity.table_name);
    }
    Ok(())
}

/// Table and index statements in dependency order. Enum types are created separately.
pub fn model_ddl(model: &Model) -> Result<Vec<String>, ConfigError> {
    validate_model(model)?;
    let mut stmts: Vec<String> = model.entities.iter().map(table_ddl).collect();
    for entity in &model.entities {
        stmts.extend(index_ddl(entity));
    }
    Ok(stmts)
}

pub async fn apply_migrations(pool: &PgPool, model: &Model) -> Result<(), AppError> {
    let stmts = model_ddl(model)?;

    for e in &model.enums {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pg_type WHERE typname = $1)")
            .bind(e.name)
            .fetch_one(pool)
            .await?;
        if !exists {
            sqlx::query(&enum_ddl(e)).execute(pool).await?;
            tracing::info!(enum_type = e.name, "created enum type");
        }
    }

    for stmt in stmts {
        tracing::debug!(sql = %stmt, "ddl");
        sqlx::query(&stmt).execute(pool).await?;
    }
    tracing::info!(tables = model.entities.len(), "primary schema ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::primary_model;

    #[test]
    fn users_table_has_unique_email_and_enum_role() {
        let model = primary_model();
        let ddl = model_ddl(&model).unwrap();
        let users = ddl.iter().find(|s| s.contains("EXISTS \"users\"")).unwrap();
        assert!(users.contains("\"id\" SERIAL PRIMARY KEY"));
        assert!(users.contains("\"email\" varchar NOT NULL UNIQUE"));
        assert!(users.contains("\"role\" \"userrole\" NOT NULL DEFAULT 'community_member'"));
    }

    #[test]
    fn foreign_keys_and_indexes() {
        let model = primary_model();
        let ddl = model_ddl(&model).unwrap().join("\n");
        assert!(ddl.contains("\"reported_by_id\" integer NOT NULL REFERENCES \"users\"(\"id\")"));
        assert!(ddl.contains("\"related_analysis_id\" integer REFERENCES \"soil_analyses\"(\"id\")"));
        assert!(ddl.contains("CREATE INDEX IF NOT EXISTS \"ix_alerts_user_id\""));
    }

    #[test]
    fn enum_ddl_escapes_values() {
        let e = EnumType {
            name: "mood",
            values: &["it's", "fine"],
        };
        assert_eq!(enum_ddl(&e), "CREATE TYPE \"mood\" AS ENUM ('it''s', 'fine')");
    }

    #[test]
    fn out_of_order_reference_is_rejected() {
        let mut model = primary_model();
        model.entities.reverse();
        assert!(matches!(
            validate_model(&model),
            Err(ConfigError::MissingReference { kind: "table", .. })
        ));
    }
}
