//! Database provisioning and pool construction.

use crate::error::{AppError, ConfigError};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;
use std::time::Duration;

/// Connects to the `postgres` maintenance database on the same server and runs
/// `CREATE DATABASE` when the target database is missing.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = split_db_name(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = PgConnectOptions::from_str(&admin_url).map_err(|e| ConfigError::InvalidVar {
        key: "DATABASE_URL",
        reason: e.to_string(),
    })?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists {
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
        tracing::info!(database = %db_name, "created database");
    } else {
        tracing::info!(database = %db_name, "database exists");
    }
    Ok(())
}

/// Pool with a short acquire timeout. `lazy` defers connecting until first use.
pub async fn connect_pool(database_url: &str, max_connections: u32, lazy: bool) -> Result<PgPool, AppError> {
    let options = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5));
    if lazy {
        Ok(options.connect_lazy(database_url)?)
    } else {
        Ok(options.connect(database_url).await?)
    }
}

/// Splits `postgres://u:p@h:5432/name?opts` into the maintenance URL and `name`.
fn split_db_name(url: &str) -> Result<(String, String), ConfigError> {
    let scheme_end = url.find("://").map(|i| i + 3).unwrap_or(0);
    let path_start = url[scheme_end..]
        .find('/')
        .map(|i| scheme_end + i + 1)
        .ok_or(ConfigError::InvalidVar {
            key: "DATABASE_URL",
            reason: "no database name in URL".into(),
        })?;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let mut parts = path_and_query.splitn(2, '?');
    let db_name = parts.next().unwrap_or("").trim().to_string();
    let query = parts.next().map(|q| format!("?{}", q)).unwrap_or_default();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres{}", base, query), db_name))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_database_name() {
        let (admin, name) = split_db_name("postgres://eco:pw@localhost:5432/ecosolo_db").unwrap();
        assert_eq!(admin, "postgres://eco:pw@localhost:5432/postgres");
        assert_eq!(name, "ecosolo_db");
    }

    #[test]
    fn keeps_query_options() {
        let (admin, name) = split_db_name("postgres://h/territorio?sslmode=disable").unwrap();
        assert_eq!(admin, "postgres://h/postgres?sslmode=disable");
        assert_eq!(name, "territorio");
    }

    #[test]
    fn url_without_path_is_invalid() {
        assert!(split_db_name("postgres://localhost:5432").is_err());
    }

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(quote_ident("eco\"solo"), "\"eco\"\"solo\"");
    }
}
