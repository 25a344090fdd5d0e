//! Environment-backed settings. `.env` is merged by the binaries before loading.

use crate::error::ConfigError;
use std::env;
use std::fmt::Display;
use std::str::FromStr;

pub const DEFAULT_APP_NAME: &str = "EcoSolo API";
pub const API_PREFIX: &str = "/api/v1";

#[derive(Clone, Debug)]
pub struct Settings {
    pub app_name: String,
    pub environment: String,
    pub debug: bool,
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Second database holding the territory (Portuguese) schema. None means the primary database.
    pub territory_database_url: Option<String>,
    pub database_max_connections: u32,
    pub secret_key: String,
    pub access_token_expire_minutes: i64,
    pub territory_token_expire_hours: i64,
    pub reset_token_expire_minutes: i64,
    pub bcrypt_cost: u32,
    /// Empty means any origin.
    pub cors_origins: Vec<String>,
    pub pagination: Pagination,
    pub max_body_bytes: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::MissingVar("DATABASE_URL"))?;

        let secret_key = match env::var("SECRET_KEY").ok().filter(|s| !s.is_empty()) {
            Some(key) => key,
            None => {
                tracing::warn!("SECRET_KEY not set, generating an ephemeral key; tokens will not survive a restart");
                format!(
                    "{}{}",
                    uuid::Uuid::new_v4().simple(),
                    uuid::Uuid::new_v4().simple()
                )
            }
        };

        let bcrypt_cost: u32 = parse_or("BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::InvalidVar {
                key: "BCRYPT_COST",
                reason: format!("{} is outside 4..=31", bcrypt_cost),
            });
        }

        let pagination = Pagination::new(
            parse_or("DEFAULT_PAGE_SIZE", 20)?,
            parse_or("MAX_PAGE_SIZE", 100)?,
        )?;

        let cors_origins = match env::var("BACKEND_CORS_ORIGINS") {
            Ok(raw) => parse_cors_origins(&raw)?,
            Err(_) => Vec::new(),
        };

        Ok(Settings {
            app_name: env::var("APP_NAME").unwrap_or_else(|_| DEFAULT_APP_NAME.into()),
            environment: env::var("APP_ENV").unwrap_or_else(|_| "production".into()),
            debug: parse_or("DEBUG", false)?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_or("PORT", 8000)?,
            database_url,
            territory_database_url: env::var("TERRITORY_DATABASE_URL").ok().filter(|s| !s.trim().is_empty()),
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 5)?,
            secret_key,
            access_token_expire_minutes: parse_or("ACCESS_TOKEN_EXPIRE_MINUTES", 30)?,
            territory_token_expire_hours: parse_or("TERRITORY_TOKEN_EXPIRE_HOURS", 8)?,
            reset_token_expire_minutes: parse_or("RESET_TOKEN_EXPIRE_MINUTES", 60)?,
            bcrypt_cost,
            cors_origins,
            pagination,
            max_body_bytes: parse_or("MAX_BODY_BYTES", 10 * 1024 * 1024)?,
        })
    }

    pub fn territory_database_url(&self) -> &str {
        self.territory_database_url.as_deref().unwrap_or(&self.database_url)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidVar {
            key,
            reason: e.to_string(),
        }),
        _ => Ok(default),
    }
}

/// Accepts `https://a.example,https://b.example` or a JSON array of strings.
pub fn parse_cors_origins(raw: &str) -> Result<Vec<String>, ConfigError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    if raw.starts_with('[') {
        let origins: Vec<String> = serde_json::from_str(raw).map_err(|e| ConfigError::InvalidVar {
            key: "BACKEND_CORS_ORIGINS",
            reason: e.to_string(),
        })?;
        return Ok(origins.into_iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect());
    }
    Ok(raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

/// List pagination bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Pagination {
    pub fn new(default_limit: u32, max_limit: u32) -> Result<Self, ConfigError> {
        if default_limit == 0 || max_limit == 0 {
            return Err(ConfigError::InvalidVar {
                key: "DEFAULT_PAGE_SIZE",
                reason: "page sizes must be positive".into(),
            });
        }
        if default_limit > max_limit {
            return Err(ConfigError::InvalidVar {
                key: "DEFAULT_PAGE_SIZE",
                reason: format!("default {} exceeds MAX_PAGE_SIZE {}", default_limit, max_limit),
            });
        }
        Ok(Pagination {
            default_limit,
            max_limit,
        })
    }

    /// Returns (skip, limit) with limit clamped to 1..=max.
    pub fn resolve(&self, skip: Option<u32>, limit: Option<u32>) -> (u32, u32) {
        let limit = limit.unwrap_or(self.default_limit).clamp(1, self.max_limit);
        (skip.unwrap_or(0), limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            default_limit: 20,
            max_limit: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_accepts_comma_list_and_json() {
        assert_eq!(
            parse_cors_origins("http://a.test, http://b.test,").unwrap(),
            vec!["http://a.test", "http://b.test"]
        );
        assert_eq!(
            parse_cors_origins(r#"["http://a.test"]"#).unwrap(),
            vec!["http://a.test"]
        );
        assert!(parse_cors_origins("").unwrap().is_empty());
        assert!(parse_cors_origins("[not json").is_err());
    }

    #[test]
    fn pagination_clamps_limit() {
        let p = Pagination::new(20, 100).unwrap();
        assert_eq!(p.resolve(None, None), (0, 20));
        assert_eq!(p.resolve(Some(40), Some(500)), (40, 100));
        assert_eq!(p.resolve(None, Some(0)), (0, 1));
    }

    #[test]
    fn pagination_rejects_default_above_max() {
        assert!(Pagination::new(200, 100).is_err());
        assert!(Pagination::new(0, 100).is_err());
    }
}
