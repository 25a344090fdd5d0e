//! Typed access to the `users` table.

use crate::error::AppError;
use crate::model::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

const USER_COLUMNS: &str = "id, email, hashed_password, name, role, is_active, is_verified, age, bio, \
     avatar_url, notifications_enabled, language, created_at, updated_at, last_login";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub hashed_password: String,
    pub name: String,
    pub role: Role,
    pub is_active: bool,
    pub is_verified: bool,
    pub age: Option<i32>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub notifications_enabled: bool,
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub is_active: bool,
    pub is_verified: bool,
    pub age: Option<i32>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub notifications_enabled: bool,
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        UserResponse {
            id: u.id,
            email: u.email,
            name: u.name,
            role: u.role,
            is_active: u.is_active,
            is_verified: u.is_verified,
            age: u.age,
            bio: u.bio,
            avatar_url: u.avatar_url,
            notifications_enabled: u.notifications_enabled,
            language: u.language,
            created_at: u.created_at,
            updated_at: u.updated_at,
            last_login: u.last_login,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub hashed_password: String,
    pub name: String,
    pub role: Role,
    pub age: Option<i32>,
    pub bio: Option<String>,
    pub notifications_enabled: bool,
    pub language: String,
}

/// Self-service profile changes. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub age: Option<i32>,
    pub bio: Option<String>,
    pub notifications_enabled: Option<bool>,
    pub language: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileUpdate {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            let len = name.trim().chars().count();
            if !(1..=100).contains(&len) {
                return Err(AppError::Validation("name must be between 1 and 100 characters".into()));
            }
        }
        if let Some(age) = self.age {
            if !(0..=150).contains(&age) {
                return Err(AppError::Validation("age must be between 0 and 150".into()));
            }
        }
        if let Some(language) = &self.language {
            if language.trim().is_empty() || language.len() > 10 {
                return Err(AppError::Validation("language must be a locale tag such as pt-BR".into()));
            }
        }
        Ok(())
    }
}

/// Admin listing filters.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Case-insensitive substring of name or email.
    pub search: Option<String>,
    pub role: Option<Role>,
}

const FILTER_SQL: &str = "($1::text IS NULL OR name ILIKE '%' || $1 || '%' OR email ILIKE '%' || $1 || '%') \
     AND ($2::userrole IS NULL OR role = $2)";

pub struct UserStore;

impl UserStore {
    pub async fn by_id(pool: &PgPool, id: i32) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql).bind(id).fetch_optional(pool).await?)
    }

    /// Emails are stored lowercased, so the lookup lowercases too.
    pub async fn by_email(pool: &PgPool, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(normalize_email(email))
            .fetch_optional(pool)
            .await?)
    }

    pub async fn create(pool: &PgPool, new: &NewUser) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO users (email, hashed_password, name, role, age, bio, notifications_enabled, language) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            USER_COLUMNS
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(normalize_email(&new.email))
            .bind(&new.hashed_password)
            .bind(new.name.trim())
            .bind(new.role)
            .bind(new.age)
            .bind(&new.bio)
            .bind(new.notifications_enabled)
            .bind(&new.language)
            .fetch_one(pool)
            .await?)
    }

    pub async fn update_profile(pool: &PgPool, id: i32, update: &ProfileUpdate) -> Result<Option<User>, AppError> {
        let sql = format!(
            "UPDATE users SET name = COALESCE($2, name), age = COALESCE($3, age), bio = COALESCE($4, bio), \
             notifications_enabled = COALESCE($5, notifications_enabled), language = COALESCE($6, language), \
             avatar_url = COALESCE($7, avatar_url), updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(update.name.as_deref().map(str::trim))
            .bind(update.age)
            .bind(&update.bio)
            .bind(update.notifications_enabled)
            .bind(&update.language)
            .bind(&update.avatar_url)
            .fetch_optional(pool)
            .await?)
    }

    pub async fn update_password(pool: &PgPool, id: i32, hashed_password: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET hashed_password = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(hashed_password)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn touch_last_login(pool: &PgPool, id: i32) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn set_active(pool: &PgPool, id: i32, active: bool) -> Result<Option<User>, AppError> {
        let sql = format!(
            "UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(active)
            .fetch_optional(pool)
            .await?)
    }

    pub async fn set_verified(pool: &PgPool, id: i32) -> Result<Option<User>, AppError> {
        let sql = format!(
            "UPDATE users SET is_verified = TRUE, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        Ok(sqlx::query_as::<_, User>(&sql).bind(id).fetch_optional(pool).await?)
    }

    pub async fn list(pool: &PgPool, filter: &UserFilter, skip: u32, limit: u32) -> Result<Vec<User>, AppError> {
        let sql = format!(
            "SELECT {} FROM users WHERE {} ORDER BY id LIMIT {} OFFSET {}",
            USER_COLUMNS, FILTER_SQL, limit, skip
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(filter.search.as_deref())
            .bind(filter.role)
            .fetch_all(pool)
            .await?)
    }

    pub async fn count(pool: &PgPool, filter: &UserFilter) -> Result<u64, AppError> {
        let sql = format!("SELECT count(*) FROM users WHERE {}", FILTER_SQL);
        let total: i64 = sqlx::query_scalar(&sql)
            .bind(filter.search.as_deref())
            .bind(filter.role)
            .fetch_one(pool)
            .await?;
        Ok(total.max(0) as u64)
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_update_bounds() {
        let ok = ProfileUpdate {
            age: Some(42),
            language: Some("en-US".into()),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());
        let too_old = ProfileUpdate {
            age: Some(151),
            ..Default::default()
        };
        assert!(too_old.validate().is_err());
        let blank = ProfileUpdate {
            name: Some("   ".into()),
            ..Default::default()
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn profile_update_rejects_role_changes() {
        let parsed: Result<ProfileUpdate, _> = serde_json::from_str(r#"{"role": "admin"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Admin@EcoSolo.com "), "admin@ecosolo.com");
    }
}
