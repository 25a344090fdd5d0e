use super::types::{ProfileUpdateRequest, RegisterRequest, TerritoryRole, UserStatus};
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

const SELECT_USER: &str = "SELECT u.id, u.nome, u.email, u.senha_hash, u.tipo_usuario, u.territorio_id, \
     t.nome AS territorio_nome, u.telefone, u.nome_social, u.nome_indigena, u.idade, u.principal_atuacao, \
     u.aldeia_comunidade, u.localizacao_territorio, u.aceite_lgpd, u.status, u.data_criacao, u.ultima_atualizacao \
     FROM usuarios u LEFT JOIN territorios t ON t.id = u.territorio_id";

/// A row of `usuarios`. Serializes as the public `user_info` (no hash).
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct TerritoryUser {
    pub id: i32,
    #[sqlx(rename = "nome")]
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[sqlx(rename = "senha_hash")]
    #[serde(skip)]
    pub password_hash: String,
    #[sqlx(rename = "tipo_usuario")]
    #[serde(rename = "tipo_usuario")]
    pub role: String,
    #[sqlx(rename = "territorio_id")]
    #[serde(rename = "territorio_id")]
    pub territory_id: Option<i32>,
    #[sqlx(rename = "territorio_nome")]
    #[serde(rename = "territorio_nome")]
    pub territory_name: Option<String>,
    #[sqlx(rename = "telefone")]
    #[serde(rename = "telefone")]
    pub phone: Option<String>,
    #[sqlx(rename = "nome_social")]
    #[serde(rename = "nome_social")]
    pub social_name: Option<String>,
    #[sqlx(rename = "nome_indigena")]
    #[serde(rename = "nome_indigena")]
    pub indigenous_name: Option<String>,
    #[sqlx(rename = "idade")]
    #[serde(rename = "idade")]
    pub age: Option<i32>,
    #[sqlx(rename = "principal_atuacao")]
    #[serde(rename = "principal_atuacao")]
    pub main_activity: Option<String>,
    #[sqlx(rename = "aldeia_comunidade")]
    #[serde(rename = "aldeia_comunidade")]
    pub village: Option<String>,
    #[sqlx(rename = "localizacao_territorio")]
    #[serde(rename = "localizacao_territorio")]
    pub territory_location: Option<String>,
    #[sqlx(rename = "aceite_lgpd")]
    #[serde(rename = "aceite_lgpd")]
    pub privacy_consent: bool,
    pub status: String,
    #[sqlx(rename = "data_criacao")]
    #[serde(rename = "data_criacao")]
    pub created_at: DateTime<Utc>,
    #[sqlx(rename = "ultima_atualizacao")]
    #[serde(rename = "ultima_atualizacao")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TerritoryUser {
    pub fn role(&self) -> Result<TerritoryRole, AppError> {
        self.role
            .parse()
            .map_err(|_| AppError::Internal(format!("usuario {} has unknown tipo_usuario {}", self.id, self.role)))
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active.as_str()
    }
}

pub struct TerritoryUserStore;

impl TerritoryUserStore {
    pub async fn by_email(pool: &PgPool, email: &str) -> Result<Option<TerritoryUser>, AppError> {
        let sql = format!("{} WHERE u.email = $1", SELECT_USER);
        Ok(sqlx::query_as::<_, TerritoryUser>(&sql)
            .bind(email.trim().to_lowercase())
            .fetch_optional(pool)
            .await?)
    }

    pub async fn by_id(pool: &PgPool, id: i32) -> Result<Option<TerritoryUser>, AppError> {
        let sql = format!("{} WHERE u.id = $1", SELECT_USER);
        Ok(sqlx::query_as::<_, TerritoryUser>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?)
    }

    pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM usuarios WHERE email = $1)")
            .bind(email.trim().to_lowercase())
            .fetch_one(pool)
            .await?;
        Ok(exists)
    }

    /// Inserts an `ativo` user from a validated registration. Returns the joined row.
    pub async fn create(pool: &PgPool, req: &RegisterRequest, password_hash: &str) -> Result<TerritoryUser, AppError> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO usuarios (nome, email, senha_hash, tipo_usuario, territorio_id, telefone, nome_social, \
             nome_indigena, idade, principal_atuacao, aldeia_comunidade, localizacao_territorio, aceite_lgpd, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) RETURNING id",
        )
        .bind(&req.name)
        .bind(&req.email)
        .bind(password_hash)
        .bind(req.role.as_str())
        .bind(req.territory_id)
        .bind(&req.phone)
        .bind(&req.social_name)
        .bind(&req.indigenous_name)
        .bind(req.age)
        .bind(&req.main_activity)
        .bind(&req.village)
        .bind(&req.territory_location)
        .bind(req.privacy_consent)
        .bind(UserStatus::Active.as_str())
        .fetch_one(pool)
        .await?;
        Self::by_id(pool, id).await?.ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    /// Updates only the fields present in the request.
    pub async fn update_profile(
        pool: &PgPool,
        id: i32,
        req: &ProfileUpdateRequest,
    ) -> Result<Option<TerritoryUser>, AppError> {
        let updated = sqlx::query(
            "UPDATE usuarios SET nome_social = COALESCE($2, nome_social), nome_indigena = COALESCE($3, nome_indigena), \
             idade = COALESCE($4, idade), principal_atuacao = COALESCE($5, principal_atuacao), \
             aldeia_comunidade = COALESCE($6, aldeia_comunidade), \
             localizacao_territorio = COALESCE($7, localizacao_territorio), ultima_atualizacao = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(&req.social_name)
        .bind(&req.indigenous_name)
        .bind(req.age)
        .bind(&req.main_activity)
        .bind(&req.village)
        .bind(&req.territory_location)
        .execute(pool)
        .await?;
        if updated.rows_affected() == 0 {
            return Ok(None);
        }
        Self::by_id(pool, id).await
    }

    pub async fn update_password(pool: &PgPool, id: i32, password_hash: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE usuarios SET senha_hash = $2, ultima_atualizacao = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(pool)
            .await?;
        Ok(())
    }
}
