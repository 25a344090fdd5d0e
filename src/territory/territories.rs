use super::types::TerritoryCreateRequest;
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

const TERRITORY_COLUMNS: &str =
    "id, nome, estado, municipio, area_hectares, populacao, coordenadas_lat, coordenadas_lng, data_criacao";

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Territory {
    pub id: i32,
    #[sqlx(rename = "nome")]
    #[serde(rename = "nome")]
    pub name: String,
    #[sqlx(rename = "estado")]
    #[serde(rename = "estado")]
    pub state: String,
    #[sqlx(rename = "municipio")]
    #[serde(rename = "municipio")]
    pub municipality: String,
    pub area_hectares: Option<f64>,
    #[sqlx(rename = "populacao")]
    #[serde(rename = "populacao")]
    pub population: Option<i32>,
    #[sqlx(rename = "coordenadas_lat")]
    #[serde(rename = "coordenadas_lat")]
    pub latitude: Option<f64>,
    #[sqlx(rename = "coordenadas_lng")]
    #[serde(rename = "coordenadas_lng")]
    pub longitude: Option<f64>,
    #[sqlx(rename = "data_criacao")]
    #[serde(rename = "data_criacao")]
    pub created_at: DateTime<Utc>,
}

pub struct TerritoryStore;

impl TerritoryStore {
    pub async fn list(pool: &PgPool) -> Result<Vec<Territory>, AppError> {
        let sql = format!("SELECT {} FROM territorios ORDER BY nome", TERRITORY_COLUMNS);
        Ok(sqlx::query_as::<_, Territory>(&sql).fetch_all(pool).await?)
    }

    pub async fn by_id(pool: &PgPool, id: i32) -> Result<Option<Territory>, AppError> {
        let sql = format!("SELECT {} FROM territorios WHERE id = $1", TERRITORY_COLUMNS);
        Ok(sqlx::query_as::<_, Territory>(&sql).bind(id).fetch_optional(pool).await?)
    }

    pub async fn exists(pool: &PgPool, id: i32) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM territorios WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await?;
        Ok(exists)
    }

    pub async fn create(pool: &PgPool, req: &TerritoryCreateRequest) -> Result<Territory, AppError> {
        let sql = format!(
            "INSERT INTO territorios (nome, estado, municipio, area_hectares, populacao, coordenadas_lat, \
             coordenadas_lng) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            TERRITORY_COLUMNS
        );
        Ok(sqlx::query_as::<_, Territory>(&sql)
            .bind(req.name.trim())
            .bind(req.state.trim())
            .bind(req.municipality.trim())
            .bind(req.area_hectares)
            .bind(req.population)
            .bind(req.latitude)
            .bind(req.longitude)
            .fetch_one(pool)
            .await?)
    }
}
