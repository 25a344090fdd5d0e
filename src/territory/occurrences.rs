use super::types::{OccurrenceCreateRequest, OccurrenceStatus, OccurrenceUpdateRequest};
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use sqlx::PgPool;
use std::collections::BTreeMap;

const OCCURRENCE_COLUMNS: &str = "o.id, o.usuario_id, o.tipo_ocorrencia, o.localizacao, o.grau_severidade, \
     o.descricao, o.coordenadas, o.imagens, o.status, o.notas_investigacao, o.notas_resolucao, \
     o.data_criacao, o.data_atualizacao";

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct TerritoryOccurrence {
    pub id: i32,
    #[sqlx(rename = "usuario_id")]
    #[serde(rename = "usuario_id")]
    pub user_id: i32,
    /// Reporter name, only filled by the administrator listing.
    #[sqlx(rename = "usuario_nome", default)]
    #[serde(rename = "usuario_nome", skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[sqlx(rename = "tipo_ocorrencia")]
    #[serde(rename = "tipo_ocorrencia")]
    pub kind: String,
    #[sqlx(rename = "localizacao")]
    #[serde(rename = "localizacao")]
    pub location: String,
    #[sqlx(rename = "grau_severidade")]
    #[serde(rename = "grau_severidade")]
    pub severity: String,
    #[sqlx(rename = "descricao")]
    #[serde(rename = "descricao")]
    pub description: String,
    #[sqlx(rename = "coordenadas")]
    #[serde(rename = "coordenadas")]
    pub coordinates: Option<Value>,
    #[sqlx(rename = "imagens")]
    #[serde(rename = "imagens")]
    pub images: Value,
    pub status: String,
    #[sqlx(rename = "notas_investigacao")]
    #[serde(rename = "notas_investigacao")]
    pub investigation_notes: Option<String>,
    #[sqlx(rename = "notas_resolucao")]
    #[serde(rename = "notas_resolucao")]
    pub resolution_notes: Option<String>,
    #[sqlx(rename = "data_criacao")]
    #[serde(rename = "data_criacao")]
    pub created_at: DateTime<Utc>,
    #[sqlx(rename = "data_atualizacao")]
    #[serde(rename = "data_atualizacao")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Counts over a set of occurrences.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct OccurrenceStats {
    pub total: u64,
    pub por_tipo: BTreeMap<String, u64>,
    pub por_severidade: BTreeMap<String, u64>,
    pub por_status: BTreeMap<String, u64>,
}

impl OccurrenceStats {
    pub fn from_occurrences(rows: &[TerritoryOccurrence]) -> Self {
        let mut stats = OccurrenceStats::default();
        for occ in rows {
            stats.total += 1;
            *stats.por_tipo.entry(occ.kind.clone()).or_default() += 1;
            *stats.por_severidade.entry(occ.severity.clone()).or_default() += 1;
            *stats.por_status.entry(occ.status.clone()).or_default() += 1;
        }
        stats
    }
}

pub struct OccurrenceStore;

impl OccurrenceStore {
    /// New occurrences always start as `reportada`.
    pub async fn create(
        pool: &PgPool,
        user_id: i32,
        req: &OccurrenceCreateRequest,
    ) -> Result<TerritoryOccurrence, AppError> {
        let coordinates = req.coordinates.map(|c| json!({"lat": c.lat, "lng": c.lng}));
        let sql = format!(
            "INSERT INTO ocorrencias AS o (usuario_id, tipo_ocorrencia, localizacao, grau_severidade, descricao, \
             coordenadas, imagens, status) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
            OCCURRENCE_COLUMNS
        );
        Ok(sqlx::query_as::<_, TerritoryOccurrence>(&sql)
            .bind(user_id)
            .bind(req.kind.as_str())
            .bind(req.location.trim())
            .bind(req.severity.as_str())
            .bind(req.description.trim())
            .bind(coordinates)
            .bind(req.images_json())
            .bind(OccurrenceStatus::Reported.as_str())
            .fetch_one(pool)
            .await?)
    }

    pub async fn list_for_user(pool: &PgPool, user_id: i32) -> Result<Vec<TerritoryOccurrence>, AppError> {
        let sql = format!(
            "SELECT {} FROM ocorrencias o WHERE o.usuario_id = $1 ORDER BY o.data_criacao DESC, o.id DESC",
            OCCURRENCE_COLUMNS
        );
        Ok(sqlx::query_as::<_, TerritoryOccurrence>(&sql)
            .bind(user_id)
            .fetch_all(pool)
            .await?)
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<TerritoryOccurrence>, AppError> {
        let sql = format!(
            "SELECT {}, u.nome AS usuario_nome FROM ocorrencias o LEFT JOIN usuarios u ON u.id = o.usuario_id \
             ORDER BY o.data_criacao DESC, o.id DESC",
            OCCURRENCE_COLUMNS
        );
        Ok(sqlx::query_as::<_, TerritoryOccurrence>(&sql).fetch_all(pool).await?)
    }

    pub async fn by_id(pool: &PgPool, id: i32) -> Result<Option<TerritoryOccurrence>, AppError> {
        let sql = format!("SELECT {} FROM ocorrencias o WHERE o.id = $1", OCCURRENCE_COLUMNS);
        Ok(sqlx::query_as::<_, TerritoryOccurrence>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?)
    }

    pub async fn update(
        pool: &PgPool,
        id: i32,
        req: &OccurrenceUpdateRequest,
    ) -> Result<Option<TerritoryOccurrence>, AppError> {
        let sql = format!(
            "UPDATE ocorrencias AS o SET status = COALESCE($2, o.status), \
             notas_investigacao = COALESCE($3, o.notas_investigacao), \
             notas_resolucao = COALESCE($4, o.notas_resolucao), data_atualizacao = NOW() \
             WHERE o.id = $1 RETURNING {}",
            OCCURRENCE_COLUMNS
        );
        Ok(sqlx::query_as::<_, TerritoryOccurrence>(&sql)
            .bind(id)
            .bind(req.status.map(|s| s.as_str()))
            .bind(&req.investigation_notes)
            .bind(&req.resolution_notes)
            .fetch_optional(pool)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occ(kind: &str, severity: &str, status: &str) -> TerritoryOccurrence {
        TerritoryOccurrence {
            id: 1,
            user_id: 1,
            user_name: None,
            kind: kind.into(),
            location: "Aldeia Central".into(),
            severity: severity.into(),
            description: "Descrição da ocorrência".into(),
            coordinates: None,
            images: json!([]),
            status: status.into(),
            investigation_notes: None,
            resolution_notes: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn stats_group_by_kind_severity_and_status() {
        let rows = vec![
            occ("queimada", "alta", "reportada"),
            occ("queimada", "media", "resolvida"),
            occ("desmatamento", "alta", "reportada"),
        ];
        let stats = OccurrenceStats::from_occurrences(&rows);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.por_tipo["queimada"], 2);
        assert_eq!(stats.por_severidade["alta"], 2);
        assert_eq!(stats.por_status["resolvida"], 1);
    }

    #[test]
    fn empty_stats_serialize_with_empty_maps() {
        let v = serde_json::to_value(OccurrenceStats::from_occurrences(&[])).unwrap();
        assert_eq!(v, json!({"total": 0, "por_tipo": {}, "por_severidade": {}, "por_status": {}}));
    }

    #[test]
    fn reporter_name_is_omitted_unless_joined() {
        let v = serde_json::to_value(occ("enchente", "baixa", "reportada")).unwrap();
        assert!(v.get("usuario_nome").is_none());
        assert_eq!(v["tipo_ocorrencia"], "enchente");
    }
}
