//! Occurrence reports in the territory schema.

use crate::error::AppError;
use crate::extractors::TerritoryCaller;
use crate::response::api_ok;
use crate::state::AppState;
use crate::territory::{
    OccurrenceCreateRequest, OccurrenceStats, OccurrenceStore, OccurrenceUpdateRequest, TerritoryRole,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

const REVIEWERS: &[TerritoryRole] = &[TerritoryRole::Administrator, TerritoryRole::TerritorialLeader];

pub async fn create(
    State(state): State<AppState>,
    caller: TerritoryCaller,
    Json(body): Json<OccurrenceCreateRequest>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    let occurrence = OccurrenceStore::create(&state.territory_pool, caller.id, &body).await?;
    tracing::info!(
        occurrence_id = occurrence.id,
        user_id = caller.id,
        kind = %body.kind,
        severity = %body.severity,
        "occurrence reported"
    );
    Ok(api_ok("Ocorrência reportada com sucesso", occurrence))
}

pub async fn list_mine(State(state): State<AppState>, caller: TerritoryCaller) -> Result<impl IntoResponse, AppError> {
    let rows = OccurrenceStore::list_for_user(&state.territory_pool, caller.id).await?;
    Ok(api_ok(format!("Encontradas {} ocorrências", rows.len()), rows))
}

pub async fn list_all(State(state): State<AppState>, caller: TerritoryCaller) -> Result<impl IntoResponse, AppError> {
    caller.require_any(
        &[TerritoryRole::Administrator],
        "Acesso negado. Apenas administradores podem ver todas as ocorrências",
    )?;
    let rows = OccurrenceStore::list_all(&state.territory_pool).await?;
    Ok(api_ok(format!("Encontradas {} ocorrências", rows.len()), rows))
}

pub async fn stats(State(state): State<AppState>, caller: TerritoryCaller) -> Result<impl IntoResponse, AppError> {
    let rows = OccurrenceStore::list_for_user(&state.territory_pool, caller.id).await?;
    Ok(api_ok(
        "Estatísticas calculadas com sucesso",
        OccurrenceStats::from_occurrences(&rows),
    ))
}

/// Visible to the reporter and to administrators.
pub async fn read(
    State(state): State<AppState>,
    caller: TerritoryCaller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let occurrence = OccurrenceStore::by_id(&state.territory_pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Ocorrência não encontrada".into()))?;
    if occurrence.user_id != caller.id {
        caller.require_any(&[TerritoryRole::Administrator], "Acesso negado a esta ocorrência")?;
    }
    Ok(api_ok("Ocorrência encontrada", occurrence))
}

pub async fn update(
    State(state): State<AppState>,
    caller: TerritoryCaller,
    Path(id): Path<i32>,
    Json(body): Json<OccurrenceUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_any(
        REVIEWERS,
        "Acesso negado. Apenas administradores e líderes territoriais podem atualizar ocorrências",
    )?;
    body.validate()?;
    let occurrence = OccurrenceStore::update(&state.territory_pool, id, &body)
        .await?
        .ok_or_else(|| AppError::NotFound("Ocorrência não encontrada".into()))?;
    tracing::info!(occurrence_id = id, user_id = caller.id, status = %occurrence.status, "occurrence updated");
    Ok(api_ok("Ocorrência atualizada com sucesso", occurrence))
}
