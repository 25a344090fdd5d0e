use crate::error::AppError;
use crate::extractors::TerritoryCaller;
use crate::response::{api_created, api_ok};
use crate::state::AppState;
use crate::territory::{TerritoryCreateRequest, TerritoryRole, TerritoryStore};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

pub async fn list(State(state): State<AppState>, _caller: TerritoryCaller) -> Result<impl IntoResponse, AppError> {
    let rows = TerritoryStore::list(&state.territory_pool).await?;
    Ok(api_ok(format!("Encontrados {} territórios", rows.len()), rows))
}

pub async fn read(
    State(state): State<AppState>,
    _caller: TerritoryCaller,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let territory = TerritoryStore::by_id(&state.territory_pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Território não encontrado".into()))?;
    Ok(api_ok("Território encontrado", territory))
}

pub async fn create(
    State(state): State<AppState>,
    caller: TerritoryCaller,
    Json(body): Json<TerritoryCreateRequest>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_any(
        &[TerritoryRole::Administrator],
        "Acesso negado. Apenas administradores podem cadastrar territórios",
    )?;
    body.validate()?;
    let territory = TerritoryStore::create(&state.territory_pool, &body).await?;
    tracing::info!(territory_id = territory.id, user_id = caller.id, "territory created");
    Ok(api_created("Território cadastrado com sucesso", territory))
}
