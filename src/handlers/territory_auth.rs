//! Registration, login and profile for the territory schema.

use crate::auth::{password, IssuedToken};
use crate::error::AppError;
use crate::extractors::TerritoryCaller;
use crate::response::{api_message, api_ok};
use crate::state::AppState;
use crate::territory::{
    ChangePasswordRequest, LoginRequest, ProfileUpdateRequest, RegisterRequest, TerritoryRole, TerritoryStore,
    TerritoryUser, TerritoryUserStore,
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::json;

const SERVICE_NAME: &str = "Naurú Yvy Authentication Service";

/// Login and registration result.
#[derive(Debug, Serialize)]
pub struct TerritoryToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user_info: TerritoryUser,
}

impl TerritoryToken {
    fn new(issued: IssuedToken, user: TerritoryUser) -> Self {
        TerritoryToken {
            access_token: issued.token,
            token_type: "bearer",
            expires_in: issued.expires_in,
            user_info: user,
        }
    }
}

pub async fn health(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    if let Err(e) = sqlx::query("SELECT 1").execute(&state.territory_pool).await {
        tracing::error!(error = %e, "territory database unreachable");
        return Ok((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"status": "unhealthy", "detail": "Serviço indisponível"})),
        ));
    }
    Ok((
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": SERVICE_NAME,
            "version": env!("CARGO_PKG_VERSION"),
            "database_connection": {"status": "connected"},
            "endpoints": [
                "/auth/register - Registro de usuários",
                "/auth/login - Login de usuários",
                "/auth/me - Informações do usuário logado",
                "/auth/health - Status do serviço",
            ],
        })),
    ))
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let req = body.validate()?;
    let pool = &state.territory_pool;
    if TerritoryUserStore::email_exists(pool, &req.email).await? {
        tracing::warn!(email = %req.email, "territory registration with existing email");
        return Err(AppError::BadRequest("Email já cadastrado no sistema".into()));
    }
    if let Some(territory_id) = req.territory_id {
        if !TerritoryStore::exists(pool, territory_id).await? {
            return Err(AppError::BadRequest(format!("Território {} não encontrado", territory_id)));
        }
    }
    let hash = password::hash(&req.password, state.settings.bcrypt_cost).await?;
    let user = TerritoryUserStore::create(pool, &req, &hash).await?;
    let issued = state.tokens.issue_territory(user.id, &user.email, req.role)?;
    tracing::info!(user_id = user.id, email = %user.email, role = %req.role, "territory user registered");
    Ok(Json(TerritoryToken::new(issued, user)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = TerritoryUserStore::by_email(&state.territory_pool, &body.email).await?;
    let verified = match &user {
        Some(u) => password::verify(&body.password, &u.password_hash).await?,
        None => false,
    };
    let user = match user {
        Some(u) if verified => u,
        _ => {
            tracing::warn!(email = %body.email.trim(), "territory login failed");
            return Err(AppError::Unauthorized("Email ou senha incorretos".into()));
        }
    };
    if !user.is_active() {
        tracing::warn!(user_id = user.id, status = %user.status, "territory login refused");
        return Err(AppError::Forbidden(format!("Usuário com status {}", user.status)));
    }
    let issued = state.tokens.issue_territory(user.id, &user.email, user.role()?)?;
    tracing::info!(user_id = user.id, "territory login");
    Ok(Json(TerritoryToken::new(issued, user)))
}

async fn load_user(state: &AppState, caller: &TerritoryCaller) -> Result<TerritoryUser, AppError> {
    TerritoryUserStore::by_id(&state.territory_pool, caller.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Usuário não encontrado".into()))
}

pub async fn me(State(state): State<AppState>, caller: TerritoryCaller) -> Result<impl IntoResponse, AppError> {
    let user = load_user(&state, &caller).await?;
    Ok(api_ok("Usuário encontrado", user))
}

pub async fn logout(caller: TerritoryCaller) -> Result<impl IntoResponse, AppError> {
    tracing::info!(email = %caller.email, "territory logout");
    Ok(api_message("Logout realizado com sucesso"))
}

#[derive(Debug, Serialize)]
struct RoleInfo {
    value: &'static str,
    label: &'static str,
    description: &'static str,
}

fn role_catalog() -> Vec<RoleInfo> {
    TerritoryRole::ALL
        .iter()
        .map(|r| RoleInfo {
            value: r.as_str(),
            label: r.label(),
            description: r.description(),
        })
        .collect()
}

pub async fn user_types() -> impl IntoResponse {
    api_ok("Tipos de usuário disponíveis", json!({ "tipos": role_catalog() }))
}

pub async fn update_profile(
    State(state): State<AppState>,
    caller: TerritoryCaller,
    Json(body): Json<ProfileUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    if body.is_empty() {
        return Err(AppError::BadRequest("Nenhum campo para atualizar".into()));
    }
    let user = TerritoryUserStore::update_profile(&state.territory_pool, caller.id, &body)
        .await?
        .ok_or_else(|| AppError::NotFound("Usuário não encontrado".into()))?;
    tracing::info!(user_id = caller.id, "territory profile updated");
    Ok(api_ok("Perfil atualizado com sucesso", user))
}

pub async fn change_password(
    State(state): State<AppState>,
    caller: TerritoryCaller,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    let user = load_user(&state, &caller).await?;
    if !password::verify(&body.current_password, &user.password_hash).await? {
        return Err(AppError::BadRequest("Senha atual incorreta".into()));
    }
    let hash = password::hash(&body.new_password, state.settings.bcrypt_cost).await?;
    TerritoryUserStore::update_password(&state.territory_pool, user.id, &hash).await?;
    tracing::info!(user_id = user.id, "territory password changed");
    Ok(api_message("Senha atualizada com sucesso"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lists_every_role_in_order() {
        let catalog = role_catalog();
        let values: Vec<_> = catalog.iter().map(|r| r.value).collect();
        assert_eq!(
            values,
            vec![
                "administrador",
                "lider_territorial",
                "monitor_ambiental",
                "membro_comunidade",
                "pesquisador"
            ]
        );
        assert_eq!(catalog[1].label, "Líder Territorial");
    }
}
