//! Login, registration, token refresh and password reset for the primary API.

use crate::auth::{password, IssuedToken};
use crate::error::AppError;
use crate::extractors::CurrentUser;
use crate::model::Role;
use crate::response::{success_one, success_one_ok};
use crate::service::{is_valid_email, NewUser, UserResponse, UserStore};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;

const MIN_PASSWORD_LEN: usize = 6;
const RESET_REQUEST_MESSAGE: &str = "Se o email existir, você receberá instruções para reset";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

impl From<IssuedToken> for TokenResponse {
    fn from(t: IssuedToken) -> Self {
        TokenResponse {
            access_token: t.token,
            token_type: "bearer",
            expires_in: t.expires_in,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: Option<Role>,
    pub age: Option<i32>,
    pub bio: Option<String>,
    pub notifications_enabled: Option<bool>,
    pub language: Option<String>,
}

impl RegisterRequest {
    fn validate(&self) -> Result<(), AppError> {
        if !is_valid_email(self.email.trim()) {
            return Err(AppError::Validation("email must be a valid email address".into()));
        }
        let name_len = self.name.trim().chars().count();
        if !(1..=100).contains(&name_len) {
            return Err(AppError::Validation("name must be between 1 and 100 characters".into()));
        }
        check_password_length(&self.password)?;
        if let Some(age) = self.age {
            if !(0..=150).contains(&age) {
                return Err(AppError::Validation("age must be between 0 and 150".into()));
            }
        }
        if let Some(role) = self.role {
            if !role.self_assignable() {
                return Err(AppError::Forbidden("Privilégios insuficientes".into()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordReset {
    pub token: String,
    pub new_password: String,
}

fn check_password_length(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = UserStore::by_email(&state.pool, &body.email).await?;
    let verified = match &user {
        Some(u) => password::verify(&body.password, &u.hashed_password).await?,
        None => false,
    };
    let user = match user {
        Some(u) if verified => u,
        _ => {
            tracing::warn!(email = %body.email.trim(), "login failed");
            return Err(AppError::Unauthorized("Email ou senha incorretos".into()));
        }
    };
    if !user.is_active {
        return Err(AppError::BadRequest("Usuário inativo".into()));
    }
    UserStore::touch_last_login(&state.pool, user.id).await?;
    let token = state.tokens.issue_access(user.id)?;
    tracing::info!(user_id = user.id, "login");
    Ok(success_one_ok(TokenResponse::from(token)))
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    if UserStore::by_email(&state.pool, &body.email).await?.is_some() {
        return Err(AppError::BadRequest("Email já cadastrado no sistema".into()));
    }
    let hashed_password = password::hash(&body.password, state.settings.bcrypt_cost).await?;
    let user = UserStore::create(
        &state.pool,
        &NewUser {
            email: body.email,
            hashed_password,
            name: body.name,
            role: body.role.unwrap_or(Role::CommunityMember),
            age: body.age,
            bio: body.bio,
            notifications_enabled: body.notifications_enabled.unwrap_or(true),
            language: body.language.unwrap_or_else(|| "pt-BR".into()),
        },
    )
    .await?;
    state.mailer.send_welcome(&user.email, &user.name).await;
    tracing::info!(user_id = user.id, email = %user.email, "registered");
    Ok(success_one(UserResponse::from(user)))
}

pub async fn refresh(State(state): State<AppState>, caller: CurrentUser) -> Result<impl IntoResponse, AppError> {
    let token = state.tokens.issue_access(caller.id())?;
    Ok(success_one_ok(TokenResponse::from(token)))
}

/// Answers identically whether or not the email exists.
pub async fn password_reset_request(
    State(state): State<AppState>,
    Json(body): Json<ResetRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(user) = UserStore::by_email(&state.pool, &body.email).await? {
        let token = state.tokens.issue_reset(&user.email)?;
        state.mailer.send_reset_password(&user.email, &user.name, &token).await;
        tracing::info!(user_id = user.id, "password reset requested");
    }
    Ok(success_one_ok(json!({ "message": RESET_REQUEST_MESSAGE })))
}

pub async fn password_reset(
    State(state): State<AppState>,
    Json(body): Json<PasswordReset>,
) -> Result<impl IntoResponse, AppError> {
    check_password_length(&body.new_password)?;
    let email = state.tokens.verify_reset(&body.token)?;
    let user = UserStore::by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| AppError::NotFound("Usuário não encontrado".into()))?;
    let hashed = password::hash(&body.new_password, state.settings.bcrypt_cost).await?;
    UserStore::update_password(&state.pool, user.id, &hashed).await?;
    tracing::info!(user_id = user.id, "password reset");
    Ok(success_one_ok(json!({ "message": "Senha atualizada com sucesso" })))
}

pub async fn verify_token(caller: CurrentUser) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(json!({
        "valid": true,
        "user_id": caller.id(),
        "email": caller.0.email,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(role: Option<Role>) -> RegisterRequest {
        RegisterRequest {
            email: "nova@ecosolo.com".into(),
            name: "Nova Pessoa".into(),
            password: "segredo".into(),
            role,
            age: Some(30),
            bio: None,
            notifications_enabled: None,
            language: None,
        }
    }

    #[test]
    fn admin_role_cannot_be_self_assigned() {
        let err = request(Some(Role::Admin)).validate().unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(request(Some(Role::Researcher)).validate().is_ok());
        assert!(request(None).validate().is_ok());
    }

    #[test]
    fn short_passwords_and_bad_emails_are_rejected() {
        let mut r = request(None);
        r.password = "12345".into();
        assert!(matches!(r.validate(), Err(AppError::Validation(_))));
        let mut r = request(None);
        r.email = "not-an-email".into();
        assert!(matches!(r.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn token_response_is_bearer() {
        let body = TokenResponse::from(IssuedToken {
            token: "t".into(),
            expires_in: 1800,
        });
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["token_type"], "bearer");
        assert_eq!(v["expires_in"], 1800);
    }
}
