//! Resolve the caller from `Authorization: Bearer <token>`.

use crate::auth::TerritoryClaims;
use crate::error::AppError;
use crate::model::Role;
use crate::service::{User, UserStore};
use crate::state::AppState;
use crate::territory::TerritoryRole;
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

/// Bearer token from the Authorization header, if any.
pub fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| {
            let (scheme, token) = s.trim().split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then_some(token.trim())
        })
        .filter(|t| !t.is_empty())
}

/// An authenticated, active user of the primary API.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn id(&self) -> i32 {
        self.0.id
    }

    pub fn role(&self) -> Role {
        self.0.role
    }

    pub fn require_any(&self, roles: &[Role]) -> Result<(), AppError> {
        if roles.contains(&self.0.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden("Privilégios insuficientes".into()))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| AppError::Unauthorized("Credenciais inválidas".into()))?;
        let user_id = state.tokens.verify_access(token)?;
        let user = UserStore::by_id(&state.pool, user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Credenciais inválidas".into()))?;
        if !user.is_active {
            return Err(AppError::BadRequest("Usuário inativo".into()));
        }
        Ok(CurrentUser(user))
    }
}

/// A caller of the territory API, resolved from token claims only.
#[derive(Clone, Debug)]
pub struct TerritoryCaller {
    pub id: i32,
    pub email: String,
    pub role: TerritoryRole,
}

impl TerritoryCaller {
    pub fn require_any(&self, roles: &[TerritoryRole], message: &str) -> Result<(), AppError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden(message.into()))
        }
    }
}

impl TryFrom<TerritoryClaims> for TerritoryCaller {
    type Error = AppError;

    fn try_from(claims: TerritoryClaims) -> Result<Self, Self::Error> {
        let id = claims
            .sub
            .parse()
            .map_err(|_| AppError::Unauthorized("Token malformado".into()))?;
        Ok(TerritoryCaller {
            id,
            email: claims.email,
            role: claims.tipo_usuario,
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for TerritoryCaller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token =
            bearer_token(parts).ok_or_else(|| AppError::Unauthorized("Token inválido ou expirado".into()))?;
        state.tokens.verify_territory(token)?.try_into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(auth: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(v) = auth {
            builder = builder.header(header::AUTHORIZATION, v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token(&parts(Some("Bearer abc.def"))), Some("abc.def"));
        assert_eq!(bearer_token(&parts(Some("bearer  abc"))), Some("abc"));
    }

    #[test]
    fn other_schemes_and_missing_header_yield_none() {
        assert_eq!(bearer_token(&parts(Some("Basic dXNlcjpwYXNz"))), None);
        assert_eq!(bearer_token(&parts(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts(None)), None);
    }

    #[test]
    fn claims_with_non_numeric_subject_are_rejected() {
        let claims = TerritoryClaims {
            sub: "abc".into(),
            email: "a@b.org".into(),
            tipo_usuario: TerritoryRole::Researcher,
            aud: "territory".into(),
            exp: 0,
            iat: 0,
        };
        assert!(TerritoryCaller::try_from(claims).is_err());
    }
}
