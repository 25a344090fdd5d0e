//! HS256 bearer tokens. Three kinds share one secret and are kept apart by
//! audience (primary vs territory) and by `typ` (password reset).

use crate::config::Settings;
use crate::error::AppError;
use crate::territory::TerritoryRole;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

pub const PRIMARY_AUDIENCE: &str = "ecosolo";
pub const TERRITORY_AUDIENCE: &str = "territory";
const RESET_TYPE: &str = "reset";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessClaims {
    /// User id.
    pub sub: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResetClaims {
    /// Email of the account being reset.
    pub sub: String,
    pub typ: String,
    pub exp: i64,
    pub nbf: i64,
    pub iat: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TerritoryClaims {
    pub sub: String,
    pub email: String,
    pub tipo_usuario: TerritoryRole,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
}

/// A freshly signed token and its lifetime in seconds.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: i64,
}

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    territory_ttl: Duration,
    reset_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, access_ttl: Duration, territory_ttl: Duration, reset_ttl: Duration) -> Self {
        TokenService {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            territory_ttl,
            reset_ttl,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            &settings.secret_key,
            Duration::minutes(settings.access_token_expire_minutes),
            Duration::hours(settings.territory_token_expire_hours),
            Duration::minutes(settings.reset_token_expire_minutes),
        )
    }

    pub fn issue_access(&self, user_id: i32) -> Result<IssuedToken, AppError> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user_id.to_string(),
            aud: PRIMARY_AUDIENCE.into(),
            exp: (now + self.access_ttl).timestamp(),
            iat: now.timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        };
        Ok(IssuedToken {
            token: self.sign(&claims)?,
            expires_in: self.access_ttl.num_seconds(),
        })
    }

    /// Returns the user id of a valid primary access token.
    pub fn verify_access(&self, token: &str) -> Result<i32, AppError> {
        let claims: AccessClaims = self.check(token, Some(PRIMARY_AUDIENCE))?;
        claims
            .sub
            .parse()
            .map_err(|_| AppError::Unauthorized("Credenciais inválidas".into()))
    }

    pub fn issue_reset(&self, email: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = ResetClaims {
            sub: email.to_string(),
            typ: RESET_TYPE.into(),
            exp: (now + self.reset_ttl).timestamp(),
            nbf: now.timestamp(),
            iat: now.timestamp(),
        };
        self.sign(&claims)
    }

    /// Returns the email of a valid reset token. Access tokens are rejected.
    pub fn verify_reset(&self, token: &str) -> Result<String, AppError> {
        let claims: ResetClaims = self
            .check(token, None)
            .map_err(|_| AppError::BadRequest("Token inválido ou expirado".into()))?;
        if claims.typ != RESET_TYPE {
            return Err(AppError::BadRequest("Token inválido ou expirado".into()));
        }
        Ok(claims.sub)
    }

    pub fn issue_territory(&self, user_id: i32, email: &str, role: TerritoryRole) -> Result<IssuedToken, AppError> {
        let now = Utc::now();
        let claims = TerritoryClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            tipo_usuario: role,
            aud: TERRITORY_AUDIENCE.into(),
            exp: (now + self.territory_ttl).timestamp(),
            iat: now.timestamp(),
        };
        Ok(IssuedToken {
            token: self.sign(&claims)?,
            expires_in: self.territory_ttl.num_seconds(),
        })
    }

    pub fn verify_territory(&self, token: &str) -> Result<TerritoryClaims, AppError> {
        self.check(token, Some(TERRITORY_AUDIENCE))
            .map_err(|_| AppError::Unauthorized("Token inválido ou expirado".into()))
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("token signing: {}", e)))
    }

    /// Tokens carrying an audience are only accepted when `audience` matches; tokens without one
    /// are only accepted when `audience` is None.
    fn check<T: serde::de::DeserializeOwned>(&self, token: &str, audience: Option<&str>) -> Result<T, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_nbf = true;
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }
        let data = decode::<T>(token, &self.decoding, &validation).map_err(|e| {
            tracing::debug!(error = %e, "token rejected");
            AppError::Unauthorized("Credenciais inválidas".into())
        })?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret", Duration::minutes(30), Duration::hours(8), Duration::minutes(60))
    }

    #[test]
    fn access_round_trip() {
        let tokens = service();
        let issued = tokens.issue_access(7).unwrap();
        assert_eq!(issued.expires_in, 1800);
        assert_eq!(tokens.verify_access(&issued.token).unwrap(), 7);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let issued = service().issue_access(7).unwrap();
        let other = TokenService::new("other", Duration::minutes(30), Duration::hours(8), Duration::minutes(60));
        assert!(matches!(other.verify_access(&issued.token), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn expired_access_token_is_rejected() {
        let tokens = TokenService::new("test-secret", Duration::hours(-2), Duration::hours(8), Duration::minutes(60));
        let issued = tokens.issue_access(7).unwrap();
        assert!(tokens.verify_access(&issued.token).is_err());
    }

    #[test]
    fn audiences_do_not_mix() {
        let tokens = service();
        let territory = tokens
            .issue_territory(3, "ana@aldeia.org", TerritoryRole::Administrator)
            .unwrap();
        assert!(tokens.verify_access(&territory.token).is_err());

        let primary = tokens.issue_access(3).unwrap();
        assert!(tokens.verify_territory(&primary.token).is_err());

        let claims = tokens.verify_territory(&territory.token).unwrap();
        assert_eq!(claims.tipo_usuario, TerritoryRole::Administrator);
        assert_eq!(claims.email, "ana@aldeia.org");
        assert_eq!(territory.expires_in, 8 * 3600);
    }

    #[test]
    fn reset_tokens_are_not_access_tokens() {
        let tokens = service();
        let reset = tokens.issue_reset("priya@example.com").unwrap();
        assert_eq!(tokens.verify_reset(&reset).unwrap(), "priya@example.com");
        assert!(tokens.verify_access(&reset).is_err());

        let access = tokens.issue_access(1).unwrap();
        assert!(matches!(tokens.verify_reset(&access.token), Err(AppError::BadRequest(_))));
    }
}
