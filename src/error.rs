//! Typed errors and HTTP mapping.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Start-up errors: settings and static model problems.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    MissingVar(&'static str),
    #[error("invalid value for {key}: {reason}")]
    InvalidVar { key: &'static str, reason: String },
    #[error("missing reference: {kind} '{id}'")]
    MissingReference { kind: &'static str, id: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Db(e) => match e {
                sqlx::Error::RowNotFound => StatusCode::NOT_FOUND,
                e if is_unique_violation(e) => StatusCode::CONFLICT,
                e if is_foreign_key_violation(e) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config_error",
            AppError::NotFound(_) => "not_found",
            AppError::Validation(_) => "validation_error",
            AppError::Db(sqlx::Error::RowNotFound) => "not_found",
            AppError::Db(_) => "database_error",
            AppError::Conflict(_) => "conflict",
            AppError::BadRequest(_) => "bad_request",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// Message safe to show to the client. Server-side failures are not echoed.
    fn public_message(&self) -> String {
        match self {
            AppError::Db(sqlx::Error::RowNotFound) => "not found".into(),
            AppError::Db(e) if is_unique_violation(e) => "resource already exists".into(),
            AppError::Db(e) if is_foreign_key_violation(e) => "referenced row does not exist".into(),
            AppError::Db(_) | AppError::Config(_) | AppError::Internal(_) => "internal server error".into(),
            AppError::NotFound(m)
            | AppError::Validation(m)
            | AppError::Conflict(m)
            | AppError::BadRequest(m)
            | AppError::Unauthorized(m)
            | AppError::Forbidden(m) => m.clone(),
        }
    }
}

fn sqlstate_is(e: &sqlx::Error, code: &str) -> bool {
    match e {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(code),
        _ => false,
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    sqlstate_is(e, "23505")
}

fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    sqlstate_is(e, "23503")
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.public_message(),
                details: None,
            },
        };
        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_carries_bearer_challenge() {
        let resp = AppError::Unauthorized("invalid credentials".into()).into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(resp.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");
    }

    #[test]
    fn row_not_found_maps_to_404() {
        assert_eq!(AppError::Db(sqlx::Error::RowNotFound).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = AppError::Internal("bcrypt exploded".into());
        assert_eq!(err.public_message(), "internal server error");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
