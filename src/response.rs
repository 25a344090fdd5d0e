//! Response envelopes. The primary API wraps payloads in `data`/`meta`; the
//! territory API keeps its own `success`/`message`/`data` shape.

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct SuccessOne<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

#[derive(Serialize)]
pub struct SuccessMany<T> {
    pub data: Vec<T>,
    pub meta: MetaPage,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct MetaPage {
    pub count: u64,
    pub total: u64,
    pub skip: u32,
    pub limit: u32,
}

pub fn success_one<T: Serialize>(data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    (StatusCode::CREATED, Json(SuccessOne { data, meta: None }))
}

pub fn success_one_ok<T: Serialize>(data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    (StatusCode::OK, Json(SuccessOne { data, meta: None }))
}

pub fn success_page<T: Serialize>(
    data: Vec<T>,
    total: u64,
    skip: u32,
    limit: u32,
) -> (StatusCode, Json<SuccessMany<T>>) {
    let count = data.len() as u64;
    (
        StatusCode::OK,
        Json(SuccessMany {
            data,
            meta: MetaPage {
                count,
                total,
                skip,
                limit,
            },
        }),
    )
}

/// Territory envelope.
#[derive(Serialize, Debug)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub fn api_ok<T: Serialize>(message: impl Into<String>, data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (
        StatusCode::OK,
        Json(ApiResponse {
            success: true,
            message: message.into(),
            data: Some(data),
        }),
    )
}

pub fn api_created<T: Serialize>(message: impl Into<String>, data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (
        StatusCode::CREATED,
        Json(ApiResponse {
            success: true,
            message: message.into(),
            data: Some(data),
        }),
    )
}

pub fn api_message(message: impl Into<String>) -> (StatusCode, Json<ApiResponse<()>>) {
    (
        StatusCode::OK,
        Json(ApiResponse {
            success: true,
            message: message.into(),
            data: None,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_meta_counts_returned_rows() {
        let (status, Json(body)) = success_page(vec![1, 2, 3], 10, 3, 3);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body.meta,
            MetaPage {
                count: 3,
                total: 10,
                skip: 3,
                limit: 3
            }
        );
    }

    #[test]
    fn territory_message_omits_data() {
        let (_, Json(body)) = api_message("Logout realizado com sucesso");
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v, serde_json::json!({"success": true, "message": "Logout realizado com sucesso"}));
    }
}
