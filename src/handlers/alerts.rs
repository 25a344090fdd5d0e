//! Alert creation with addressee notification, and status transitions.

use super::entity::{create_row, visible_row};
use crate::error::AppError;
use crate::extractors::CurrentUser;
use crate::model::{EntityDef, Role};
use crate::response::{success_one, success_one_ok};
use crate::service::{row_id, row_owner, CrudService, UserStore};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

const ALERTS: &str = "alerts";

fn alerts(state: &AppState) -> Result<&EntityDef, AppError> {
    state
        .model
        .entity_by_path(ALERTS)
        .ok_or_else(|| AppError::NotFound(ALERTS.into()))
}

/// Emails the addressee when they accept notifications, then flags the row.
async fn notify(state: &AppState, alert: &mut Value) -> Result<(), AppError> {
    let Some(user_id) = row_owner(alert, "user_id").and_then(|id| i32::try_from(id).ok()) else {
        return Ok(());
    };
    let Some(user) = UserStore::by_id(&state.pool, user_id).await? else {
        return Ok(());
    };
    if !user.notifications_enabled {
        return Ok(());
    }
    let title = alert.get("title").and_then(Value::as_str).unwrap_or_default();
    let description = alert.get("description").and_then(Value::as_str).unwrap_or_default();
    state
        .mailer
        .send_alert_notification(&user.email, &user.name, title, description)
        .await;
    if let Some(id) = row_id(alert) {
        sqlx::query("UPDATE alerts SET notifications_sent = TRUE WHERE id = $1")
            .bind(id)
            .execute(&state.pool)
            .await?;
        if let Some(obj) = alert.as_object_mut() {
            obj.insert("notifications_sent".into(), Value::Bool(true));
        }
    }
    Ok(())
}

pub async fn create(
    State(state): State<AppState>,
    caller: CurrentUser,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let entity = alerts(&state)?;
    let mut row = create_row(&state, entity, &caller, body).await?;
    notify(&state, &mut row).await?;
    Ok(success_one(row))
}

/// Staff may move any alert; other users only alerts addressed to them.
fn may_transition(alert: &Value, caller: &CurrentUser) -> Result<(), AppError> {
    if row_owner(alert, "user_id") == Some(i64::from(caller.id())) {
        return Ok(());
    }
    caller.require_any(&[Role::Admin, Role::CommunityLeader])
}

async fn transition(state: &AppState, caller: &CurrentUser, id: i64, status: &str) -> Result<Value, AppError> {
    let entity = alerts(state)?;
    let current = visible_row(state, entity, caller, id).await?;
    may_transition(&current, caller)?;
    let mut body = HashMap::new();
    body.insert("status".to_string(), Value::String(status.to_string()));
    let stamps = if current.get("status").and_then(Value::as_str) == Some(status) {
        Vec::new()
    } else {
        entity.stamps_for_status(status)
    };
    let row = CrudService::update(&state.pool, entity, id, &body, &stamps)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("alerts {} not found", id)))?;
    tracing::info!(alert_id = id, status, user_id = caller.id(), "alert status changed");
    Ok(row)
}

pub async fn acknowledge(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    caller: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(transition(&state, &caller, i64::from(id), "acknowledged").await?))
}

pub async fn resolve(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    caller: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(transition(&state, &caller, i64::from(id), "resolved").await?))
}

pub async fn dismiss(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    caller: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(transition(&state, &caller, i64::from(id), "dismissed").await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::entity::tests::caller;
    use serde_json::json;

    #[test]
    fn addressee_or_staff_move_alerts() {
        let addressed = json!({"id": 5, "user_id": 10});
        assert!(may_transition(&addressed, &caller(10, Role::CommunityMember)).is_ok());
        assert!(may_transition(&addressed, &caller(1, Role::CommunityLeader)).is_ok());
        assert!(may_transition(&addressed, &caller(1, Role::Admin)).is_ok());
        let err = may_transition(&addressed, &caller(11, Role::Researcher)).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let broadcast = json!({"id": 6, "user_id": null});
        assert!(may_transition(&broadcast, &caller(10, Role::CommunityMember)).is_err());
        assert!(may_transition(&broadcast, &caller(1, Role::CommunityLeader)).is_ok());
    }
}
