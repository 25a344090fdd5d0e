//! Entity CRUD handlers for soil analyses, occurrences and alerts. The entity is
//! chosen by the `EntityPath` extension attached when routes are registered.

use crate::error::AppError;
use crate::extractors::CurrentUser;
use crate::model::{EntityDef, ValueKind};
use crate::response::{success_one, success_one_ok, success_page};
use crate::service::{row_owner, CrudService, RequestValidator};
use crate::sql::Scope;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde_json::Value;
use std::collections::HashMap;

/// Path segment of the entity a route serves.
#[derive(Clone, Copy, Debug)]
pub struct EntityPath(pub &'static str);

pub(crate) fn entity<'a>(state: &'a AppState, path: &EntityPath) -> Result<&'a EntityDef, AppError> {
    state
        .model
        .entity_by_path(path.0)
        .ok_or_else(|| AppError::NotFound(path.0.to_string()))
}

pub(crate) fn body_to_map(value: Value) -> Result<HashMap<String, Value>, AppError> {
    match value {
        Value::Object(m) => Ok(m.into_iter().collect()),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

fn is_owner(entity: &EntityDef, row: &Value, caller: &CurrentUser) -> bool {
    entity
        .access
        .owner_column
        .and_then(|col| row_owner(row, col))
        .map_or(false, |owner| owner == i64::from(caller.id()))
}

/// Whether the caller may see a row at all. Invisible rows are reported as not found.
fn can_see(entity: &EntityDef, row: &Value, caller: &CurrentUser) -> bool {
    let policy = &entity.access;
    let Some(owner_col) = policy.owner_column else { return true };
    policy.sees_everything(caller.role())
        || is_owner(entity, row, caller)
        || (policy.null_owner_is_public && row_owner(row, owner_col).is_none())
}

fn scope_for<'a>(entity: &'a EntityDef, caller: &CurrentUser) -> Option<Scope<'a>> {
    let policy = &entity.access;
    let owner_column = policy.owner_column?;
    if policy.sees_everything(caller.role()) {
        return None;
    }
    Some(Scope {
        owner_column,
        owner_id: i64::from(caller.id()),
        include_unowned: policy.null_owner_is_public,
    })
}

/// Query-string value for a filter column, typed by the column kind.
fn filter_value(entity: &EntityDef, col: &str, raw: &str) -> Result<Value, AppError> {
    let Some(info) = entity.column(col) else {
        return Ok(Value::String(raw.to_string()));
    };
    match info.kind {
        ValueKind::Integer => raw
            .parse::<i32>()
            .map(Value::from)
            .map_err(|_| AppError::Validation(format!("{} must be an integer", col))),
        ValueKind::Bool => match raw.to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(AppError::Validation(format!("{} must be true or false", col))),
        },
        ValueKind::Enum => {
            let allowed = info.rule.allowed.unwrap_or(&[]);
            if allowed.contains(&raw) {
                Ok(Value::String(raw.to_string()))
            } else {
                Err(AppError::Validation(format!("{} must be one of: {}", col, allowed.join(", "))))
            }
        }
        _ => Ok(Value::String(raw.to_string())),
    }
}

fn parse_page_param(params: &HashMap<String, String>, key: &str) -> Result<Option<u32>, AppError> {
    params
        .get(key)
        .map(|v| {
            v.parse::<u32>()
                .map_err(|_| AppError::Validation(format!("{} must be a non-negative integer", key)))
        })
        .transpose()
}

pub async fn list(
    State(state): State<AppState>,
    Extension(path): Extension<EntityPath>,
    caller: CurrentUser,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity(&state, &path)?;
    let (skip, limit) = state.settings.pagination.resolve(
        parse_page_param(&params, "skip")?,
        parse_page_param(&params, "limit")?,
    );

    let mut filters: Vec<(String, Value)> = Vec::new();
    for (k, v) in &params {
        if entity.filters.contains(&k.as_str()) {
            filters.push((k.clone(), filter_value(entity, k, v)?));
        }
    }
    filters.sort_by(|a, b| a.0.cmp(&b.0));

    let scope = scope_for(entity, &caller);
    let rows = CrudService::list(&state.pool, entity, &filters, scope.as_ref(), limit, skip).await?;
    let total = CrudService::count(&state.pool, entity, &filters, scope.as_ref()).await?;
    Ok(success_page(rows, total, skip, limit))
}

/// Validates and inserts a row for the caller. Shared with the alert handlers.
pub(crate) async fn create_row(
    state: &AppState,
    entity: &EntityDef,
    caller: &CurrentUser,
    body: Value,
) -> Result<Value, AppError> {
    if !entity.access.can_create(caller.role()) {
        return Err(AppError::Forbidden("Privilégios insuficientes".into()));
    }
    let body = body_to_map(body)?;
    RequestValidator::validate(entity, &body)?;
    let owner = match entity.access.owner_column {
        Some(col) if entity.access.owner_from_caller => Some((col, i64::from(caller.id()))),
        _ => None,
    };
    let row = CrudService::create(&state.pool, entity, &body, owner).await?;
    tracing::info!(entity = entity.table_name, id = ?row.get("id"), user_id = caller.id(), "created");
    Ok(row)
}

pub async fn create(
    State(state): State<AppState>,
    Extension(path): Extension<EntityPath>,
    caller: CurrentUser,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity(&state, &path)?;
    let row = create_row(&state, entity, &caller, body).await?;
    Ok(success_one(row))
}

/// Loads a row the caller may see, or 404.
pub(crate) async fn visible_row(
    state: &AppState,
    entity: &EntityDef,
    caller: &CurrentUser,
    id: i64,
) -> Result<Value, AppError> {
    let row = CrudService::read(&state.pool, entity, id)
        .await?
        .filter(|row| can_see(entity, row, caller))
        .ok_or_else(|| AppError::NotFound(format!("{} {} not found", entity.table_name, id)))?;
    Ok(row)
}

pub async fn read(
    State(state): State<AppState>,
    Extension(path): Extension<EntityPath>,
    Path(id): Path<i32>,
    caller: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity(&state, &path)?;
    let row = visible_row(&state, entity, &caller, i64::from(id)).await?;
    Ok(success_one_ok(row))
}

/// Applies a partial update after the visibility and permission checks. Status changes
/// stamp their timestamp columns.
async fn update_row(
    state: &AppState,
    entity: &EntityDef,
    caller: &CurrentUser,
    id: i64,
    body: HashMap<String, Value>,
) -> Result<Value, AppError> {
    let current = visible_row(state, entity, caller, id).await?;
    if !entity.access.can_update(caller.role(), is_owner(entity, &current, caller)) {
        return Err(AppError::Forbidden("Privilégios insuficientes".into()));
    }
    RequestValidator::validate_partial(entity, &body)?;
    let stamps = body
        .get("status")
        .and_then(Value::as_str)
        .filter(|new| current.get("status").and_then(Value::as_str) != Some(*new))
        .map(|new| entity.stamps_for_status(new))
        .unwrap_or_default();
    let row = CrudService::update(&state.pool, entity, id, &body, &stamps)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {} not found", entity.table_name, id)))?;
    tracing::info!(entity = entity.table_name, id, user_id = caller.id(), "updated");
    Ok(row)
}

pub async fn update(
    State(state): State<AppState>,
    Extension(path): Extension<EntityPath>,
    Path(id): Path<i32>,
    caller: CurrentUser,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity(&state, &path)?;
    let row = update_row(&state, entity, &caller, i64::from(id), body_to_map(body)?).await?;
    Ok(success_one_ok(row))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(path): Extension<EntityPath>,
    Path(id): Path<i32>,
    caller: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity(&state, &path)?;
    let id = i64::from(id);
    let current = visible_row(&state, entity, &caller, id).await?;
    if !entity.access.can_delete(caller.role(), is_owner(entity, &current, &caller)) {
        return Err(AppError::Forbidden("Privilégios insuficientes".into()));
    }
    CrudService::delete(&state.pool, entity, id).await?;
    tracing::info!(entity = entity.table_name, id, user_id = caller.id(), "deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::{primary_model, Role};
    use crate::service::User;
    use chrono::Utc;
    use serde_json::json;

    pub(crate) fn caller(id: i32, role: Role) -> CurrentUser {
        CurrentUser(User {
            id,
            email: format!("user{}@ecosolo.com", id),
            hashed_password: String::new(),
            name: format!("User {}", id),
            role,
            is_active: true,
            is_verified: true,
            age: None,
            bio: None,
            avatar_url: None,
            notifications_enabled: true,
            language: "pt-BR".into(),
            created_at: Utc::now(),
            updated_at: None,
            last_login: None,
        })
    }

    #[test]
    fn soil_analyses_are_owner_only_except_for_admin_and_researcher() {
        let model = primary_model();
        let soil = model.entity_by_path("soil-analyses").unwrap();
        let row = json!({"id": 1, "user_id": 10});
        assert!(can_see(soil, &row, &caller(10, Role::CommunityMember)));
        assert!(!can_see(soil, &row, &caller(11, Role::CommunityMember)));
        assert!(!can_see(soil, &row, &caller(11, Role::CommunityLeader)));
        assert!(can_see(soil, &row, &caller(11, Role::Researcher)));
        assert!(can_see(soil, &row, &caller(11, Role::Admin)));
    }

    #[test]
    fn list_scope_follows_visibility() {
        let model = primary_model();
        let soil = model.entity_by_path("soil-analyses").unwrap();
        let scope = scope_for(soil, &caller(10, Role::CommunityLeader)).unwrap();
        assert_eq!(scope.owner_column, "user_id");
        assert_eq!(scope.owner_id, 10);
        assert!(!scope.include_unowned);
        assert!(scope_for(soil, &caller(10, Role::Researcher)).is_none());

        let occ = model.entity_by_path("environmental-occurrences").unwrap();
        assert!(scope_for(occ, &caller(10, Role::CommunityLeader)).is_none());
        let scope = scope_for(occ, &caller(10, Role::CommunityMember)).unwrap();
        assert_eq!(scope.owner_column, "reported_by_id");

        let alerts = model.entity_by_path("alerts").unwrap();
        assert!(scope_for(alerts, &caller(10, Role::CommunityMember)).unwrap().include_unowned);
        assert!(scope_for(alerts, &caller(10, Role::Admin)).is_none());
    }

    #[test]
    fn broadcast_alerts_are_visible_to_everyone() {
        let model = primary_model();
        let alerts = model.entity_by_path("alerts").unwrap();
        let broadcast = json!({"id": 1, "user_id": null});
        let addressed = json!({"id": 2, "user_id": 10});
        for role in [Role::CommunityMember, Role::Researcher, Role::CommunityLeader, Role::Admin] {
            assert!(can_see(alerts, &broadcast, &caller(99, role)));
        }
        assert!(can_see(alerts, &addressed, &caller(10, Role::CommunityMember)));
        assert!(!can_see(alerts, &addressed, &caller(11, Role::CommunityMember)));
        assert!(!can_see(alerts, &addressed, &caller(11, Role::Researcher)));
        assert!(can_see(alerts, &addressed, &caller(11, Role::CommunityLeader)));
    }

    #[test]
    fn update_and_delete_rights_per_role() {
        let model = primary_model();
        let soil = model.entity_by_path("soil-analyses").unwrap();
        let row = json!({"id": 1, "user_id": 10});
        let owner = caller(10, Role::CommunityMember);
        assert!(is_owner(soil, &row, &owner));
        assert!(soil.access.can_update(owner.role(), true));
        assert!(soil.access.can_delete(owner.role(), true));
        let researcher = caller(11, Role::Researcher);
        assert!(can_see(soil, &row, &researcher));
        assert!(!soil.access.can_update(researcher.role(), is_owner(soil, &row, &researcher)));
        assert!(!soil.access.can_delete(researcher.role(), false));

        let occ = model.entity_by_path("environmental-occurrences").unwrap();
        assert!(occ.access.can_update(Role::CommunityLeader, false));
        assert!(!occ.access.can_delete(Role::CommunityLeader, false));
        assert!(occ.access.can_update(Role::CommunityMember, true));
        assert!(!occ.access.can_delete(Role::CommunityMember, true));
        assert!(occ.access.can_delete(Role::Admin, false));
    }

    #[test]
    fn only_staff_create_alerts() {
        let model = primary_model();
        let alerts = model.entity_by_path("alerts").unwrap();
        assert!(alerts.access.can_create(Role::Admin));
        assert!(alerts.access.can_create(Role::CommunityLeader));
        assert!(!alerts.access.can_create(Role::CommunityMember));
        assert!(!alerts.access.can_create(Role::Researcher));
        let soil = model.entity_by_path("soil-analyses").unwrap();
        assert!(soil.access.can_create(Role::CommunityMember));
    }

    #[test]
    fn filter_values_follow_column_kind() {
        let model = primary_model();
        let soil = model.entity_by_path("soil-analyses").unwrap();
        assert_eq!(filter_value(soil, "user_id", "12").unwrap(), json!(12));
        assert!(filter_value(soil, "user_id", "abc").is_err());
        assert!(filter_value(soil, "user_id", "3000000000").is_err());
        assert_eq!(filter_value(soil, "status", "completed").unwrap(), json!("completed"));
        assert!(filter_value(soil, "status", "archived").is_err());
        assert_eq!(filter_value(soil, "sector", "Setor A").unwrap(), json!("Setor A"));
    }

    #[test]
    fn body_must_be_an_object() {
        assert!(body_to_map(json!([1, 2])).is_err());
        assert_eq!(body_to_map(json!({"a": 1})).unwrap().len(), 1);
    }

    #[test]
    fn page_params_must_be_numeric() {
        let mut params = HashMap::new();
        params.insert("limit".to_string(), "ten".to_string());
        assert!(parse_page_param(&params, "limit").is_err());
        assert_eq!(parse_page_param(&params, "skip").unwrap(), None);
    }
}
