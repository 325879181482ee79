use axum::{extract::{Path, State}, Json};
use uuid::Uuid;

use service::role_service::{self, RoleInput, RoleView};

use crate::auth::ServerState;
use crate::errors::ApiError;
use crate::guard::CurrentUser;

pub async fn list(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> Result<Json<Vec<RoleView>>, ApiError> {
    current.require("ROLE_READ")?;
    Ok(Json(role_service::list_roles(&state.db).await?))
}

pub async fn get(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RoleView>, ApiError> {
    current.require("ROLE_READ")?;
    Ok(Json(role_service::get_role(&state.db, id).await?))
}

pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(input): Json<RoleInput>,
) -> Result<Json<RoleView>, ApiError> {
    current.require("ROLE_CREATE")?;
    let created = role_service::create_role(&state.db, input).await?;
    super::history::log_action(&state, current.user_id(), format!("Created role: {}", created.name)).await;
    Ok(Json(created))
}

pub async fn update(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<RoleInput>,
) -> Result<Json<RoleView>, ApiError> {
    current.require("ROLE_UPDATE")?;
    let updated = role_service::update_role(&state.db, id, input).await?;
    super::history::log_action(&state, current.user_id(), format!("Updated role: {}", updated.name)).await;
    Ok(Json(updated))
}

pub async fn delete(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    current.require("ROLE_DELETE")?;
    role_service::delete_role(&state.db, id).await?;
    super::history::log_action(&state, current.user_id(), format!("Deleted role #{}", id)).await;
    Ok(Json(serde_json::json!({"ok": true})))
}

pub async fn add_permission(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path((role_id, permission_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<RoleView>, ApiError> {
    current.require("ROLE_UPDATE")?;
    let updated = role_service::add_permission(&state.db, role_id, permission_id).await?;
    super::history::log_action(&state, current.user_id(), format!("Granted permission #{} to role {}", permission_id, updated.name)).await;
    Ok(Json(updated))
}

pub async fn remove_permission(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path((role_id, permission_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<RoleView>, ApiError> {
    current.require("ROLE_UPDATE")?;
    let updated = role_service::remove_permission(&state.db, role_id, permission_id).await?;
    super::history::log_action(&state, current.user_id(), format!("Revoked permission #{} from role {}", permission_id, updated.name)).await;
    Ok(Json(updated))
}
