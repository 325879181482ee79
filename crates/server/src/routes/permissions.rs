use axum::{extract::{Path, State}, Json};
use uuid::Uuid;

use service::permission_service::{self, PermissionInput};

use crate::auth::ServerState;
use crate::errors::ApiError;
use crate::guard::CurrentUser;

pub async fn list(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> Result<Json<Vec<models::permission::Model>>, ApiError> {
    current.require("PERMISSION_READ")?;
    Ok(Json(permission_service::list_permissions(&state.db).await?))
}

pub async fn get(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<models::permission::Model>, ApiError> {
    current.require("PERMISSION_READ")?;
    Ok(Json(permission_service::get_permission(&state.db, id).await?))
}

pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(input): Json<PermissionInput>,
) -> Result<Json<models::permission::Model>, ApiError> {
    current.require("PERMISSION_CREATE")?;
    let created = permission_service::create_permission(&state.db, input).await?;
    super::history::log_action(&state, current.user_id(), format!("Created permission: {}", created.name)).await;
    Ok(Json(created))
}

pub async fn update(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<PermissionInput>,
) -> Result<Json<models::permission::Model>, ApiError> {
    current.require("PERMISSION_UPDATE")?;
    let updated = permission_service::update_permission(&state.db, id, input).await?;
    super::history::log_action(&state, current.user_id(), format!("Updated permission: {}", updated.name)).await;
    Ok(Json(updated))
}

pub async fn delete(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    current.require("PERMISSION_DELETE")?;
    permission_service::delete_permission(&state.db, id).await?;
    super::history::log_action(&state, current.user_id(), format!("Deleted permission #{}", id)).await;
    Ok(Json(serde_json::json!({"ok": true})))
}
