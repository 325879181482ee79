use axum::{extract::{Path, State}, Json};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use service::history_service;

use crate::auth::ServerState;
use crate::errors::ApiError;
use crate::guard::CurrentUser;

/// Append an audit entry; a failed write is logged and does not break the
/// calling request.
pub async fn log_action(state: &ServerState, user_id: Uuid, action: String) {
    if let Err(e) = history_service::record(&state.db, user_id, &action).await {
        warn!(error = %e, "action_log_write_failed");
    }
}

fn can_view_others(current: &CurrentUser) -> bool {
    current.is_admin() || current.0.can("HISTORY_READ")
}

/// Admins (and HISTORY_READ holders) see everything, others only their own
/// entries.
pub async fn list(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> Result<Json<Vec<models::action_log::Model>>, ApiError> {
    if can_view_others(&current) {
        Ok(Json(history_service::list_all(&state.db).await?))
    } else {
        Ok(Json(history_service::list_by_user(&state.db, current.user_id()).await?))
    }
}

pub async fn get(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<models::action_log::Model>, ApiError> {
    let entry = history_service::get_entry(&state.db, id).await?;
    if !can_view_others(&current) && entry.user_id != current.user_id() {
        return Err(ApiError::forbidden());
    }
    Ok(Json(entry))
}

pub async fn by_user(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<models::action_log::Model>>, ApiError> {
    if !can_view_others(&current) && user_id != current.user_id() {
        return Err(ApiError::forbidden());
    }
    Ok(Json(history_service::list_by_user(&state.db, user_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateEntryInput {
    pub action: String,
}

/// Any authenticated user may record an entry for itself.
pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(input): Json<CreateEntryInput>,
) -> Result<Json<models::action_log::Model>, ApiError> {
    Ok(Json(history_service::record(&state.db, current.user_id(), &input.action).await?))
}

pub async fn delete(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !current.is_admin() {
        return Err(ApiError::forbidden());
    }
    history_service::delete_entry(&state.db, id).await?;
    Ok(Json(serde_json::json!({"ok": true})))
}
