use axum::{extract::{Path, State}, Json};
use uuid::Uuid;

use service::user_service::{self, CreateUserInput, UpdateUserInput, UserView};

use crate::auth::ServerState;
use crate::errors::ApiError;
use crate::guard::CurrentUser;

pub async fn list(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> Result<Json<Vec<UserView>>, ApiError> {
    current.require("USER_READ")?;
    Ok(Json(user_service::list_users(&state.db).await?))
}

pub async fn get(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserView>, ApiError> {
    current.require("USER_READ")?;
    Ok(Json(user_service::get_user(&state.db, id).await?))
}

pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(input): Json<CreateUserInput>,
) -> Result<Json<UserView>, ApiError> {
    current.require("USER_CREATE")?;
    let created = user_service::create_user(&state.db, input).await?;
    super::history::log_action(&state, current.user_id(), format!("Created user: {}", created.email)).await;
    Ok(Json(created))
}

pub async fn update(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateUserInput>,
) -> Result<Json<UserView>, ApiError> {
    current.require("USER_UPDATE")?;
    let updated = user_service::update_user(&state.db, id, input).await?;
    super::history::log_action(&state, current.user_id(), format!("Updated user: {}", updated.email)).await;
    Ok(Json(updated))
}

pub async fn delete(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    current.require("USER_DELETE")?;
    user_service::delete_user(&state.db, id).await?;
    super::history::log_action(&state, current.user_id(), format!("Deleted user #{}", id)).await;
    Ok(Json(serde_json::json!({"ok": true})))
}

pub async fn toggle_active(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserView>, ApiError> {
    current.require("USER_UPDATE")?;
    let updated = user_service::toggle_active(&state.db, id).await?;
    let action = if updated.active { "Enabled" } else { "Disabled" };
    super::history::log_action(&state, current.user_id(), format!("{} user: {}", action, updated.email)).await;
    Ok(Json(updated))
}

pub async fn assign_role(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path((user_id, role_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<UserView>, ApiError> {
    current.require("USER_UPDATE")?;
    let updated = user_service::assign_role(&state.db, user_id, role_id).await?;
    super::history::log_action(&state, current.user_id(), format!("Assigned role #{} to user #{}", role_id, user_id)).await;
    Ok(Json(updated))
}

pub async fn remove_role(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path((user_id, role_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<UserView>, ApiError> {
    current.require("USER_UPDATE")?;
    let updated = user_service::remove_role(&state.db, user_id, role_id).await?;
    super::history::log_action(&state, current.user_id(), format!("Removed role #{} from user #{}", role_id, user_id)).await;
    Ok(Json(updated))
}
