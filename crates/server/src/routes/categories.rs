use axum::{extract::{Path, State}, Json};
use uuid::Uuid;

use service::category_service::{self, CategoryInput};

use crate::auth::ServerState;
use crate::errors::ApiError;
use crate::guard::CurrentUser;

pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<models::category::Model>>, ApiError> {
    Ok(Json(category_service::list_categories(&state.db).await?))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<models::category::Model>, ApiError> {
    Ok(Json(category_service::get_category(&state.db, id).await?))
}

pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(input): Json<CategoryInput>,
) -> Result<Json<models::category::Model>, ApiError> {
    current.require("CATEGORIE_CREATE")?;
    let created = category_service::create_category(&state.db, input).await?;
    super::history::log_action(&state, current.user_id(), format!("Created category: {}", created.name)).await;
    Ok(Json(created))
}

pub async fn update(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<CategoryInput>,
) -> Result<Json<models::category::Model>, ApiError> {
    current.require("CATEGORIE_UPDATE")?;
    let updated = category_service::update_category(&state.db, id, input).await?;
    super::history::log_action(&state, current.user_id(), format!("Updated category: {}", updated.name)).await;
    Ok(Json(updated))
}

pub async fn delete(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    current.require("CATEGORIE_DELETE")?;
    category_service::delete_category(&state.db, id).await?;
    super::history::log_action(&state, current.user_id(), format!("Deleted category #{}", id)).await;
    Ok(Json(serde_json::json!({"ok": true})))
}
