use axum::{extract::{Path, Query, State}, Json};
use serde::Deserialize;
use uuid::Uuid;

use service::product_service::{self, ProductInput};

use crate::auth::ServerState;
use crate::errors::ApiError;
use crate::guard::CurrentUser;

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    #[serde(rename = "categorieId", default)]
    pub categorie_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct StockQuery {
    pub quantite: i32,
}

/// Storefront listing: active products only, no auth required.
#[utoipa::path(get, path = "/api/produits", tag = "catalog",
    responses((status = 200, description = "OK")))]
pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<models::product::Model>>, ApiError> {
    Ok(Json(product_service::list_active(&state.db).await?))
}

/// Back-office listing including inactive products.
pub async fn list_admin(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> Result<Json<Vec<models::product::Model>>, ApiError> {
    current.require("PRODUIT_READ")?;
    Ok(Json(product_service::list_all(&state.db).await?))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<models::product::Model>, ApiError> {
    Ok(Json(product_service::get_product(&state.db, id).await?))
}

pub async fn by_category(
    State(state): State<ServerState>,
    Path(categorie_id): Path<Uuid>,
) -> Result<Json<Vec<models::product::Model>>, ApiError> {
    Ok(Json(product_service::list_by_category(&state.db, categorie_id).await?))
}

pub async fn search(
    State(state): State<ServerState>,
    Query(q): Query<SearchQuery>,
) -> Result<Json<Vec<models::product::Model>>, ApiError> {
    Ok(Json(product_service::search_by_name(&state.db, &q.query).await?))
}

#[utoipa::path(post, path = "/api/produits", tag = "catalog",
    request_body = crate::openapi::ProductRequest,
    responses((status = 200, description = "OK"), (status = 400, description = "Bad Request"), (status = 403, description = "Forbidden")))]
pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(q): Query<CategoryQuery>,
    Json(input): Json<ProductInput>,
) -> Result<Json<models::product::Model>, ApiError> {
    current.require("PRODUIT_CREATE")?;
    let created = product_service::create_product(&state.db, input, q.categorie_id).await?;
    super::history::log_action(&state, current.user_id(), format!("Created product: {}", created.name)).await;
    Ok(Json(created))
}

pub async fn update(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Query(q): Query<CategoryQuery>,
    Json(input): Json<ProductInput>,
) -> Result<Json<models::product::Model>, ApiError> {
    current.require("PRODUIT_UPDATE")?;
    let updated = product_service::update_product(&state.db, id, input, q.categorie_id).await?;
    super::history::log_action(&state, current.user_id(), format!("Updated product: {}", updated.name)).await;
    Ok(Json(updated))
}

pub async fn delete(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    current.require("PRODUIT_DELETE")?;
    let doomed = product_service::get_product(&state.db, id).await?;
    product_service::delete_product(&state.db, id).await?;
    super::history::log_action(&state, current.user_id(), format!("Deleted product: {}", doomed.name)).await;
    Ok(Json(serde_json::json!({"ok": true})))
}

pub async fn toggle_active(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<models::product::Model>, ApiError> {
    current.require("PRODUIT_UPDATE")?;
    let updated = product_service::toggle_active(&state.db, id).await?;
    let action = if updated.active { "Activated" } else { "Deactivated" };
    super::history::log_action(&state, current.user_id(), format!("{} product: {}", action, updated.name)).await;
    Ok(Json(updated))
}

/// Adjust stock by a signed delta (`?quantite=-3` removes three).
pub async fn adjust_stock(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Query(q): Query<StockQuery>,
) -> Result<Json<models::product::Model>, ApiError> {
    current.require("PRODUIT_UPDATE")?;
    let updated = product_service::adjust_stock(&state.db, id, q.quantite).await?;
    super::history::log_action(&state, current.user_id(), format!("Adjusted stock of {} ({:+})", updated.name, q.quantite)).await;
    Ok(Json(updated))
}
