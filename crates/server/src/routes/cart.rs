use axum::{extract::{Path, Query, State}, Json};
use serde::Deserialize;
use uuid::Uuid;

use service::cart::service::{self as cart_service, CartView};

use crate::auth::ServerState;
use crate::errors::ApiError;
use crate::guard::CurrentUser;

#[derive(Debug, Deserialize)]
pub struct QuantityQuery {
    #[serde(default = "default_quantity")]
    pub quantite: i32,
}

fn default_quantity() -> i32 { 1 }

#[utoipa::path(get, path = "/api/panier", tag = "cart",
    responses((status = 200, description = "OK"), (status = 401, description = "Unauthorized")))]
pub async fn get(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> Result<Json<CartView>, ApiError> {
    Ok(Json(cart_service::view(&state.db, current.user_id()).await?))
}

#[utoipa::path(post, path = "/api/panier/produits/{produit_id}", tag = "cart",
    responses((status = 200, description = "OK"), (status = 400, description = "Bad Request")))]
pub async fn add_product(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(produit_id): Path<Uuid>,
    Query(q): Query<QuantityQuery>,
) -> Result<Json<CartView>, ApiError> {
    let view = cart_service::add_product(&state.db, current.user_id(), produit_id, q.quantite).await?;
    super::history::log_action(&state, current.user_id(), format!("Added product #{} to cart (quantity: {})", produit_id, q.quantite)).await;
    Ok(Json(view))
}

pub async fn update_quantity(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(produit_id): Path<Uuid>,
    Query(q): Query<QuantityQuery>,
) -> Result<Json<CartView>, ApiError> {
    let view = cart_service::update_quantity(&state.db, current.user_id(), produit_id, q.quantite).await?;
    super::history::log_action(&state, current.user_id(), format!("Set cart quantity of product #{} to {}", produit_id, q.quantite)).await;
    Ok(Json(view))
}

pub async fn remove_product(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(produit_id): Path<Uuid>,
) -> Result<Json<CartView>, ApiError> {
    let view = cart_service::remove_product(&state.db, current.user_id(), produit_id).await?;
    super::history::log_action(&state, current.user_id(), format!("Removed product #{} from cart", produit_id)).await;
    Ok(Json(view))
}

pub async fn clear(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> Result<Json<CartView>, ApiError> {
    let view = cart_service::clear(&state.db, current.user_id()).await?;
    super::history::log_action(&state, current.user_id(), "Emptied the cart".to_string()).await;
    Ok(Json(view))
}
