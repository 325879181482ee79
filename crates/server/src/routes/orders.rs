use axum::{extract::{Path, Query, State}, Json};
use serde::Deserialize;
use uuid::Uuid;

use models::order::OrderStatus;
use service::bootstrap::VENDOR_ROLE;
use service::orders::domain::{PaymentInfo, ShippingAddress};
use service::orders::service::{self as order_service, OrderView};

use crate::auth::ServerState;
use crate::errors::ApiError;
use crate::guard::CurrentUser;

#[derive(Debug, Deserialize)]
pub struct CheckoutInput {
    pub shipping: ShippingAddress,
    pub payment: PaymentInfo,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub statut: OrderStatus,
}

/// Orders of the authenticated user.
pub async fn list_mine(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    Ok(Json(order_service::list_by_user(&state.db, current.user_id()).await?))
}

pub async fn list_all(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    current.require("COMMANDE_READ")?;
    Ok(Json(order_service::list_all(&state.db).await?))
}

pub async fn by_status(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(statut): Path<OrderStatus>,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    current.require("COMMANDE_READ")?;
    Ok(Json(order_service::list_by_status(&state.db, statut).await?))
}

/// An order is visible to its owner and to back-office staff.
pub async fn get(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderView>, ApiError> {
    let order = order_service::get(&state.db, id).await?;
    let staff = current.is_admin() || current.has_role(VENDOR_ROLE);
    if !staff && order.user_id != current.user_id() {
        return Err(ApiError::forbidden());
    }
    Ok(Json(order))
}

#[utoipa::path(post, path = "/api/commandes", tag = "orders",
    request_body = crate::openapi::CheckoutRequest,
    responses((status = 200, description = "OK"), (status = 400, description = "Bad Request")))]
pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(input): Json<CheckoutInput>,
) -> Result<Json<OrderView>, ApiError> {
    let order = order_service::place_order(&state.db, current.user_id(), input.shipping, input.payment).await?;
    super::history::log_action(&state, current.user_id(), format!("Placed order #{}", order.id)).await;
    Ok(Json(order))
}

#[utoipa::path(patch, path = "/api/commandes/{id}/statut", tag = "orders",
    responses((status = 200, description = "OK"), (status = 403, description = "Forbidden"), (status = 404, description = "Not Found")))]
pub async fn update_status(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<Uuid>,
    Query(q): Query<StatusQuery>,
) -> Result<Json<OrderView>, ApiError> {
    current.require("COMMANDE_UPDATE")?;
    let order = order_service::update_status(&state.db, id, q.statut).await?;
    super::history::log_action(&state, current.user_id(), format!("Set order #{} status to {:?}", id, q.statut)).await;
    Ok(Json(order))
}
