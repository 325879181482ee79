use axum::{
    routing::{get, patch, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::auth::{self, ServerState};

pub mod cart;
pub mod categories;
pub mod history;
pub mod orders;
pub mod permissions;
pub mod products;
pub mod roles;
pub mod users;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK")))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: auth, admin resources, catalog, cart
/// and order endpoints, plus Swagger UI under /docs.
pub fn build_router(cors: CorsLayer, state: ServerState) -> Router {
    let auth_routes = Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/me", get(auth::me));

    let user_routes = Router::new()
        .route("/api/users", get(users::list).post(users::create))
        .route("/api/users/:id", get(users::get).put(users::update).delete(users::delete))
        .route("/api/users/:id/toggle-actif", patch(users::toggle_active).put(users::toggle_active))
        .route("/api/users/:user_id/roles/:role_id", post(users::assign_role).delete(users::remove_role));

    let role_routes = Router::new()
        .route("/api/roles", get(roles::list).post(roles::create))
        .route("/api/roles/:id", get(roles::get).put(roles::update).delete(roles::delete))
        .route("/api/roles/:role_id/permissions/:permission_id", post(roles::add_permission).delete(roles::remove_permission));

    let permission_routes = Router::new()
        .route("/api/permissions", get(permissions::list).post(permissions::create))
        .route("/api/permissions/:id", get(permissions::get).put(permissions::update).delete(permissions::delete));

    let category_routes = Router::new()
        .route("/api/categories", get(categories::list).post(categories::create))
        .route("/api/categories/:id", get(categories::get).put(categories::update).delete(categories::delete));

    let product_routes = Router::new()
        .route("/api/produits", get(products::list).post(products::create))
        .route("/api/produits/admin", get(products::list_admin))
        .route("/api/produits/search", get(products::search))
        .route("/api/produits/categorie/:categorie_id", get(products::by_category))
        .route("/api/produits/:id", get(products::get).put(products::update).delete(products::delete))
        .route("/api/produits/:id/active", patch(products::toggle_active))
        .route("/api/produits/:id/stock", patch(products::adjust_stock));

    let cart_routes = Router::new()
        .route("/api/panier", get(cart::get).delete(cart::clear))
        .route(
            "/api/panier/produits/:produit_id",
            post(cart::add_product).put(cart::update_quantity).delete(cart::remove_product),
        );

    let order_routes = Router::new()
        .route("/api/commandes", get(orders::list_mine).post(orders::create))
        .route("/api/commandes/all", get(orders::list_all))
        .route("/api/commandes/statut/:statut", get(orders::by_status))
        .route("/api/commandes/:id", get(orders::get))
        .route("/api/commandes/:id/statut", patch(orders::update_status));

    let history_routes = Router::new()
        .route("/api/historique", get(history::list).post(history::create))
        .route("/api/historique/utilisateur/:user_id", get(history::by_user))
        .route("/api/historique/:id", get(history::get).delete(history::delete));

    Router::new()
        .route("/health", get(health))
        .merge(auth_routes)
        .merge(user_routes)
        .merge(role_routes)
        .merge(permission_routes)
        .merge(category_routes)
        .merge(product_routes)
        .merge(cart_routes)
        .merge(order_routes)
        .merge(history_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", crate::openapi::ApiDoc::openapi()))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径等，日志级别为 INFO
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::INFO),
                )
                // 响应返回时打点，包含状态码与耗时
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                ),
        )
}
