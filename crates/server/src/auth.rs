use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use sea_orm::DatabaseConnection;
use serde::Serialize;

use service::auth::domain::{AuthUser, LoginInput, RegisterInput};
use service::auth::repo::seaorm::SeaOrmAuthRepository;
use service::auth::service::{AuthConfig, AuthService};

use crate::errors::ApiError;
use crate::guard::CurrentUser;

#[derive(Clone)]
pub struct ServerAuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

#[derive(Clone)]
pub struct ServerState {
    pub db: DatabaseConnection,
    pub auth: ServerAuthConfig,
}

impl ServerState {
    fn auth_service(&self) -> AuthService<SeaOrmAuthRepository> {
        let repo = Arc::new(SeaOrmAuthRepository { db: self.db.clone() });
        AuthService::new(repo, AuthConfig {
            jwt_secret: Some(self.auth.jwt_secret.clone()),
            token_ttl_hours: self.auth.token_ttl_hours,
            password_algorithm: "argon2".into(),
        })
    }
}

#[derive(Serialize)]
pub struct LoginOutput {
    pub token: String,
    pub user: AuthUser,
    pub permissions: Vec<String>,
}

#[derive(Serialize)]
pub struct MeOutput {
    pub user: AuthUser,
    pub permissions: Vec<String>,
}

#[utoipa::path(post, path = "/api/auth/login", tag = "auth",
    request_body = crate::openapi::LoginRequest,
    responses((status = 200, description = "OK"), (status = 401, description = "Unauthorized")))]
pub async fn login(
    State(state): State<ServerState>,
    Json(input): Json<LoginInput>,
) -> Result<Json<LoginOutput>, ApiError> {
    let session = state.auth_service().login(input).await?;
    let token = session
        .token
        .ok_or_else(|| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "token generation failed"))?;
    Ok(Json(LoginOutput { token, user: session.user, permissions: session.permissions }))
}

#[utoipa::path(post, path = "/api/auth/signup", tag = "auth",
    request_body = crate::openapi::SignupRequest,
    responses((status = 200, description = "OK"), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn signup(
    State(state): State<ServerState>,
    Json(input): Json<RegisterInput>,
) -> Result<Json<AuthUser>, ApiError> {
    let user = state.auth_service().register(input).await?;
    Ok(Json(user))
}

#[utoipa::path(get, path = "/api/auth/me", tag = "auth",
    responses((status = 200, description = "OK"), (status = 401, description = "Unauthorized")))]
pub async fn me(current: CurrentUser) -> Json<MeOutput> {
    let identity = current.0;
    let user = AuthUser {
        id: identity.user.id,
        name: identity.user.name,
        email: identity.user.email,
        active: identity.user.active,
        roles: identity.roles,
    };
    Json(MeOutput { user, permissions: identity.permissions.into_iter().collect() })
}
