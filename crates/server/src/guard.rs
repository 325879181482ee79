//! Bearer-token authentication and the per-endpoint permission gate.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use uuid::Uuid;

use service::access::{self, Identity, ADMIN_ROLE};
use service::auth::service::decode_token;

use crate::auth::ServerState;
use crate::errors::ApiError;

/// Authenticated caller with its resolved roles and permission union.
/// Extracting it rejects missing, malformed or expired tokens with 401.
pub struct CurrentUser(pub Identity);

impl CurrentUser {
    pub fn user_id(&self) -> Uuid {
        self.0.user.id
    }

    pub fn is_admin(&self) -> bool {
        self.0.has_role(ADMIN_ROLE)
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.0.has_role(name)
    }

    /// 403 unless the caller holds the permission or the admin role.
    pub fn require(&self, permission: &str) -> Result<(), ApiError> {
        if self.0.can(permission) {
            Ok(())
        } else {
            Err(ApiError::forbidden())
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &ServerState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(ApiError::unauthorized)?;
        let token = header.strip_prefix("Bearer ").ok_or_else(ApiError::unauthorized)?;

        let claims = decode_token(&state.auth.jwt_secret, token).map_err(|_| ApiError::unauthorized())?;
        let user_id = Uuid::parse_str(&claims.uid).map_err(|_| ApiError::unauthorized())?;

        let identity = access::load_identity(&state.db, user_id)
            .await
            .map_err(ApiError::from)?
            .ok_or_else(ApiError::unauthorized)?;
        if !identity.user.active {
            return Err(ApiError::unauthorized());
        }
        Ok(CurrentUser(identity))
    }
}
