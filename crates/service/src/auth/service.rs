use std::sync::Arc;

use argon2::{password_hash::{PasswordHasher, PasswordVerifier, SaltString}, Argon2, PasswordHash};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::domain::{AuthSession, AuthUser, LoginInput, RegisterInput};
use super::errors::AuthError;
use super::repository::AuthRepository;

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: Option<String>,
    pub token_ttl_hours: i64,
    pub password_algorithm: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { jwt_secret: None, token_ttl_hours: 12, password_algorithm: "argon2".into() }
    }
}

/// Bearer-token claims: subject is the email, `uid` the user id.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub uid: String,
    pub exp: usize,
}

/// Hash a password with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::HashError(e.to_string()))?
        .to_string())
}

/// Verify a bearer token and return its claims.
pub fn decode_token(secret: &str, token: &str) -> Result<Claims, AuthError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| AuthError::TokenError(e.to_string()))?;
    Ok(data.claims)
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository> {
    repo: Arc<R>,
    cfg: AuthConfig,
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    /// Register a new user with a hashed password and the default role.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::RegisterInput;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo, AuthConfig::default());
    /// let input = RegisterInput { name: "Test".into(), email: "user@example.com".into(), password: "Secret123".into() };
    /// let user = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(user.email, "user@example.com");
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthUser, AuthError> {
        if input.password.len() < 8 {
            return Err(AuthError::Validation("password too short (>=8)".into()));
        }
        if !input.email.contains('@') {
            return Err(AuthError::Validation("invalid email".into()));
        }
        if input.name.trim().is_empty() {
            return Err(AuthError::Validation("name required".into()));
        }
        if let Some(existing) = self.repo.find_user_by_email(&input.email).await? {
            debug!("user exists: {}", existing.email);
            return Err(AuthError::Conflict);
        }

        let user = self.repo.create_user(&input.name, &input.email).await?;
        let hash = hash_password(&input.password)?;
        let _cred = self.repo.upsert_password(user.id, hash, self.cfg.password_algorithm.clone()).await?;
        self.repo.assign_default_role(user.id).await?;
        info!(user_id = %user.id, email = %user.email, "user_registered");
        Ok(user)
    }

    /// Authenticate a user, resolve its permission union and optionally
    /// issue a bearer token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::{RegisterInput, LoginInput};
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let cfg = AuthConfig { jwt_secret: Some("secret".into()), ..AuthConfig::default() };
    /// let svc = AuthService::new(repo.clone(), cfg);
    /// let _ = tokio_test::block_on(svc.register(RegisterInput { name: "N".into(), email: "u@e.com".into(), password: "Passw0rd".into() }));
    /// let session = tokio_test::block_on(svc.login(LoginInput { email: "u@e.com".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.email, "u@e.com");
    /// assert!(session.token.is_some());
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let user = self.repo
            .find_user_by_email(&input.email)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        if !user.active {
            return Err(AuthError::Unauthorized);
        }

        let cred = self.repo
            .get_credentials(user.id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let parsed = PasswordHash::new(&cred.password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
        if Argon2::default().verify_password(input.password.as_bytes(), &parsed).is_err() {
            return Err(AuthError::Unauthorized);
        }

        let mut token = None;
        if let Some(secret) = &self.cfg.jwt_secret {
            let exp = (chrono::Utc::now() + chrono::Duration::hours(self.cfg.token_ttl_hours)).timestamp() as usize;
            let claims = Claims { sub: user.email.clone(), uid: user.id.to_string(), exp };
            token = Some(
                encode(&JwtHeader::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
                    .map_err(|e| AuthError::TokenError(e.to_string()))?,
            );
        }

        let permissions = self.repo.permissions_of(user.id).await?;
        Ok(AuthSession { user, permissions, token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::mock::MockAuthRepository;

    fn service(secret: Option<&str>) -> AuthService<MockAuthRepository> {
        let cfg = AuthConfig { jwt_secret: secret.map(|s| s.to_string()), ..AuthConfig::default() };
        AuthService::new(Arc::new(MockAuthRepository::default()), cfg)
    }

    #[tokio::test]
    async fn register_rejects_short_password() {
        let svc = service(None);
        let res = svc.register(RegisterInput { name: "A".into(), email: "a@b.com".into(), password: "short".into() }).await;
        assert!(matches!(res, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let svc = service(None);
        let input = RegisterInput { name: "A".into(), email: "dup@b.com".into(), password: "LongEnough1".into() };
        svc.register(input.clone()).await.unwrap();
        let res = svc.register(input).await;
        assert!(matches!(res, Err(AuthError::Conflict)));
    }

    #[tokio::test]
    async fn register_assigns_default_role() {
        let svc = service(Some("secret"));
        svc.register(RegisterInput { name: "A".into(), email: "c@b.com".into(), password: "LongEnough1".into() }).await.unwrap();
        let session = svc.login(LoginInput { email: "c@b.com".into(), password: "LongEnough1".into() }).await.unwrap();
        assert!(session.user.roles.iter().any(|r| r == crate::access::CLIENT_ROLE));
    }

    #[tokio::test]
    async fn login_reports_granted_permissions() {
        let repo = Arc::new(MockAuthRepository::default());
        let svc = AuthService::new(repo.clone(), AuthConfig::default());
        let user = svc.register(RegisterInput { name: "A".into(), email: "p@b.com".into(), password: "LongEnough1".into() }).await.unwrap();
        repo.grant(user.id, &["PRODUIT_READ", "COMMANDE_READ"]);
        let session = svc.login(LoginInput { email: "p@b.com".into(), password: "LongEnough1".into() }).await.unwrap();
        assert!(session.permissions.contains(&"PRODUIT_READ".to_string()));
        assert!(session.permissions.contains(&"COMMANDE_READ".to_string()));
    }

    #[tokio::test]
    async fn login_rejects_wrong_password() {
        let svc = service(Some("secret"));
        svc.register(RegisterInput { name: "A".into(), email: "w@b.com".into(), password: "LongEnough1".into() }).await.unwrap();
        let res = svc.login(LoginInput { email: "w@b.com".into(), password: "wrong-pass".into() }).await;
        assert!(matches!(res, Err(AuthError::Unauthorized)));
    }

    #[tokio::test]
    async fn issued_token_round_trips() {
        let svc = service(Some("secret"));
        let user = svc.register(RegisterInput { name: "A".into(), email: "t@b.com".into(), password: "LongEnough1".into() }).await.unwrap();
        let session = svc.login(LoginInput { email: "t@b.com".into(), password: "LongEnough1".into() }).await.unwrap();
        let claims = decode_token("secret", session.token.as_deref().unwrap()).unwrap();
        assert_eq!(claims.sub, "t@b.com");
        assert_eq!(claims.uid, user.id.to_string());
        assert!(decode_token("other-secret", session.token.as_deref().unwrap()).is_err());
    }
}
