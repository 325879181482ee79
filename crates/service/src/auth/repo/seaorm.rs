use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use uuid::Uuid;

use crate::access;
use crate::auth::domain::{AuthUser, Credentials};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmAuthRepository {
    async fn roles_of(&self, user_id: Uuid) -> Result<Vec<String>, AuthError> {
        let identity = access::load_identity(&self.db, user_id)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(identity.map(|i| i.roles).unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
        let found = models::user::find_by_email(&self.db, email)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        match found {
            Some(u) => {
                let roles = self.roles_of(u.id).await?;
                Ok(Some(AuthUser { id: u.id, name: u.name, email: u.email, active: u.active, roles }))
            }
            None => Ok(None),
        }
    }

    async fn create_user(&self, name: &str, email: &str) -> Result<AuthUser, AuthError> {
        let created = models::user::create(&self.db, name, email)
            .await
            .map_err(|e| AuthError::Validation(e.to_string()))?;
        Ok(AuthUser {
            id: created.id,
            name: created.name,
            email: created.email,
            active: created.active,
            roles: Vec::new(),
        })
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
        let res = models::user_credentials::find_by_user(&self.db, user_id)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.map(|c| Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm }))
    }

    async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError> {
        let c = models::user_credentials::upsert_password(&self.db, user_id, password_hash, &password_algorithm)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm })
    }

    async fn assign_default_role(&self, user_id: Uuid) -> Result<(), AuthError> {
        // Create the default role on demand, mirroring first-signup bootstrap
        let role = match models::role::find_by_name(&self.db, access::CLIENT_ROLE)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?
        {
            Some(role) => role,
            None => models::role::create(&self.db, access::CLIENT_ROLE, Some("default customer role"))
                .await
                .map_err(|e| AuthError::Repository(e.to_string()))?,
        };
        let link = models::user_role::ActiveModel {
            user_id: Set(user_id),
            role_id: Set(role.id),
        };
        link.insert(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(())
    }

    async fn permissions_of(&self, user_id: Uuid) -> Result<Vec<String>, AuthError> {
        let set = access::effective_permissions(&self.db, user_id)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(set.into_iter().collect())
    }
}
