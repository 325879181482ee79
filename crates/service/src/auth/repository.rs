use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{AuthUser, Credentials};
use super::errors::AuthError;

/// Repository abstraction for auth-related persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn create_user(&self, name: &str, email: &str) -> Result<AuthUser, AuthError>;

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError>;
    async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError>;

    /// Attach the default signup role to a fresh user.
    async fn assign_default_role(&self, user_id: Uuid) -> Result<(), AuthError>;

    /// Union of permission names across the user's roles.
    async fn permissions_of(&self, user_id: Uuid) -> Result<Vec<String>, AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: Mutex<HashMap<String, AuthUser>>,        // key: email
        creds: Mutex<HashMap<Uuid, Credentials>>,       // key: user_id
        perms: Mutex<HashMap<Uuid, Vec<String>>>,       // key: user_id
    }

    impl MockAuthRepository {
        /// Preload a permission set for a user, for gate tests.
        pub fn grant(&self, user_id: Uuid, names: &[&str]) {
            let mut perms = self.perms.lock().unwrap();
            perms.insert(user_id, names.iter().map(|n| n.to_string()).collect());
        }
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.get(email).cloned())
        }

        async fn create_user(&self, name: &str, email: &str) -> Result<AuthUser, AuthError> {
            let mut users = self.users.lock().unwrap();
            if users.contains_key(email) {
                return Err(AuthError::Conflict);
            }
            let user = AuthUser {
                id: Uuid::new_v4(),
                name: name.to_string(),
                email: email.to_string(),
                active: true,
                roles: Vec::new(),
            };
            users.insert(email.to_string(), user.clone());
            Ok(user)
        }

        async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
            let creds = self.creds.lock().unwrap();
            Ok(creds.get(&user_id).cloned())
        }

        async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError> {
            let mut creds = self.creds.lock().unwrap();
            let c = Credentials { user_id, password_hash, password_algorithm };
            creds.insert(user_id, c.clone());
            Ok(c)
        }

        async fn assign_default_role(&self, user_id: Uuid) -> Result<(), AuthError> {
            let mut users = self.users.lock().unwrap();
            for user in users.values_mut() {
                if user.id == user_id {
                    user.roles.push(crate::access::CLIENT_ROLE.to_string());
                    return Ok(());
                }
            }
            Err(AuthError::NotFound)
        }

        async fn permissions_of(&self, user_id: Uuid) -> Result<Vec<String>, AuthError> {
            let perms = self.perms.lock().unwrap();
            Ok(perms.get(&user_id).cloned().unwrap_or_default())
        }
    }
}
