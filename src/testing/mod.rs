//! In-memory backends for exercising the service without Postgres or Redis.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::auth::{password, AuthService, Clock, MemoryTokenStore, SystemClock};
use crate::config::{AppConfig, Environment};
use crate::database::models::{NewUser, User};
use crate::database::{DatabaseError, UserDirectory};
use crate::state::AppState;

/// User directory kept in a vector; ids are assigned sequentially from 1
#[derive(Default)]
pub struct MemoryUserDirectory {
    users: RwLock<Vec<User>>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user with a freshly hashed password
    pub async fn seed(&self, username: &str, plaintext: &str, role: &str) -> User {
        let password_hash = password::hash(plaintext).unwrap_or_default();
        self.create(NewUser {
            username: username.to_string(),
            password_hash,
            email: Some(format!("{username}@example.com")),
            role: role.to_string(),
        })
        .await
        .unwrap_or_else(|e| panic!("failed to seed user {username}: {e}"))
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn username_taken(&self, username: &str) -> Result<bool, DatabaseError> {
        Ok(self.find_by_username(username).await?.is_some())
    }

    async fn email_taken(&self, email: &str) -> Result<bool, DatabaseError> {
        let users = self.users.read().await;
        Ok(users.iter().any(|u| u.email.as_deref() == Some(email)))
    }

    async fn create(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut users = self.users.write().await;
        let duplicate = users.iter().any(|u| {
            u.username == user.username || (user.email.is_some() && u.email == user.email)
        });
        if duplicate {
            return Err(DatabaseError::Conflict(format!(
                "User '{}' already exists",
                user.username
            )));
        }

        let now = Utc::now();
        let created = User {
            id: users.len() as i64 + 1,
            username: user.username,
            password_hash: user.password_hash,
            email: user.email,
            avatar: String::new(),
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

/// Development config with a fixed secret, suitable for tests
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::defaults(Environment::Development);
    config.jwt.secret = "test-secret".to_string();
    config.jwt.expire_hours = 1;
    config
}

/// Everything a test needs to drive the router and inspect its backends
pub struct TestBackends {
    pub state: AppState,
    pub users: Arc<MemoryUserDirectory>,
    pub store: Arc<MemoryTokenStore>,
}

/// App state over in-memory backends using `clock` for token time checks
pub fn memory_state_with_clock(clock: Arc<dyn Clock>) -> TestBackends {
    let config = test_config();
    let users = Arc::new(MemoryUserDirectory::new());
    let store = Arc::new(MemoryTokenStore::with_clock(clock.clone()));
    let auth = AuthService::new(&config.jwt, store.clone(), clock)
        .unwrap_or_else(|e| panic!("test auth service: {e}"));

    TestBackends {
        state: AppState::new(config, auth, users.clone()),
        users,
        store,
    }
}

pub fn memory_state() -> TestBackends {
    memory_state_with_clock(Arc::new(SystemClock))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_directory_rejects_duplicates() {
        let users = MemoryUserDirectory::new();
        let admin = users.seed("admin", "admin123", "admin").await;
        assert_eq!(admin.id, 1);
        assert!(users.username_taken("admin").await.unwrap());
        assert!(users.email_taken("admin@example.com").await.unwrap());

        let again = users
            .create(NewUser {
                username: "admin".to_string(),
                password_hash: String::new(),
                email: None,
                role: "user".to_string(),
            })
            .await;
        assert!(matches!(again, Err(DatabaseError::Conflict(_))));
    }
}
