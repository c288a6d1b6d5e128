use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::manager::DatabaseError;
use crate::database::models::{NewUser, User};

const USER_COLUMNS: &str =
    "id, username, password_hash, email, avatar, role, created_at, updated_at";

/// Lookup and creation of principals
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError>;

    async fn username_taken(&self, username: &str) -> Result<bool, DatabaseError>;

    async fn email_taken(&self, email: &str) -> Result<bool, DatabaseError>;

    async fn create(&self, user: NewUser) -> Result<User, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}

/// Postgres-backed user directory over the `users` table
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn username_taken(&self, username: &str) -> Result<bool, DatabaseError> {
        let taken: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        Ok(taken)
    }

    async fn email_taken(&self, email: &str) -> Result<bool, DatabaseError> {
        let taken: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(taken)
    }

    async fn create(&self, user: NewUser) -> Result<User, DatabaseError> {
        let result = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, password_hash, email, role)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.email)
        .bind(&user.role)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(created) => Ok(created),
            // Lost a race against another registration with the same username or email
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(
                DatabaseError::Conflict(format!("User '{}' already exists", user.username)),
            ),
            Err(other) => Err(other.into()),
        }
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
