use serde_json::json;

use crate::auth::password;
use crate::cli::{utils::output_success, OutputFormat};
use crate::config::AppConfig;
use crate::database::models::NewUser;
use crate::database::{schema, DatabaseManager, PgUserDirectory, UserDirectory};

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";

pub async fn handle(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let database = DatabaseManager::connect(&config.database).await?;
    schema::ensure_schema(database.pool()).await?;

    let users = PgUserDirectory::new(database.pool().clone());
    let result = seed_admin(&users).await;
    database.close().await;

    match result? {
        Some(admin) => output_success(
            output_format,
            &format!(
                "Database initialized; created user '{}' with password '{}'",
                DEFAULT_ADMIN_USERNAME, DEFAULT_ADMIN_PASSWORD
            ),
            Some(json!({ "id": admin, "username": DEFAULT_ADMIN_USERNAME })),
        ),
        None => output_success(
            output_format,
            "Database initialized; default user already exists, skipped",
            None,
        ),
    }
}

/// Create the default admin unless a user with that name exists. Returns the new id.
pub async fn seed_admin(users: &dyn UserDirectory) -> anyhow::Result<Option<i64>> {
    if users.username_taken(DEFAULT_ADMIN_USERNAME).await? {
        tracing::info!("Default user already exists, skipping");
        return Ok(None);
    }

    let password_hash = password::hash(DEFAULT_ADMIN_PASSWORD)
        .map_err(|e| anyhow::anyhow!("failed to hash default password: {e}"))?;

    let admin = users
        .create(NewUser {
            username: DEFAULT_ADMIN_USERNAME.to_string(),
            password_hash,
            email: Some(DEFAULT_ADMIN_EMAIL.to_string()),
            role: "admin".to_string(),
        })
        .await?;

    tracing::info!(user_id = admin.id, "Created default user");
    Ok(Some(admin.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryUserDirectory;

    #[tokio::test]
    async fn seeds_admin_once() {
        let users = MemoryUserDirectory::new();

        let first = seed_admin(&users).await.unwrap();
        assert_eq!(first, Some(1));
        assert_eq!(seed_admin(&users).await.unwrap(), None);

        let admin = users.find_by_username("admin").await.unwrap().unwrap();
        assert_eq!(admin.role, "admin");
        assert!(password::verify(DEFAULT_ADMIN_PASSWORD, &admin.password_hash));
    }
}
