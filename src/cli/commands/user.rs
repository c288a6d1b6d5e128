use clap::Args;
use serde_json::json;

use crate::auth::password;
use crate::cli::{utils::output_success, OutputFormat};
use crate::config::AppConfig;
use crate::database::models::{user::DEFAULT_ROLE, NewUser};
use crate::database::{DatabaseManager, PgUserDirectory, UserDirectory};

#[derive(Args, Debug)]
pub struct CreateUserArgs {
    #[arg(long, help = "Username")]
    pub username: String,

    #[arg(long, help = "Password")]
    pub password: String,

    #[arg(long, help = "Email")]
    pub email: String,

    #[arg(long, default_value = DEFAULT_ROLE, help = "Role tag stored with the user")]
    pub role: String,
}

pub async fn handle(
    config: &AppConfig,
    args: CreateUserArgs,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let database = DatabaseManager::connect(&config.database).await?;
    let users = PgUserDirectory::new(database.pool().clone());
    let result = create_user(&users, args).await;
    database.close().await;

    let (id, username) = result?;
    output_success(
        output_format,
        &format!("Created user '{}' (id {})", username, id),
        Some(json!({ "id": id, "username": username })),
    )
}

pub async fn create_user(
    users: &dyn UserDirectory,
    args: CreateUserArgs,
) -> anyhow::Result<(i64, String)> {
    if users.username_taken(&args.username).await? {
        anyhow::bail!("username '{}' already exists", args.username);
    }
    if users.email_taken(&args.email).await? {
        anyhow::bail!("email '{}' already exists", args.email);
    }

    let password_hash =
        password::hash(&args.password).map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;

    let user = users
        .create(NewUser {
            username: args.username,
            password_hash,
            email: Some(args.email),
            role: args.role,
        })
        .await?;

    Ok((user.id, user.username))
}
