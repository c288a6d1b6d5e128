use sqlx::PgPool;

use crate::database::manager::DatabaseError;

const CREATE_USERS: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id            BIGSERIAL PRIMARY KEY,
        username      TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        email         TEXT UNIQUE,
        avatar        TEXT NOT NULL DEFAULT '',
        role          TEXT NOT NULL DEFAULT 'user',
        created_at    TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at    TIMESTAMPTZ NOT NULL DEFAULT now()
    )
"#;

/// Create the tables the auth service reads, if they are missing
pub async fn ensure_schema(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::query(CREATE_USERS).execute(pool).await?;
    tracing::debug!("Ensured users table");
    Ok(())
}
