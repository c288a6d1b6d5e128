// handlers/public/auth/register.rs - POST /api/auth/register handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::auth::password;
use crate::database::models::user::{NewUser, DEFAULT_ROLE};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
}

/**
 * POST /api/auth/register - Create a new account
 *
 * New accounts always get the default `user` role. Registering does not log
 * the user in; call /api/auth/login afterwards.
 *
 * Expected Input:
 * ```json
 * {
 *   "username": "string",   // Required, unique
 *   "password": "string",   // Required
 *   "email": "string"       // Required, unique
 * }
 * ```
 *
 * Expected Output (201 Created):
 * ```json
 * {
 *   "success": true,
 *   "data": { "id": 2, "username": "alice", "email": "alice@example.com" }
 * }
 * ```
 *
 * Error Responses:
 * - 400: VALIDATION_ERROR (missing fields, malformed email), INVALID_JSON
 * - 409: CONFLICT when the username or email is already in use
 */
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<RegisterResponse> {
    let Json(payload) = payload?;
    let username = payload.username.trim().to_string();
    let email = payload.email.trim().to_string();

    let mut missing = Vec::new();
    if username.is_empty() {
        missing.push("username");
    }
    if payload.password.is_empty() {
        missing.push("password");
    }
    if email.is_empty() {
        missing.push("email");
    }
    if !missing.is_empty() {
        return Err(ApiError::missing_fields(&missing));
    }

    if !looks_like_email(&email) {
        let mut field_errors = HashMap::new();
        field_errors.insert("email".to_string(), format!("Invalid email address: {}", email));
        return Err(ApiError::validation_error("Invalid field format", Some(field_errors)));
    }

    if state.users.username_taken(&username).await? {
        return Err(ApiError::conflict("Username already exists"));
    }
    if state.users.email_taken(&email).await? {
        return Err(ApiError::conflict("Email already exists"));
    }

    let plaintext = payload.password;
    let password_hash = tokio::task::spawn_blocking(move || password::hash(&plaintext))
        .await
        .map_err(|e| {
            tracing::error!("Password hashing task failed: {}", e);
            ApiError::internal_server_error("Failed to hash password")
        })?
        .map_err(|e| {
            tracing::error!("Password hashing failed: {}", e);
            ApiError::internal_server_error("Failed to hash password")
        })?;

    let user = state
        .users
        .create(NewUser {
            username,
            password_hash,
            email: Some(email),
            role: DEFAULT_ROLE.to_string(),
        })
        .await?;

    tracing::info!(user_id = user.id, "Registered user");

    Ok(ApiResponse::created(RegisterResponse {
        id: user.id,
        username: user.username,
        email: user.email,
    }))
}

/// One `@` with a non-empty local part and a dotted domain
fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::looks_like_email;

    #[test]
    fn email_shape() {
        assert!(looks_like_email("admin@example.com"));
        assert!(!looks_like_email("admin"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("a@b@example.com"));
        assert!(!looks_like_email("admin@localhost"));
        assert!(!looks_like_email("ad min@example.com"));
    }
}
