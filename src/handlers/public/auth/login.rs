// handlers/public/auth/login.rs - POST /api/auth/login handler

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::auth::{password, AuthError};
use crate::database::models::UserProfile;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: i64,
    pub user: UserProfile,
}

/**
 * POST /api/auth/login - Authenticate user and receive a token
 *
 * Issuing a token replaces any token the user already had, so a second login
 * logs the first session out.
 *
 * Expected Input:
 * ```json
 * {
 *   "username": "string",   // Required
 *   "password": "string"    // Required
 * }
 * ```
 *
 * Expected Output (Success):
 * ```json
 * {
 *   "success": true,
 *   "data": {
 *     "token": "eyJhbGciOiJIUzI1NiI...",
 *     "expires_in": 604800,
 *     "user": { "id": 1, "username": "admin", "email": "admin@example.com", "avatar": "", "role": "admin" }
 *   }
 * }
 * ```
 *
 * Error Responses:
 * - 400: VALIDATION_ERROR (missing username/password), INVALID_JSON
 * - 401: UNAUTHORIZED, identical for unknown users and wrong passwords
 * - 503: SERVICE_UNAVAILABLE when the token store cannot be reached
 */
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<LoginResponse> {
    let Json(payload) = payload?;

    let mut missing = Vec::new();
    if payload.username.trim().is_empty() {
        missing.push("username");
    }
    if payload.password.is_empty() {
        missing.push("password");
    }
    if !missing.is_empty() {
        return Err(ApiError::missing_fields(&missing));
    }

    let user = state.users.find_by_username(payload.username.trim()).await?;

    // Unknown users pay for a verification too, so timing matches a wrong password
    let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
    let candidate = payload.password;
    let matches = tokio::task::spawn_blocking(move || match stored_hash {
        Some(hash) => password::verify(&candidate, &hash),
        None => password::verify_absent(&candidate),
    })
    .await
    .map_err(|e| {
        tracing::error!("Password verification task failed: {}", e);
        ApiError::internal_server_error("Failed to verify credentials")
    })?;

    let user = match user {
        Some(user) if matches => user,
        Some(user) => {
            tracing::info!(user_id = user.id, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }
        None => {
            tracing::info!("Login failed: unknown user");
            return Err(AuthError::InvalidCredentials.into());
        }
    };

    let issued = state
        .auth
        .issue(user.id, &user.username, Some(user.role.as_str()))
        .await?;

    tracing::info!(user_id = user.id, "User logged in");

    Ok(ApiResponse::success(LoginResponse {
        expires_in: issued.expires_in(state.auth.now()),
        token: issued.token,
        user: UserProfile::from(&user),
    }))
}
