use axum::{extract::State, Extension};
use serde::Serialize;

use crate::database::models::UserProfile;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub token: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub logged_out: bool,
}

/// GET /api/auth/profile - Current user's profile, read fresh from the directory
pub async fn profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<UserProfile> {
    let record = state
        .users
        .find_by_id(user.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(ApiResponse::success(UserProfile::from(&record)))
}

/**
 * POST /api/auth/refresh - Replace the current token with a new one
 *
 * The presented token stops validating before the new one is issued. A
 * concurrent request may briefly see 401, never two live tokens.
 *
 * Expected Output (Success):
 * ```json
 * {
 *   "success": true,
 *   "data": { "token": "eyJhbGciOiJIUzI1NiI...", "expires_in": 604800 }
 * }
 * ```
 */
pub async fn refresh(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<RefreshResponse> {
    let issued = state
        .auth
        .refresh(user.user_id, &user.username, user.role.as_deref())
        .await?;

    tracing::info!(user_id = user.user_id, "Refreshed token");

    Ok(ApiResponse::success(RefreshResponse {
        expires_in: issued.expires_in(state.auth.now()),
        token: issued.token,
    }))
}

/// POST /api/auth/logout - Revoke the current token
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<LogoutResponse> {
    state.auth.revoke(user.user_id).await?;

    tracing::info!(user_id = user.user_id, "User logged out");

    Ok(ApiResponse::success(LogoutResponse { logged_out: true }))
}
