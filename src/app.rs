use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::{health, protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

/// Build the full router over `state`
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        // Public auth routes
        .merge(auth_public_routes())
        // Protected auth routes
        .merge(auth_routes(state.clone()))
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(public::login))
        .route("/api/auth/register", post(public::register))
}

fn auth_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/auth/profile", get(protected::session_profile))
        .route("/api/auth/refresh", post(protected::session_refresh))
        .route("/api/auth/logout", post(protected::session_logout))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthService, MemoryTokenStore, StoreError, SystemClock, TokenStore};
    use crate::testing::{memory_state, test_config, MemoryUserDirectory};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use std::sync::Arc;
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn call(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_is_public() {
        let router = app(memory_state().state);
        let request = Request::get("/health").body(Body::empty()).unwrap();

        let (status, body) = call(router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "ok");
    }

    #[tokio::test]
    async fn profile_without_token_is_rejected() {
        let router = app(memory_state().state);
        let request = Request::get("/api/auth/profile").body(Body::empty()).unwrap();

        let (status, body) = call(router, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn issued_token_reaches_protected_route() {
        let backends = memory_state();
        backends.users.seed("alice", "wonderland", "user").await;
        let issued = backends
            .state
            .auth
            .issue(1, "alice", Some("user"))
            .await
            .unwrap();

        let request = Request::get("/api/auth/profile")
            .header(header::AUTHORIZATION, format!("Bearer {}", issued.token))
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(app(backends.state), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["username"], "alice");
    }

    /// Accepts writes but cannot be read or pinged, like Redis going away mid-session
    #[derive(Default)]
    struct UnreachableStore {
        writes: MemoryTokenStore,
    }

    #[async_trait]
    impl TokenStore for UnreachableStore {
        async fn put(
            &self,
            user_id: i64,
            token: &str,
            ttl: std::time::Duration,
        ) -> Result<(), StoreError> {
            self.writes.put(user_id, token, ttl).await
        }

        async fn get(&self, _user_id: i64) -> Result<Option<String>, StoreError> {
            Err(StoreError::Timeout(std::time::Duration::from_secs(5)))
        }

        async fn delete(&self, user_id: i64) -> Result<(), StoreError> {
            self.writes.delete(user_id).await
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::Timeout(std::time::Duration::from_secs(5)))
        }
    }

    fn unreachable_store_state() -> AppState {
        let config = test_config();
        let auth = AuthService::new(
            &config.jwt,
            Arc::new(UnreachableStore::default()),
            Arc::new(SystemClock),
        )
        .unwrap();
        AppState::new(config, auth, Arc::new(MemoryUserDirectory::new()))
    }

    #[tokio::test]
    async fn store_outage_on_protected_route_is_503() {
        let state = unreachable_store_state();
        let issued = state.auth.issue(1, "alice", None).await.unwrap();

        let request = Request::get("/api/auth/profile")
            .header(header::AUTHORIZATION, format!("Bearer {}", issued.token))
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(app(state), request).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
    }

    #[tokio::test]
    async fn health_reports_store_outage() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = call(app(unreachable_store_state()), request).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["data"]["token_store"], "unavailable");
        assert_eq!(body["data"]["database"], "ok");
    }
}
