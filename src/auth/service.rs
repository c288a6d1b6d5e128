use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use super::claims::Claims;
use super::clock::{Clock, SystemClock};
use super::error::AuthError;
use super::store::{RedisTokenStore, TokenStore};
use crate::config::{AppConfig, JwtConfig, MAX_EXPIRE_HOURS};

/// A freshly minted token together with its expiry
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl IssuedToken {
    /// Whole seconds left before expiry, as seen at `now`. Compared at the
    /// one-second resolution of the token's `exp` claim.
    pub fn expires_in(&self, now: DateTime<Utc>) -> i64 {
        self.expires_at
            .timestamp()
            .saturating_sub(now.timestamp())
            .max(0)
    }
}

/// Issues, validates, refreshes and revokes tokens.
///
/// Every token that validates is both correctly signed and the one currently
/// recorded for its principal in the [`TokenStore`].
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    validity: Duration,
    leeway: i64,
    store: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    /// Connect the Redis token store named in `config` and build the service
    pub async fn init(config: &AppConfig) -> Result<Self, AuthError> {
        let store = RedisTokenStore::connect(&config.redis).await?;
        Self::new(&config.jwt, Arc::new(store), Arc::new(SystemClock))
    }

    pub fn new(
        jwt: &JwtConfig,
        store: Arc<dyn TokenStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AuthError> {
        if jwt.secret.is_empty() {
            return Err(AuthError::ConfigUnavailable("JWT secret not configured".to_string()));
        }
        if jwt.expire_hours == 0 {
            return Err(AuthError::ConfigUnavailable(
                "JWT validity window must be positive".to_string(),
            ));
        }
        if jwt.expire_hours > MAX_EXPIRE_HOURS {
            return Err(AuthError::ConfigUnavailable(
                "JWT validity window too large".to_string(),
            ));
        }
        if jwt.leeway_secs >= jwt.expire_hours * 3600 {
            return Err(AuthError::ConfigUnavailable(
                "JWT leeway must be shorter than the validity window".to_string(),
            ));
        }
        let hours = i64::try_from(jwt.expire_hours)
            .map_err(|_| AuthError::ConfigUnavailable("JWT validity window too large".to_string()))?;
        let validity = Duration::try_hours(hours)
            .ok_or_else(|| AuthError::ConfigUnavailable("JWT validity window too large".to_string()))?;

        // Time claims are checked against the injected clock, not by jsonwebtoken
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.set_required_spec_claims(&["exp", "nbf"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(jwt.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt.secret.as_bytes()),
            validation,
            validity,
            leeway: i64::try_from(jwt.leeway_secs).unwrap_or(i64::MAX),
            store,
            clock,
        })
    }

    pub fn validity(&self) -> Duration {
        self.validity
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Mint a token and record it as the principal's only active token.
    ///
    /// The token is returned only after the store write succeeded.
    pub async fn issue(
        &self,
        user_id: i64,
        username: &str,
        role: Option<&str>,
    ) -> Result<IssuedToken, AuthError> {
        let claims = Claims::new(
            user_id,
            username,
            role.map(str::to_string),
            self.clock.now(),
            self.validity,
        );
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::ConfigUnavailable(format!("token signing failed: {e}")))?;

        let ttl = self
            .validity
            .to_std()
            .map_err(|_| AuthError::ConfigUnavailable("JWT validity window out of range".to_string()))?;

        if let Err(e) = self.store.put(user_id, &token, ttl).await {
            tracing::error!(user_id, "Failed to record issued token: {}", e);
            return Err(e.into());
        }

        tracing::debug!(user_id, token = %fingerprint(&token), "Issued token");
        Ok(IssuedToken {
            token,
            expires_at: claims.expires_at(),
        })
    }

    /// Check signature and time window, then require the token to be the
    /// principal's active one.
    pub async fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)?.claims;
        claims
            .check_time(self.clock.now(), self.leeway)
            .map_err(|reason| AuthError::InvalidToken(reason.to_string()))?;

        match self.store.get(claims.user_id).await? {
            Some(active) if active == token => Ok(claims),
            Some(_) => {
                tracing::debug!(
                    user_id = claims.user_id,
                    token = %fingerprint(token),
                    "Rejected superseded token"
                );
                Err(AuthError::RevokedOrSuperseded)
            }
            None => {
                tracing::debug!(
                    user_id = claims.user_id,
                    token = %fingerprint(token),
                    "Rejected token with no active record"
                );
                Err(AuthError::RevokedOrSuperseded)
            }
        }
    }

    /// Delete the active token, then issue a new one. A failed delete aborts
    /// before anything is minted.
    pub async fn refresh(
        &self,
        user_id: i64,
        username: &str,
        role: Option<&str>,
    ) -> Result<IssuedToken, AuthError> {
        if let Err(e) = self.store.delete(user_id).await {
            tracing::error!(user_id, "Failed to invalidate token before refresh: {}", e);
            return Err(e.into());
        }
        self.issue(user_id, username, role).await
    }

    /// Remove the principal's active token. Succeeds when none exists.
    pub async fn revoke(&self, user_id: i64) -> Result<(), AuthError> {
        self.store.delete(user_id).await?;
        tracing::debug!(user_id, "Revoked active token");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AuthError> {
        self.store.ping().await.map_err(AuthError::from)
    }

    pub async fn close(&self) {
        self.store.close().await;
    }
}

/// Short, non-reversible token identifier safe to put in logs
pub fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest[..6].iter().map(|b| format!("{b:02x}")).collect()
}
