use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Signed identity assertion carried inside the JWT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Random per-token id; keeps two tokens minted in the same second distinct
    pub jti: Uuid,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(
        user_id: i64,
        username: impl Into<String>,
        role: Option<String>,
        now: DateTime<Utc>,
        validity: Duration,
    ) -> Self {
        let issued = now.timestamp();
        Self {
            user_id,
            username: username.into(),
            role,
            jti: Uuid::new_v4(),
            iat: issued,
            nbf: issued,
            exp: now
                .checked_add_signed(validity)
                .map_or(i64::MAX, |expires| expires.timestamp()),
        }
    }

    /// Check issued-at, not-before and expires-at against `now`, widened by `leeway` seconds
    pub fn check_time(&self, now: DateTime<Utc>, leeway: i64) -> Result<(), &'static str> {
        let now = now.timestamp();
        let latest_start = now.saturating_add(leeway);
        if self.nbf > latest_start {
            return Err("token not yet valid");
        }
        if self.iat > latest_start {
            return Err("token issued in the future");
        }
        if now >= self.exp.saturating_add(leeway) {
            return Err("token expired");
        }
        Ok(())
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}
