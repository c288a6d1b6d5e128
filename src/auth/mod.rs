//! Token lifecycle: credential verification, issuance, validation, refresh and revocation.
//!
//! A principal has at most one active token at a time. The active token is
//! kept in a [`TokenStore`] under `<prefix>:<user_id>`; issuing or refreshing
//! overwrites it and logout deletes it, so a correctly signed token is only
//! accepted while it is still the recorded one.

pub mod claims;
pub mod clock;
pub mod error;
pub mod password;
pub mod service;
pub mod store;

pub use claims::Claims;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{AuthError, StoreError};
pub use service::{fingerprint, AuthService, IssuedToken};
pub use store::{MemoryTokenStore, RedisTokenStore, TokenStore};
