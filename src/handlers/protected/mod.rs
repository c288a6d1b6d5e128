// handlers/protected/mod.rs - Protected handlers (token required)
//
// Every route here sits behind jwt_auth_middleware, so handlers can rely on
// an AuthUser extension whose token is both valid and currently active.
pub mod auth;

pub use auth::*;
