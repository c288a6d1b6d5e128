// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition and account registration. Every input is untrusted here.
pub mod auth;

pub use auth::*;
