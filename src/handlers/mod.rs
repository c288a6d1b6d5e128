// handlers/mod.rs - two security tiers
//
// Public (no auth) → Protected (bearer token validated against the token store)
pub mod health;
pub mod protected; // /api/auth/* behind jwt_auth_middleware
pub mod public; // token acquisition and registration
