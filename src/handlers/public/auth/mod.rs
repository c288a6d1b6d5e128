// handlers/public/auth/mod.rs - Public authentication handlers
pub mod login; // POST /api/auth/login - verify credentials and issue a token
pub mod register; // POST /api/auth/register - create a new account

pub use login::login;
pub use register::register;
