pub mod session;

// Re-export handler functions for use in routing
pub use session::logout as session_logout;
pub use session::profile as session_profile;
pub use session::refresh as session_refresh;
