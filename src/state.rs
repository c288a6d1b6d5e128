use std::sync::Arc;

use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::database::UserDirectory;

/// Dependencies shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthService>,
    pub users: Arc<dyn UserDirectory>,
}

impl AppState {
    pub fn new(config: AppConfig, auth: AuthService, users: Arc<dyn UserDirectory>) -> Self {
        Self {
            config: Arc::new(config),
            auth: Arc::new(auth),
            users,
        }
    }
}
