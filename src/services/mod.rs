use std::sync::Arc;

use crate::config::Config;

pub mod hub;
pub mod session_controller;
pub mod submission_parser;

pub use hub::Hub;
pub use session_controller::SessionController;

pub struct AppState {
    pub config: Config,
    pub hub: Arc<Hub>,
    pub controller: Arc<SessionController>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let hub = Arc::new(Hub::new());
        let controller = Arc::new(SessionController::new(Arc::clone(&hub)));
        Self {
            config,
            hub,
            controller,
        }
    }
}
