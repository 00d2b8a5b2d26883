use std::sync::Arc;
use tokio::sync::RwLock;

use paddock_core::SnapshotSource;

use crate::config::ServerConfig;
use crate::session::Session;

pub type SharedSession = Arc<RwLock<Session>>;

#[derive(Clone)]
pub struct AppState {
    pub session: SharedSession,
    pub source: Arc<dyn SnapshotSource>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig, source: Arc<dyn SnapshotSource>) -> Self {
        Self {
            session: Arc::new(RwLock::new(Session::new(&config.game))),
            source,
            config: Arc::new(config),
        }
    }
}
