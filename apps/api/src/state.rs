use std::sync::Arc;

use tokio::sync::Mutex;

use crate::auth::AuthBackend;
use crate::config::Config;
use crate::gateway::DataGateway;
use crate::preferences::ThemeStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Table access with the public key. Handlers acting for a signed-in
    /// user take a token-bound copy from their session instead.
    pub gateway: Arc<dyn DataGateway>,
    pub auth: Arc<dyn AuthBackend>,
    pub config: Config,
    pub theme: Arc<Mutex<ThemeStore>>,
}
