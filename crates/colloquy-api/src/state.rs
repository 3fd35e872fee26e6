use std::sync::Arc;
use std::time::Instant;

use colloquy_core::Assistant;
use crate::config::Config;

/// Shared application state passed to all handlers
///
/// A single assistant serves every request; it serializes history changes
/// internally.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub assistant: Arc<Assistant>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: Config, assistant: Arc<Assistant>) -> Self {
        Self {
            config: Arc::new(config),
            assistant,
            started_at: Instant::now(),
        }
    }
}
