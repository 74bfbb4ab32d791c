//! Application State

use std::sync::Arc;

use crate::backend::OpsBackend;
use crate::console::ConsoleStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Operations backend (CLI subprocess or direct gateway)
    pub backend: Arc<dyn OpsBackend>,

    /// Last console output per named context
    pub console: Arc<ConsoleStore>,
}
