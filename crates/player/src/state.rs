use std::sync::Arc;

use crate::config::PlayerConfig;
use crate::controller::PlayerHandle;
use crate::sync::MenuSynchronizer;

/// Shared application state available to all Axum handlers via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<PlayerConfig>,
    /// Live menu data.
    pub sync: Arc<MenuSynchronizer>,
    /// Screen mode controller task.
    pub player: PlayerHandle,
}
