//! Screen mode, countdown, keyboard and sleep routes.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::screen;
use crate::state::AppState;

/// ```text
/// GET  /screen         -> get_state
/// POST /screen/show    -> show_screen
/// POST /screen/return  -> return_to_primary
/// POST /timeout/reset  -> reset_timeout
/// POST /timeout/extend -> extend_timeout
/// POST /timeout/pause  -> pause_timeout
/// POST /input/key      -> press_key
/// POST /sleep/toggle   -> toggle_sleep
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/screen", get(screen::get_state))
        .route("/screen/show", post(screen::show_screen))
        .route("/screen/return", post(screen::return_to_primary))
        .route("/timeout/reset", post(screen::reset_timeout))
        .route("/timeout/extend", post(screen::extend_timeout))
        .route("/timeout/pause", post(screen::pause_timeout))
        .route("/input/key", post(screen::press_key))
        .route("/sleep/toggle", post(screen::toggle_sleep))
}
