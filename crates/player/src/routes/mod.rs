pub mod health;
pub mod menu;
pub mod screen;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /menu                 live menu status and board view (GET)
///
/// /screen               current player state (GET)
/// /screen/show          show a secondary screen by id (POST)
/// /screen/return        return to the primary menu (POST)
///
/// /timeout/reset        restore the configured countdown (POST)
/// /timeout/extend       add seconds to the countdown (POST)
/// /timeout/pause        stop the countdown (POST)
///
/// /input/key            apply the keyboard policy to a key press (POST)
/// /sleep/toggle         toggle sleep mode (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(menu::router())
        .merge(screen::router())
}
