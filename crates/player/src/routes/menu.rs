use axum::routing::get;
use axum::Router;

use crate::handlers::menu;
use crate::state::AppState;

/// ```text
/// GET /menu -> get_menu
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/menu", get(menu::get_menu))
}
