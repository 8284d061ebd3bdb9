//! Handlers for the live menu data.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use menuboard_core::board_view::BoardView;
use menuboard_core::types::Timestamp;
use serde::Serialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::sync::MenuStatus;

/// What the rendering layer needs to draw the primary menu.
#[derive(Debug, Serialize)]
pub struct MenuView {
    pub status: MenuStatus,
    pub sequence: Option<u64>,
    pub fetched_at: Option<Timestamp>,
    pub board: Option<BoardView>,
}

/// GET /api/v1/menu
///
/// The last known menu. Never fails: loading, error and not-configured
/// conditions are reported through `status`.
pub async fn get_menu(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let data = state.sync.current();
    let snapshot = data.snapshot.as_deref();

    let view = MenuView {
        status: data.status(),
        sequence: snapshot.map(|s| s.sequence),
        fetched_at: snapshot.map(|s| s.fetched_at),
        board: snapshot.and_then(|s| s.board.clone()),
    };

    Ok(Json(DataResponse { data: view }))
}
