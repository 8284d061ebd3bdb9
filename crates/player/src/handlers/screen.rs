//! Handlers for the screen mode controller.
//!
//! Every action answers with the resulting player state so the rendering
//! layer never has to issue a second request.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use menuboard_core::error::CoreError;
use menuboard_core::keyboard::{InputTarget, Key, KeyEvent};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::controller::PlayerState;
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct ShowScreenRequest {
    #[validate(length(min = 1, message = "screen_id must not be empty"))]
    pub screen_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ExtendTimeoutRequest {
    #[validate(range(min = 1, max = 3600, message = "seconds must be between 1 and 3600"))]
    pub seconds: u32,
}

#[derive(Debug, Deserialize)]
pub struct KeyRequest {
    /// Host key name, e.g. `"Escape"` or `"a"`.
    pub key: String,
    /// Where focus was; keys typed into a text field are ignored.
    #[serde(default)]
    pub target: InputTarget,
}

#[derive(Debug, Serialize)]
pub struct KeyResponse {
    /// The host should suppress its default handling of the key.
    pub consumed: bool,
    pub state: PlayerState,
}

fn validate<T: Validate>(input: &T) -> Result<(), CoreError> {
    input
        .validate()
        .map_err(|e| CoreError::Validation(e.to_string()))
}

/// GET /api/v1/screen
pub async fn get_state(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let player = state.player.state().await?;
    Ok(Json(DataResponse { data: player }))
}

/// POST /api/v1/screen/show
///
/// Show a secondary screen picked on the display (tap/click path).
pub async fn show_screen(
    State(state): State<AppState>,
    AppJson(input): AppJson<ShowScreenRequest>,
) -> AppResult<impl IntoResponse> {
    validate(&input)?;
    let player = state.player.show_screen(input.screen_id).await?;
    Ok(Json(DataResponse { data: player }))
}

/// POST /api/v1/screen/return
pub async fn return_to_primary(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let player = state.player.return_to_primary().await?;
    Ok(Json(DataResponse { data: player }))
}

/// POST /api/v1/timeout/reset
pub async fn reset_timeout(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let player = state.player.reset_timeout().await?;
    Ok(Json(DataResponse { data: player }))
}

/// POST /api/v1/timeout/extend
pub async fn extend_timeout(
    State(state): State<AppState>,
    AppJson(input): AppJson<ExtendTimeoutRequest>,
) -> AppResult<impl IntoResponse> {
    validate(&input)?;
    let player = state.player.extend_timeout(input.seconds).await?;

    tracing::debug!(
        seconds = input.seconds,
        remaining = ?player.screen.timeout_remaining,
        "Countdown extended",
    );

    Ok(Json(DataResponse { data: player }))
}

/// POST /api/v1/timeout/pause
pub async fn pause_timeout(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let player = state.player.pause_timeout().await?;
    Ok(Json(DataResponse { data: player }))
}

/// POST /api/v1/input/key
///
/// Apply the keyboard policy. `consumed` tells the host whether to
/// suppress its default handling.
pub async fn press_key(
    State(state): State<AppState>,
    AppJson(input): AppJson<KeyRequest>,
) -> AppResult<impl IntoResponse> {
    if input.key.is_empty() {
        return Err(AppError::BadRequest("key must not be empty".to_string()));
    }

    let event = KeyEvent {
        key: Key::parse(&input.key),
        target: input.target,
    };

    let reply = state.player.key(event).await?;
    Ok(Json(DataResponse {
        data: KeyResponse {
            consumed: reply.consumed,
            state: reply.state,
        },
    }))
}

/// POST /api/v1/sleep/toggle
pub async fn toggle_sleep(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let player = state.player.toggle_sleep().await?;
    Ok(Json(DataResponse { data: player }))
}
