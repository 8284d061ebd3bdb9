//! Primary menu / secondary screen state machine.
//!
//! ```text
//!            show_screen(s)                 show_screen(s')
//!  Primary ─────────────────▶ Secondary(s) ─────────────────▶ Secondary(s')
//!     ▲                            │
//!     └──── return_to_primary ─────┤ (Escape, Backspace, tap, countdown expiry)
//! ```
//!
//! Every transition restarts or clears the auto-return [`Countdown`].

use std::sync::Arc;

use serde::Serialize;

use crate::countdown::{Countdown, TickOutcome};
use crate::error::CoreError;
use crate::keyboard::{self, KeyAction, KeyEvent, KeyOutcome};
use crate::model::{SecondaryScreen, DEFAULT_TIMEOUT_SECS};
use crate::screens::{ScreenDirectory, TriggerKeyIndex};

#[derive(Debug, Clone, PartialEq)]
pub enum ScreenMode {
    Primary,
    Secondary(Arc<SecondaryScreen>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeKind {
    Primary,
    Secondary,
}

/// Serializable view of the controller for the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenStatus {
    pub mode: ModeKind,
    pub active_screen: Option<SecondaryScreen>,
    pub timeout_remaining: Option<u32>,
    pub timeout_running: bool,
    pub available_keys: Vec<char>,
}

impl Default for ScreenStatus {
    fn default() -> Self {
        Self {
            mode: ModeKind::Primary,
            active_screen: None,
            timeout_remaining: None,
            timeout_running: false,
            available_keys: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScreenController {
    mode: ScreenMode,
    countdown: Countdown,
    default_timeout: u32,
    keys: TriggerKeyIndex,
    directory: ScreenDirectory,
    /// Bumped on every mode transition; lets a driver restart its tick phase.
    generation: u64,
}

impl Default for ScreenController {
    fn default() -> Self {
        Self::new(&[], DEFAULT_TIMEOUT_SECS, None)
    }
}

impl ScreenController {
    /// Start in Primary, or in Secondary when a forced screen is supplied.
    pub fn new(
        screens: &[SecondaryScreen],
        default_timeout: u32,
        initial: Option<SecondaryScreen>,
    ) -> Self {
        let mut controller = Self {
            mode: ScreenMode::Primary,
            countdown: Countdown::default(),
            default_timeout,
            keys: TriggerKeyIndex::default(),
            directory: ScreenDirectory::default(),
            generation: 0,
        };
        controller.replace_screens(screens);

        if let Some(screen) = initial {
            controller.force_screen(screen);
        }
        controller
    }

    pub fn mode(&self) -> &ScreenMode {
        &self.mode
    }

    pub fn is_secondary(&self) -> bool {
        matches!(self.mode, ScreenMode::Secondary(_))
    }

    pub fn active_screen(&self) -> Option<&Arc<SecondaryScreen>> {
        match &self.mode {
            ScreenMode::Primary => None,
            ScreenMode::Secondary(screen) => Some(screen),
        }
    }

    pub fn timeout_remaining(&self) -> Option<u32> {
        self.countdown.remaining()
    }

    pub fn countdown_running(&self) -> bool {
        self.countdown.is_running()
    }

    pub fn default_timeout(&self) -> u32 {
        self.default_timeout
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn trigger_keys(&self) -> &TriggerKeyIndex {
        &self.keys
    }

    pub fn directory(&self) -> &ScreenDirectory {
        &self.directory
    }

    pub fn set_default_timeout(&mut self, seconds: u32) {
        self.default_timeout = seconds;
    }

    /// Rebuild both indexes from a new screen set.
    ///
    /// An active screen that still exists is refreshed in place; its
    /// countdown keeps running untouched.
    pub fn replace_screens(&mut self, screens: &[SecondaryScreen]) {
        let screens: Vec<Arc<SecondaryScreen>> = screens.iter().cloned().map(Arc::new).collect();
        self.keys = TriggerKeyIndex::build(&screens);
        self.directory = ScreenDirectory::build(&screens);

        let refreshed = self
            .active_screen()
            .and_then(|active| self.directory.get(&active.id))
            .cloned();
        if let Some(fresh) = refreshed {
            self.mode = ScreenMode::Secondary(fresh);
        }
    }

    /// Enter (or retarget) the secondary mode.
    pub fn show_screen(&mut self, screen: Arc<SecondaryScreen>) {
        let timeout = self.timeout_for(&screen);
        tracing::info!(
            screen_id = %screen.id,
            title = %screen.title,
            trigger_key = %screen.trigger_key,
            timeout,
            "Showing secondary screen",
        );

        self.mode = ScreenMode::Secondary(screen);
        self.countdown.start(timeout);
        self.generation += 1;
    }

    /// Show a screen picked directly by the rendering layer (tap/click).
    pub fn show_screen_by_id(&mut self, id: &str) -> Result<(), CoreError> {
        let screen = self
            .directory
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound {
                entity: "secondary_screen",
                id: id.to_string(),
            })?;
        self.show_screen(screen);
        Ok(())
    }

    /// Leave secondary mode. Returns `false` when already on the menu.
    pub fn return_to_primary(&mut self) -> bool {
        if !self.is_secondary() {
            return false;
        }

        tracing::info!("Returning to primary menu");
        self.mode = ScreenMode::Primary;
        self.countdown.clear();
        self.generation += 1;
        true
    }

    /// Advance the auto-return countdown by one second.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_secondary() {
            return TickOutcome::Idle;
        }

        let outcome = self.countdown.tick();
        if outcome == TickOutcome::Expired {
            tracing::info!("Secondary screen timed out");
            self.return_to_primary();
        }
        outcome
    }

    /// Restore the active screen's configured timeout.
    pub fn reset_timeout(&mut self) {
        if let Some(screen) = self.active_screen() {
            let timeout = self.timeout_for(screen);
            self.countdown.reset(timeout);
        }
    }

    pub fn extend_timeout(&mut self, seconds: u32) {
        if self.is_secondary() {
            self.countdown.extend(seconds);
        }
    }

    pub fn pause_timeout(&mut self) {
        if self.is_secondary() {
            tracing::debug!(remaining = ?self.countdown.remaining(), "Pausing countdown");
            self.countdown.pause();
        }
    }

    /// Apply the keyboard policy. Screen actions are performed here;
    /// [`KeyAction::ToggleSleep`] is left for the caller.
    pub fn handle_key(&mut self, event: &KeyEvent) -> KeyOutcome {
        let outcome = keyboard::interpret(event, self.is_secondary(), &self.keys);

        match &outcome.action {
            Some(KeyAction::ReturnToPrimary) => {
                self.return_to_primary();
            }
            Some(KeyAction::ShowScreen(screen)) => {
                tracing::info!(key = ?event.key, screen_id = %screen.id, "Trigger key pressed");
                self.show_screen(Arc::clone(screen));
            }
            Some(KeyAction::ToggleSleep) | None => {}
        }
        outcome
    }

    pub fn status(&self) -> ScreenStatus {
        ScreenStatus {
            mode: if self.is_secondary() {
                ModeKind::Secondary
            } else {
                ModeKind::Primary
            },
            active_screen: self.active_screen().map(|s| (**s).clone()),
            timeout_remaining: self.countdown.remaining(),
            timeout_running: self.countdown.is_running(),
            available_keys: self.keys.keys(),
        }
    }

    fn timeout_for(&self, screen: &SecondaryScreen) -> u32 {
        screen.timeout_override().unwrap_or(self.default_timeout)
    }

    /// Prefer the indexed copy of a screen when one exists.
    fn canonical(&self, screen: SecondaryScreen) -> Arc<SecondaryScreen> {
        self.directory
            .get(&screen.id)
            .cloned()
            .unwrap_or_else(|| Arc::new(screen))
    }

    /// Show an externally forced screen, preferring the indexed copy.
    pub fn force_screen(&mut self, screen: SecondaryScreen) {
        let screen = self.canonical(screen);
        self.show_screen(screen);
    }
}
