//! Screen mode controller task.
//!
//! A single spawned task owns the [`ScreenController`] state machine. It
//! follows the synchronizer's [`MenuData`] channel, drives the one-second
//! auto-return tick, and serves commands from [`PlayerHandle`]s. Every
//! change is published as a [`PlayerState`] on a watch channel.

use std::sync::Arc;
use std::time::Duration;

use menuboard_core::countdown::TickOutcome;
use menuboard_core::error::CoreError;
use menuboard_core::keyboard::{KeyAction, KeyEvent};
use menuboard_core::model::{KioskSettings, DEFAULT_TIMEOUT_SECS};
use menuboard_core::screen_mode::{ScreenController, ScreenStatus};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::sync::MenuData;

/// Countdown resolution.
const TICK_INTERVAL: Duration = Duration::from_secs(1);

const COMMAND_CHANNEL_CAPACITY: usize = 32;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Used until the kiosk settings provide a default timeout.
    pub default_timeout_secs: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Everything the rendering layer needs to draw the current mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayerState {
    #[serde(flatten)]
    pub screen: ScreenStatus,
    pub sleep_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandReply {
    pub state: PlayerState,
    /// Whether the host should suppress its default handling.
    pub consumed: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Screen controller is not running")]
    Stopped,
}

#[derive(Debug)]
enum Command {
    ShowScreen(String),
    ReturnToPrimary,
    ResetTimeout,
    ExtendTimeout(u32),
    PauseTimeout,
    Key(KeyEvent),
    ToggleSleep,
    State,
}

struct Request {
    command: Command,
    reply: oneshot::Sender<Result<CommandReply, CoreError>>,
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

struct TaskSlot {
    cancel: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

/// Cloneable front for the controller task.
#[derive(Clone)]
pub struct PlayerHandle {
    commands: mpsc::Sender<Request>,
    state_rx: watch::Receiver<PlayerState>,
    task: Arc<TaskSlot>,
}

impl PlayerHandle {
    pub async fn show_screen(&self, id: impl Into<String>) -> Result<PlayerState, PlayerError> {
        self.state_after(Command::ShowScreen(id.into())).await
    }

    pub async fn return_to_primary(&self) -> Result<PlayerState, PlayerError> {
        self.state_after(Command::ReturnToPrimary).await
    }

    pub async fn reset_timeout(&self) -> Result<PlayerState, PlayerError> {
        self.state_after(Command::ResetTimeout).await
    }

    pub async fn extend_timeout(&self, seconds: u32) -> Result<PlayerState, PlayerError> {
        self.state_after(Command::ExtendTimeout(seconds)).await
    }

    pub async fn pause_timeout(&self) -> Result<PlayerState, PlayerError> {
        self.state_after(Command::PauseTimeout).await
    }

    /// Apply the keyboard policy to one key press.
    pub async fn key(&self, event: KeyEvent) -> Result<CommandReply, PlayerError> {
        self.send(Command::Key(event)).await
    }

    pub async fn toggle_sleep(&self) -> Result<PlayerState, PlayerError> {
        self.state_after(Command::ToggleSleep).await
    }

    /// Current state as seen by the controller task.
    pub async fn state(&self) -> Result<PlayerState, PlayerError> {
        self.state_after(Command::State).await
    }

    pub fn subscribe(&self) -> watch::Receiver<PlayerState> {
        self.state_rx.clone()
    }

    /// Stop the task and wait for it to exit.
    pub async fn shutdown(&self) {
        self.task.cancel.cancel();
        let Some(handle) = self.task.handle.lock().await.take() else {
            return;
        };
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await.is_err() {
            tracing::warn!("Screen controller did not stop in time");
        }
    }

    async fn state_after(&self, command: Command) -> Result<PlayerState, PlayerError> {
        Ok(self.send(command).await?.state)
    }

    async fn send(&self, command: Command) -> Result<CommandReply, PlayerError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Request { command, reply })
            .await
            .map_err(|_| PlayerError::Stopped)?;

        Ok(rx.await.map_err(|_| PlayerError::Stopped)??)
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

pub struct PlayerController {
    config: ControllerConfig,
    screens: ScreenController,
    sleep_mode: bool,
    /// Sequence of the last applied menu snapshot.
    menu_sequence: Option<u64>,
    /// Id of the last externally forced screen.
    forced_id: Option<String>,
    state_tx: watch::Sender<PlayerState>,
}

impl PlayerController {
    /// Spawn the controller task following `menu_rx`.
    pub fn spawn(menu_rx: watch::Receiver<MenuData>, config: ControllerConfig) -> PlayerHandle {
        let (state_tx, state_rx) = watch::channel(PlayerState::default());
        let (commands, command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();

        let controller = Self {
            screens: ScreenController::new(&[], config.default_timeout_secs, None),
            config,
            sleep_mode: false,
            menu_sequence: None,
            forced_id: None,
            state_tx,
        };
        let handle = tokio::spawn(controller.run(menu_rx, command_rx, cancel.clone()));

        PlayerHandle {
            commands,
            state_rx,
            task: Arc::new(TaskSlot {
                cancel,
                handle: Mutex::new(Some(handle)),
            }),
        }
    }

    async fn run(
        mut self,
        mut menu_rx: watch::Receiver<MenuData>,
        mut commands: mpsc::Receiver<Request>,
        cancel: CancellationToken,
    ) {
        let initial = menu_rx.borrow_and_update().clone();
        self.apply_menu(&initial);
        self.publish();

        let mut menu_open = true;
        let mut tick_at: Option<Instant> = None;
        let mut tick_generation = self.screens.generation();
        self.schedule_tick(&mut tick_at, &mut tick_generation);

        loop {
            let deadline = tick_at.unwrap_or_else(Instant::now);

            tokio::select! {
                _ = cancel.cancelled() => break,

                changed = menu_rx.changed(), if menu_open => {
                    if changed.is_err() {
                        tracing::debug!("Menu channel closed");
                        menu_open = false;
                        continue;
                    }
                    let data = menu_rx.borrow_and_update().clone();
                    if self.apply_menu(&data) {
                        self.publish();
                    }
                }

                _ = tokio::time::sleep_until(deadline), if tick_at.is_some() => {
                    match self.screens.tick() {
                        TickOutcome::Counting(_) => tick_at = Some(deadline + TICK_INTERVAL),
                        TickOutcome::Expired | TickOutcome::Idle => tick_at = None,
                    }
                    self.publish();
                }

                request = commands.recv() => {
                    let Some(Request { command, reply }) = request else {
                        break;
                    };
                    let result = self.handle(command);
                    self.publish();
                    let _ = reply.send(result);
                }
            }

            self.schedule_tick(&mut tick_at, &mut tick_generation);
        }

        tracing::info!("Screen controller stopped");
    }

    /// Keep a tick deadline only while the countdown runs, restarting the
    /// one-second phase whenever the mode changes.
    fn schedule_tick(&self, tick_at: &mut Option<Instant>, generation: &mut u64) {
        if !self.screens.countdown_running() {
            *tick_at = None;
            return;
        }

        let current = self.screens.generation();
        if tick_at.is_none() || *generation != current {
            *tick_at = Some(Instant::now() + TICK_INTERVAL);
        }
        *generation = current;
    }

    fn handle(&mut self, command: Command) -> Result<CommandReply, CoreError> {
        let consumed = match command {
            Command::ShowScreen(id) => {
                self.screens.show_screen_by_id(&id)?;
                true
            }
            Command::ReturnToPrimary => self.screens.return_to_primary(),
            Command::ResetTimeout => {
                self.require_secondary()?;
                self.screens.reset_timeout();
                true
            }
            Command::ExtendTimeout(seconds) => {
                self.require_secondary()?;
                self.screens.extend_timeout(seconds);
                true
            }
            Command::PauseTimeout => {
                self.require_secondary()?;
                self.screens.pause_timeout();
                true
            }
            Command::Key(event) => {
                let outcome = self.screens.handle_key(&event);
                if outcome.action == Some(KeyAction::ToggleSleep) {
                    self.toggle_sleep();
                }
                outcome.consumed
            }
            Command::ToggleSleep => {
                self.toggle_sleep();
                true
            }
            Command::State => false,
        };

        Ok(CommandReply {
            state: self.state(),
            consumed,
        })
    }

    fn require_secondary(&self) -> Result<(), CoreError> {
        if self.screens.is_secondary() {
            Ok(())
        } else {
            Err(CoreError::InvalidState(
                "no secondary screen is active".to_string(),
            ))
        }
    }

    fn toggle_sleep(&mut self) {
        self.sleep_mode = !self.sleep_mode;
        tracing::info!(sleep_mode = self.sleep_mode, "Toggled sleep mode");
    }

    /// Fold a new snapshot into the controller. Returns `false` when the
    /// snapshot was already applied.
    fn apply_menu(&mut self, data: &MenuData) -> bool {
        let Some(snapshot) = &data.snapshot else {
            return false;
        };
        if self.menu_sequence == Some(snapshot.sequence) {
            return false;
        }
        self.menu_sequence = Some(snapshot.sequence);

        let settings = snapshot.settings.as_ref();
        let default_timeout = settings
            .filter(|s| s.default_timeout_seconds.is_some())
            .map(KioskSettings::default_timeout)
            .unwrap_or(self.config.default_timeout_secs);
        self.screens.set_default_timeout(default_timeout);
        self.screens.replace_screens(&snapshot.secondary_screens);

        for conflict in self.screens.trigger_keys().conflicts() {
            tracing::warn!(?conflict, "Duplicate trigger key");
        }

        let removed = self
            .screens
            .active_screen()
            .is_some_and(|active| self.screens.directory().get(&active.id).is_none());
        if removed {
            tracing::info!("Active secondary screen was removed");
            self.screens.return_to_primary();
        }

        let forced = settings.and_then(|s| s.active_secondary_screen.as_ref());
        let forced_id = forced.map(|screen| screen.id.clone());
        if forced_id != self.forced_id {
            if let Some(screen) = forced {
                tracing::info!(screen_id = %screen.id, "Applying forced secondary screen");
                self.screens.force_screen(screen.clone());
            }
            self.forced_id = forced_id;
        }
        true
    }

    fn state(&self) -> PlayerState {
        PlayerState {
            screen: self.screens.status(),
            sleep_mode: self.sleep_mode,
        }
    }

    fn publish(&self) {
        self.state_tx.send_if_modified(|current| {
            let next = self.state();
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}
