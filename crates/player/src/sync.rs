//! Live menu data synchronizer.
//!
//! Keeps a last-known-good [`MenuSnapshot`] that eventually reflects the
//! backend's published state:
//!
//! 1. one initial fetch when started,
//! 2. one change subscription for the lifetime of the synchronizer,
//! 3. accepted change notifications restart a debounce window; when it
//!    elapses a single re-fetch is spawned,
//! 4. every fetch carries a sequence number and results older than the
//!    applied snapshot are discarded.
//!
//! Failures never clear the snapshot. State is published through a
//! [`watch`] channel; call [`MenuSynchronizer::subscribe`] to follow it.

use std::sync::Arc;
use std::time::Duration;

use menuboard_content::error::ContentError;
use menuboard_content::reconnect::ReconnectConfig;
use menuboard_content::source::ContentSource;
use menuboard_content::subscription::{run_subscription, ListenerSignal};
use menuboard_core::board_view::BoardView;
use menuboard_core::model::{KioskSettings, MenuDocuments, SecondaryScreen};
use menuboard_core::screens::ScreenDirectory;
use menuboard_core::types::Timestamp;
use serde::Serialize;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Advisory shown while the change listener is down.
pub const CONNECTION_LOST_MESSAGE: &str = "Connection lost - showing last known menu";

/// Message used when the first load fails without a backend message.
const LOAD_FAILED_MESSAGE: &str = "Failed to load menu";

/// Capacity of the listener signal channel.
const SIGNAL_CHANNEL_CAPACITY: usize = 64;

/// Time allowed for the sync task to exit on shutdown.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub debounce: Duration,
    pub reconnect: ReconnectConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            reconnect: ReconnectConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot and published state
// ---------------------------------------------------------------------------

/// One successfully fetched, immutable view of the published content.
#[derive(Debug, Clone, Serialize)]
pub struct MenuSnapshot {
    pub settings: Option<KioskSettings>,
    pub secondary_screens: Vec<SecondaryScreen>,
    /// Precomputed primary menu; `None` when no board is active.
    pub board: Option<BoardView>,
    /// Sequence number of the fetch that produced this snapshot.
    pub sequence: u64,
    pub fetched_at: Timestamp,
}

impl MenuSnapshot {
    pub fn new(documents: MenuDocuments, sequence: u64) -> Self {
        let screens: Vec<Arc<SecondaryScreen>> = documents
            .secondary_screens
            .iter()
            .cloned()
            .map(Arc::new)
            .collect();
        let directory = ScreenDirectory::build(&screens);
        let board = documents
            .settings
            .as_ref()
            .and_then(|settings| BoardView::build(settings, &directory));

        Self {
            settings: documents.settings,
            secondary_screens: documents.secondary_screens,
            board,
            sequence,
            fetched_at: chrono::Utc::now(),
        }
    }

    pub fn has_active_board(&self) -> bool {
        self.settings
            .as_ref()
            .is_some_and(|s| s.active_board.is_some())
    }
}

/// What the rendering layer observes.
#[derive(Debug, Clone, Serialize)]
pub struct MenuData {
    pub snapshot: Option<Arc<MenuSnapshot>>,
    /// True only until the first fetch resolves.
    pub is_loading: bool,
    /// Non-fatal; may coexist with a snapshot.
    pub error: Option<String>,
}

impl Default for MenuData {
    fn default() -> Self {
        Self {
            snapshot: None,
            is_loading: true,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MenuStatus {
    Loading,
    /// Nothing to show and the last attempt failed.
    Failed { message: String },
    /// The backend is reachable but no board is active.
    NotConfigured { advisory: Option<String> },
    Ready { advisory: Option<String> },
}

impl MenuData {
    pub fn status(&self) -> MenuStatus {
        match &self.snapshot {
            None if self.is_loading => MenuStatus::Loading,
            None => MenuStatus::Failed {
                message: self
                    .error
                    .clone()
                    .unwrap_or_else(|| LOAD_FAILED_MESSAGE.to_string()),
            },
            Some(snapshot) if !snapshot.has_active_board() => MenuStatus::NotConfigured {
                advisory: self.error.clone(),
            },
            Some(_) => MenuStatus::Ready {
                advisory: self.error.clone(),
            },
        }
    }

    pub fn sequence(&self) -> Option<u64> {
        self.snapshot.as_ref().map(|s| s.sequence)
    }
}

// ---------------------------------------------------------------------------
// MenuSynchronizer
// ---------------------------------------------------------------------------

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the sync task. Cheap to share behind an `Arc`.
pub struct MenuSynchronizer {
    source: Arc<dyn ContentSource>,
    config: SyncConfig,
    data_tx: watch::Sender<MenuData>,
    running: Mutex<Option<Running>>,
}

impl MenuSynchronizer {
    pub fn new(source: Arc<dyn ContentSource>, config: SyncConfig) -> Self {
        let (data_tx, _) = watch::channel(MenuData::default());
        Self {
            source,
            config,
            data_tx,
            running: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<MenuData> {
        self.data_tx.subscribe()
    }

    pub fn current(&self) -> MenuData {
        self.data_tx.borrow().clone()
    }

    /// Start fetching and listening. Returns `false` if already running,
    /// so repeated initialization never opens a second subscription.
    pub async fn start(&self) -> bool {
        let mut running = self.running.lock().await;
        if running.is_some() {
            tracing::debug!("Menu synchronizer already running");
            return false;
        }

        // Sequences continue across restarts so followers never see one reused.
        let snapshot = self.data_tx.borrow().snapshot.clone();
        let applied_sequence = snapshot.as_ref().map_or(0, |s| s.sequence);
        let is_loading = snapshot.is_none();

        let cancel = CancellationToken::new();
        let sync = SyncLoop {
            source: Arc::clone(&self.source),
            config: self.config.clone(),
            data_tx: self.data_tx.clone(),
            cancel: cancel.clone(),
            next_sequence: applied_sequence,
            applied_sequence,
            snapshot,
            fetch_error: None,
            listener_down: false,
            is_loading,
            fetches: JoinSet::new(),
        };

        tracing::info!(
            debounce_ms = self.config.debounce.as_millis() as u64,
            "Starting menu synchronizer",
        );
        *running = Some(Running {
            cancel,
            handle: tokio::spawn(sync.run()),
        });
        true
    }

    /// Cancel the subscription, the debounce timer and any in-flight
    /// fetches, then wait for the task to exit.
    pub async fn shutdown(&self) {
        let Some(running) = self.running.lock().await.take() else {
            return;
        };

        tracing::info!("Shutting down menu synchronizer");
        running.cancel.cancel();
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, running.handle)
            .await
            .is_err()
        {
            tracing::warn!("Menu synchronizer did not stop in time");
        }
    }
}

// ---------------------------------------------------------------------------
// Sync task
// ---------------------------------------------------------------------------

type FetchOutcome = (u64, Result<MenuDocuments, ContentError>);

struct SyncLoop {
    source: Arc<dyn ContentSource>,
    config: SyncConfig,
    data_tx: watch::Sender<MenuData>,
    cancel: CancellationToken,
    next_sequence: u64,
    applied_sequence: u64,
    snapshot: Option<Arc<MenuSnapshot>>,
    fetch_error: Option<String>,
    listener_down: bool,
    is_loading: bool,
    fetches: JoinSet<FetchOutcome>,
}

impl SyncLoop {
    async fn run(mut self) {
        let (signal_tx, mut signal_rx) = mpsc::channel(SIGNAL_CHANNEL_CAPACITY);
        let listener = {
            let source = Arc::clone(&self.source);
            let reconnect = self.config.reconnect.clone();
            let cancel = self.cancel.child_token();
            tokio::spawn(async move {
                run_subscription(source.as_ref(), &signal_tx, &reconnect, &cancel).await;
            })
        };

        self.spawn_fetch("initial");

        let debounce = tokio::time::sleep(self.config.debounce);
        tokio::pin!(debounce);
        let mut debounce_armed = false;
        let mut pending_changes = 0u32;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,

                () = &mut debounce, if debounce_armed => {
                    debounce_armed = false;
                    tracing::debug!(changes = pending_changes, "Debounce window elapsed");
                    pending_changes = 0;
                    self.spawn_fetch("change");
                }

                Some(signal) = signal_rx.recv() => match signal {
                    ListenerSignal::Change(change) => {
                        pending_changes += 1;
                        tracing::debug!(document_id = %change.document_id, "Scheduling re-fetch");
                        debounce.as_mut().reset(Instant::now() + self.config.debounce);
                        debounce_armed = true;
                    }
                    ListenerSignal::Connected { reconnected } => {
                        if self.listener_down {
                            self.listener_down = false;
                            self.publish();
                        }
                        if reconnected {
                            // Changes may have been missed while offline.
                            tracing::debug!("Scheduling re-fetch after reconnect");
                            debounce.as_mut().reset(Instant::now() + self.config.debounce);
                            debounce_armed = true;
                        }
                    }
                    ListenerSignal::Lost(reason) => {
                        tracing::warn!(reason = %reason, "Change listener lost");
                        self.listener_down = true;
                        self.publish();
                    }
                },

                Some(joined) = self.fetches.join_next() => match joined {
                    Ok((sequence, result)) => self.apply(sequence, result),
                    Err(e) if e.is_cancelled() => {}
                    Err(e) => tracing::error!(error = %e, "Fetch task failed"),
                },
            }
        }

        self.fetches.shutdown().await;
        drop(signal_rx);
        let _ = listener.await;
        tracing::info!("Menu synchronizer stopped");
    }

    fn spawn_fetch(&mut self, reason: &'static str) {
        self.next_sequence += 1;
        let sequence = self.next_sequence;
        let source = Arc::clone(&self.source);

        tracing::info!(sequence, reason, "Fetching menu");
        self.fetches
            .spawn(async move { (sequence, source.fetch_menu().await) });
    }

    fn apply(&mut self, sequence: u64, result: Result<MenuDocuments, ContentError>) {
        if sequence <= self.applied_sequence {
            tracing::debug!(
                sequence,
                applied = self.applied_sequence,
                "Discarding stale fetch result",
            );
            return;
        }
        self.is_loading = false;

        match result {
            Ok(documents) => {
                let snapshot = MenuSnapshot::new(documents, sequence);
                if !snapshot.has_active_board() {
                    tracing::warn!(sequence, "No active board configured");
                }
                tracing::info!(
                    sequence,
                    screens = snapshot.secondary_screens.len(),
                    "Menu data updated",
                );
                self.snapshot = Some(Arc::new(snapshot));
                self.applied_sequence = sequence;
                self.fetch_error = None;
            }
            Err(e) => {
                tracing::error!(sequence, error = %e, "Failed to fetch menu data");
                self.fetch_error = Some(e.to_string());
            }
        }
        self.publish();
    }

    fn publish(&self) {
        let error = self.fetch_error.clone().or_else(|| {
            self.listener_down
                .then(|| CONNECTION_LOST_MESSAGE.to_string())
        });

        self.data_tx.send_replace(MenuData {
            snapshot: self.snapshot.clone(),
            is_loading: self.is_loading,
            error,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(value: serde_json::Value) -> Arc<MenuSnapshot> {
        Arc::new(MenuSnapshot::new(serde_json::from_value(value).unwrap(), 1))
    }

    #[test]
    fn loading_until_first_resolution() {
        assert_eq!(MenuData::default().status(), MenuStatus::Loading);
    }

    #[test]
    fn failure_without_snapshot_is_an_error_state() {
        let data = MenuData {
            snapshot: None,
            is_loading: false,
            error: Some("HTTP request failed".into()),
        };
        assert_eq!(
            data.status(),
            MenuStatus::Failed {
                message: "HTTP request failed".into()
            }
        );
    }

    #[test]
    fn missing_board_is_not_configured() {
        let data = MenuData {
            snapshot: Some(snapshot(json!({ "settings": { "activeBoard": null } }))),
            is_loading: false,
            error: None,
        };
        assert_eq!(data.status(), MenuStatus::NotConfigured { advisory: None });

        let data = MenuData {
            snapshot: Some(snapshot(json!({ "settings": null }))),
            ..data
        };
        assert_eq!(data.status(), MenuStatus::NotConfigured { advisory: None });
    }

    #[test]
    fn snapshot_with_error_degrades_to_advisory() {
        let data = MenuData {
            snapshot: Some(snapshot(json!({
                "settings": { "activeBoard": { "title": "Main", "sections": [] } }
            }))),
            is_loading: false,
            error: Some(CONNECTION_LOST_MESSAGE.into()),
        };
        assert_eq!(
            data.status(),
            MenuStatus::Ready {
                advisory: Some(CONNECTION_LOST_MESSAGE.into())
            }
        );
        assert_eq!(data.sequence(), Some(1));
    }
}
