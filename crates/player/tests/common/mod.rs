#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use futures::channel::mpsc as stream_mpsc;
use futures::StreamExt;
use http_body_util::BodyExt;
use menuboard_content::error::ContentError;
use menuboard_content::listener::ChangeStream;
use menuboard_content::messages::{ChangeNotification, ListenerEvent, Transition};
use menuboard_content::reconnect::ReconnectConfig;
use menuboard_content::source::ContentSource;
use menuboard_core::model::MenuDocuments;
use menuboard_player::config::PlayerConfig;
use menuboard_player::controller::{ControllerConfig, PlayerController, PlayerHandle};
use menuboard_player::router::build_app_router;
use menuboard_player::state::AppState;
use menuboard_player::sync::{MenuData, MenuSynchronizer, SyncConfig};
use serde_json::{json, Value};
use tokio::sync::watch;
use tower::ServiceExt;

pub type EventSender = stream_mpsc::UnboundedSender<Result<ListenerEvent, ContentError>>;

// ---------------------------------------------------------------------------
// Fake content source
// ---------------------------------------------------------------------------

struct ScriptedFetch {
    delay: Duration,
    result: Result<MenuDocuments, ContentError>,
}

/// In-memory [`ContentSource`] with scripted fetch results and
/// test-controlled change streams.
///
/// Fetches pop scripted results in order and fall back to the current
/// default documents. Listens pop scripted connections; once those run
/// out they open a stream that never yields.
pub struct FakeSource {
    fetches: Mutex<VecDeque<ScriptedFetch>>,
    documents: Mutex<MenuDocuments>,
    connections: Mutex<VecDeque<Result<ChangeStream, ContentError>>>,
    pub fetch_count: AtomicUsize,
    pub listen_count: AtomicUsize,
}

impl FakeSource {
    pub fn new(documents: MenuDocuments) -> Arc<Self> {
        Arc::new(Self {
            fetches: Mutex::new(VecDeque::new()),
            documents: Mutex::new(documents),
            connections: Mutex::new(VecDeque::new()),
            fetch_count: AtomicUsize::new(0),
            listen_count: AtomicUsize::new(0),
        })
    }

    /// Queue one fetch result, returned after `delay`.
    pub fn script_fetch(&self, delay: Duration, result: Result<MenuDocuments, ContentError>) {
        self.fetches
            .lock()
            .unwrap()
            .push_back(ScriptedFetch { delay, result });
    }

    /// Replace what unscripted fetches return.
    pub fn set_documents(&self, documents: MenuDocuments) {
        *self.documents.lock().unwrap() = documents;
    }

    /// Queue a change stream; events sent on the returned handle are
    /// delivered to the listener. Dropping it ends the stream.
    pub fn script_connection(&self) -> EventSender {
        let (tx, rx) = stream_mpsc::unbounded();
        self.connections.lock().unwrap().push_back(Ok(rx.boxed()));
        tx
    }

    pub fn script_connection_failure(&self, error: ContentError) {
        self.connections.lock().unwrap().push_back(Err(error));
    }

    pub fn fetches(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    pub fn listens(&self) -> usize {
        self.listen_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentSource for FakeSource {
    async fn fetch_menu(&self) -> Result<MenuDocuments, ContentError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        let scripted = self.fetches.lock().unwrap().pop_front();
        match scripted {
            Some(fetch) => {
                tokio::time::sleep(fetch.delay).await;
                fetch.result
            }
            None => Ok(self.documents.lock().unwrap().clone()),
        }
    }

    async fn listen(&self) -> Result<ChangeStream, ContentError> {
        self.listen_count.fetch_add(1, Ordering::SeqCst);
        let scripted = self.connections.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(futures::stream::pending().boxed()))
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A board with one food section, one drinks section linked to a
/// secondary screen, and two secondary screens.
pub fn menu_json(title: &str) -> Value {
    json!({
        "settings": {
            "announcementBar": "Happy hour 4-6",
            "ignoreStockLevels": false,
            "defaultTimeoutSeconds": 10,
            "activeBoard": {
                "title": title,
                "sections": [
                    {
                        "heading": "Toasties",
                        "metaCategory": "eat-me",
                        "items": [
                            { "_id": "toastie", "title": "Cheese Toastie", "price": 4.25, "isAvailable": true }
                        ]
                    },
                    {
                        "heading": "Coffee",
                        "metaCategory": "drink-me",
                        "items": [
                            {
                                "_id": "latte",
                                "title": "Latte",
                                "price": 4.5,
                                "isAvailable": false,
                                "linkedSecondaryScreen": { "_id": "coffee-info", "title": "Our Coffee", "triggerKey": "c" }
                            }
                        ]
                    }
                ]
            }
        },
        "secondaryScreens": [
            { "_id": "coffee-info", "title": "Our Coffee", "triggerKey": "c", "timeoutSeconds": 5 },
            { "_id": "specials", "title": "Specials", "triggerKey": "S" }
        ]
    })
}

pub fn menu_docs(title: &str) -> MenuDocuments {
    serde_json::from_value(menu_json(title)).unwrap()
}

pub fn documents(value: Value) -> MenuDocuments {
    serde_json::from_value(value).unwrap()
}

pub fn change(document_id: &str) -> Result<ListenerEvent, ContentError> {
    Ok(ListenerEvent::Mutation(ChangeNotification {
        document_id: document_id.to_string(),
        transaction_id: None,
        transition: Transition::Update,
    }))
}

pub fn sync_config() -> SyncConfig {
    SyncConfig {
        debounce: Duration::from_millis(500),
        reconnect: ReconnectConfig::default(),
    }
}

pub fn board_title(data: &MenuData) -> Option<String> {
    data.snapshot
        .as_ref()
        .and_then(|s| s.board.as_ref())
        .map(|b| b.title.clone())
}

/// Wait (in paused time) until the published menu data satisfies `pred`.
pub async fn wait_for_menu(
    rx: &mut watch::Receiver<MenuData>,
    pred: impl FnMut(&MenuData) -> bool,
) -> MenuData {
    tokio::time::timeout(Duration::from_secs(120), rx.wait_for(pred))
        .await
        .expect("timed out waiting for menu data")
        .expect("synchronizer dropped")
        .clone()
}

// ---------------------------------------------------------------------------
// App harness
// ---------------------------------------------------------------------------

/// Build a test `PlayerConfig` with safe defaults.
pub fn test_config() -> PlayerConfig {
    PlayerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        project_id: "test".to_string(),
        dataset: "production".to_string(),
        api_version: "2023-05-03".to_string(),
        token: None,
        api_host: None,
        refetch_debounce_ms: 500,
        default_timeout_secs: 30,
    }
}

pub struct TestApp {
    pub router: Router,
    pub source: Arc<FakeSource>,
    pub sync: Arc<MenuSynchronizer>,
    pub player: PlayerHandle,
}

/// Start a synchronizer and controller over `documents` and wire them
/// into the production router. Returns once the first menu is loaded.
pub async fn build_test_app(documents: MenuDocuments) -> TestApp {
    let config = test_config();
    let source = FakeSource::new(documents);
    let sync = Arc::new(MenuSynchronizer::new(source.clone(), sync_config()));
    sync.start().await;

    let mut rx = sync.subscribe();
    wait_for_menu(&mut rx, |d| !d.is_loading).await;

    let player = PlayerController::spawn(sync.subscribe(), ControllerConfig::default());
    let state = AppState {
        config: Arc::new(config.clone()),
        sync: Arc::clone(&sync),
        player: player.clone(),
    };

    TestApp {
        router: build_app_router(state, &config),
        source,
        sync,
        player,
    }
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn post(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
