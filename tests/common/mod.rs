//! Common Test Utilities
//!
//! Servers wired to a shared in-process broker, scripted chat clients and
//! an HTTP test app.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, http::Request, Router};
use futures::channel::mpsc as frame_channel;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tower::ServiceExt;

use webchat::application::{build_server, Server, Session};
use webchat::config::Settings;
use webchat::domain::Message;
use webchat::infrastructure::relay::{MemoryBroker, ReconnectPolicy, Topology};
use webchat::presentation::http::routes;
use webchat::startup::{AppState, Application};

/// How long a client waits for an expected message.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// How long a client waits before concluding nothing is coming.
pub const QUIET_PERIOD: Duration = Duration::from_millis(150);

/// Settings for tests: no rate gate, nothing bound. `extra` is appended
/// after the general section.
pub fn test_settings(extra: &str) -> Settings {
    test_settings_with("message_interval_ms = 0", extra)
}

/// Settings with extra keys for `[chat.general]`.
pub fn test_settings_with(general: &str, extra: &str) -> Settings {
    let document = format!(
        r#"
        [server]
        host = "127.0.0.1"
        port = 0

        [chat.general]
        name = "TestChat"
        motd = "Welcome!"
        {general}

        {extra}
        "#
    );
    Settings::from_toml(&document).expect("test settings must parse")
}

/// Chat servers sharing one broker, like instances behind a load balancer.
#[derive(Default)]
pub struct TestCluster {
    pub broker: MemoryBroker,
}

impl TestCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect an already built server as instance `instance`.
    pub async fn attach(&self, instance: &str, server: &Arc<Server>) {
        server
            .connect(
                Arc::new(self.broker.clone()),
                Topology::new("chat", instance),
                ReconnectPolicy {
                    attempts: 5,
                    delay: Duration::from_millis(10),
                },
            )
            .await
            .expect("server must connect");
    }

    /// Build and connect a server from settings.
    pub async fn server(&self, instance: &str, settings: &Settings) -> Arc<Server> {
        let server = build_server(&settings.chat);
        self.attach(instance, &server).await;
        server
    }
}

/// A session driven by a script instead of a websocket.
pub struct TestClient {
    pub session: Arc<Session>,
    inbox: mpsc::UnboundedReceiver<Message>,
    frames: frame_channel::UnboundedSender<String>,
    read_loop: JoinHandle<()>,
}

impl TestClient {
    /// Seat a session named `name` and start its read loop.
    pub async fn connect(server: &Arc<Server>, name: &str) -> Self {
        let (tx, inbox) = mpsc::unbounded_channel();
        let session = server
            .accept_named(name, tx)
            .await
            .expect("server must accept");
        let (frames, frame_stream) = frame_channel::unbounded();
        let read_loop = tokio::spawn(Arc::clone(&session).watch(frame_stream));
        Self {
            session,
            inbox,
            frames,
            read_loop,
        }
    }

    /// Seat a session and skip the greeting and its own join notice.
    pub async fn connect_quietly(server: &Arc<Server>, name: &str) -> Self {
        let mut client = Self::connect(server, name).await;
        client.recv().await;
        client
            .recv_until(|m| m.data == format!("{name} joined the channel"))
            .await;
        client
    }

    pub fn name(&self) -> &str {
        self.session.name()
    }

    /// Send one text frame.
    pub fn say(&self, text: &str) {
        self.frames
            .unbounded_send(text.to_string())
            .expect("read loop must be running");
    }

    /// Next message, failing the test after [`RECV_TIMEOUT`].
    pub async fn recv(&mut self) -> Message {
        tokio::time::timeout(RECV_TIMEOUT, self.inbox.recv())
            .await
            .expect("timed out waiting for a message")
            .expect("outbound queue closed")
    }

    /// Skip messages until one matches.
    pub async fn recv_until(&mut self, mut predicate: impl FnMut(&Message) -> bool) -> Message {
        loop {
            let message = self.recv().await;
            if predicate(&message) {
                return message;
            }
        }
    }

    /// Assert nothing arrives within [`QUIET_PERIOD`].
    pub async fn assert_quiet(&mut self) {
        if let Ok(Some(message)) = tokio::time::timeout(QUIET_PERIOD, self.inbox.recv()).await {
            panic!("{} received unexpected {:?}", self.name(), message);
        }
    }

    /// End the frame stream and wait for the read loop to finish.
    pub async fn disconnect(self) {
        let Self {
            frames, read_loop, ..
        } = self;
        drop(frames);
        read_loop.await.expect("read loop must not panic");
    }
}

/// HTTP test application
pub struct TestApp {
    pub router: Router,
    pub server: Arc<Server>,
}

impl TestApp {
    /// Router over a server that is connected to a fresh broker.
    pub async fn connected() -> Self {
        let settings = test_settings("");
        let cluster = TestCluster::new();
        let server = cluster.server("http", &settings).await;
        Self::with_server(settings, server)
    }

    /// Router over a server that never connected to a broker.
    pub fn disconnected() -> Self {
        let settings = test_settings("");
        let server = build_server(&settings.chat);
        Self::with_server(settings, server)
    }

    fn with_server(settings: Settings, server: Arc<Server>) -> Self {
        let router = routes::create_router(AppState {
            server: Arc::clone(&server),
            settings: Arc::new(settings),
        });
        Self { router, server }
    }

    /// Make a GET request to the application
    pub async fn get(&self, uri: &str) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }
}

/// Read a response body as JSON
pub async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Serve a full application on an ephemeral port.
pub async fn spawn_app(broker: &MemoryBroker) -> (SocketAddr, Arc<Server>) {
    let application = Application::build_with_broker(test_settings(""), Arc::new(broker.clone()))
        .await
        .expect("application must build");
    let addr = application.local_addr().unwrap();
    let server = application.server();
    tokio::spawn(application.run_until_stopped());
    (addr, server)
}
