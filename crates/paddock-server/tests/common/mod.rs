use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use paddock_core::source::SnapshotSource;
use paddock_core::test_helpers::ScriptedSource;

use paddock_server::config::{ExportConfig, GameSection, ServerConfig};
use paddock_server::{build_app_with_source, spawn_auto_refresh};

pub struct TestServer {
    pub addr: SocketAddr,
    pub source: Arc<ScriptedSource>,
    _shutdown: tokio::task::JoinHandle<()>,
}

/// Config with a fixed seed and backups turned off.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        game: GameSection {
            seed: Some(7),
            ..GameSection::default()
        },
        export: ExportConfig {
            enabled: false,
            ..ExportConfig::default()
        },
        ..ServerConfig::default()
    }
}

impl TestServer {
    /// Start a test server whose source fails until results are pushed.
    pub async fn new() -> Self {
        Self::with_source(test_config(), ScriptedSource::new()).await
    }

    /// Start a test server writing backups into `dir`.
    pub async fn with_export_dir(dir: PathBuf, source: ScriptedSource) -> Self {
        let mut config = test_config();
        config.export = ExportConfig { enabled: true, dir };
        Self::with_source(config, source).await
    }

    pub async fn with_source(config: ServerConfig, source: ScriptedSource) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let source = Arc::new(source);
        let (app, state) = build_app_with_source(config, Arc::clone(&source) as Arc<dyn SnapshotSource>);
        spawn_auto_refresh(state);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start accepting
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self {
            addr,
            source,
            _shutdown: handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.base_url())
    }

    pub async fn game(&self) -> serde_json::Value {
        reqwest::get(self.url("/game"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    /// Poll `GET /game` until `done` holds, panicking after about three seconds.
    pub async fn wait_for<F>(&self, done: F) -> serde_json::Value
    where
        F: Fn(&serde_json::Value) -> bool,
    {
        for _ in 0..150 {
            let game = self.game().await;
            if done(&game) {
                return game;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("condition not reached, last state: {}", self.game().await);
    }

    pub async fn add_player(&self, name: &str, dnf: u32, team: &str) -> reqwest::Response {
        reqwest::Client::new()
            .post(self.url("/players"))
            .json(&serde_json::json!({
                "name": name,
                "dnf_prediction": dnf,
                "team_prediction": team,
            }))
            .send()
            .await
            .unwrap()
    }

    pub async fn post(&self, path: &str) -> reqwest::Response {
        reqwest::Client::new()
            .post(self.url(path))
            .send()
            .await
            .unwrap()
    }
}

/// A fresh directory under the system temp dir.
pub fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "paddock-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
