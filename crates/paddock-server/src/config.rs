use std::path::PathBuf;

use serde::Deserialize;

use paddock_core::roster::DEFAULT_MAX_PLAYERS;
use paddock_livetiming::LiveTimingConfig;

/// Top-level server configuration, loaded from `paddock.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub game: GameSection,
    pub live_timing: LiveTimingConfig,
    pub export: ExportConfig,
    pub refresh: RefreshConfig,
    pub http: HttpConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            game: GameSection::default(),
            live_timing: LiveTimingConfig::default(),
            export: ExportConfig::default(),
            refresh: RefreshConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

/// Game rules fixed at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameSection {
    pub max_players: usize,
    /// Seed for driver assignment. Unset means seeded from the OS.
    pub seed: Option<u64>,
}

impl Default for GameSection {
    fn default() -> Self {
        Self {
            max_players: DEFAULT_MAX_PLAYERS,
            seed: None,
        }
    }
}

/// Backup CSV files written after each applied snapshot.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub enabled: bool,
    pub dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from("backups"),
        }
    }
}

/// Background refresh while the race is live.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Seconds between automatic refreshes. 0 disables them.
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub request_timeout_secs: u64,
    pub allow_any_origin: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            allow_any_origin: true,
        }
    }
}

impl ServerConfig {
    /// Validate configuration, exiting on values the server cannot run with.
    pub fn validate(&self) {
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            tracing::error!(
                addr = %self.listen_addr,
                "listen_addr is not a valid socket address"
            );
            std::process::exit(1);
        }
        if self.game.max_players == 0 {
            tracing::error!("game.max_players must be > 0");
            std::process::exit(1);
        }
        if self.game.max_players * 2 > paddock_core::driver::DRIVER_COUNT {
            tracing::warn!(
                max_players = self.game.max_players,
                "More players allowed than drivers can be assigned; late joins will fail"
            );
        }
        if self.live_timing.timeout_secs == 0 {
            tracing::error!("live_timing.timeout_secs must be > 0");
            std::process::exit(1);
        }
        if self.live_timing.max_drivers == 0 {
            tracing::error!("live_timing.max_drivers must be > 0");
            std::process::exit(1);
        }
        if self.http.request_timeout_secs == 0 {
            tracing::error!("http.request_timeout_secs must be > 0");
            std::process::exit(1);
        }
        if self.refresh.interval_secs > 0
            && self.refresh.interval_secs < self.live_timing.timeout_secs
        {
            tracing::warn!(
                interval = self.refresh.interval_secs,
                timeout = self.live_timing.timeout_secs,
                "Refresh interval is shorter than the fetch timeout; ticks may be skipped"
            );
        }
    }

    /// Load config from `paddock.toml` if it exists, then apply env var overrides.
    pub fn load() -> Self {
        let path = std::env::var("PADDOCK_CONFIG").unwrap_or_else(|_| "paddock.toml".to_string());
        let mut config = match std::fs::read_to_string(&path) {
            Ok(content) => match toml::from_str::<ServerConfig>(&content) {
                Ok(cfg) => {
                    tracing::info!(path = %path, "Loaded configuration");
                    cfg
                },
                Err(e) => {
                    tracing::warn!(path = %path, "Failed to parse config: {e}, using defaults");
                    ServerConfig::default()
                },
            },
            Err(_) => {
                tracing::info!(path = %path, "No config file found, using defaults");
                ServerConfig::default()
            },
        };

        if let Ok(addr) = std::env::var("PADDOCK_LISTEN_ADDR")
            && !addr.is_empty()
        {
            config.listen_addr = addr;
        }
        if let Ok(url) = std::env::var("PADDOCK_LIVE_TIMING_URL")
            && !url.is_empty()
        {
            config.live_timing.url = url;
        }
        if let Ok(dir) = std::env::var("PADDOCK_EXPORT_DIR")
            && !dir.is_empty()
        {
            config.export.dir = PathBuf::from(dir);
        }
        if let Ok(val) = std::env::var("PADDOCK_SEED")
            && let Ok(seed) = val.parse::<u64>()
        {
            config.game.seed = Some(seed);
        }
        if let Ok(val) = std::env::var("PADDOCK_REFRESH_INTERVAL_SECS")
            && let Ok(secs) = val.parse::<u64>()
        {
            config.refresh.interval_secs = secs;
        }

        config
    }
}
