use std::time::Duration;

use futures::future::BoxFuture;

use paddock_core::{GameError, RaceSnapshot, SnapshotSource};

use crate::config::LiveTimingConfig;
use crate::scan::{scan_classification, strip_tags};

/// Samples the live-timing dashboard over HTTP.
pub struct LiveTimingSource {
    config: LiveTimingConfig,
    client: reqwest::Client,
}

impl LiveTimingSource {
    pub fn new(config: LiveTimingConfig) -> Result<Self, GameError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GameError::source_unavailable(format!("HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &LiveTimingConfig {
        &self.config
    }

    async fn fetch_page(&self) -> Result<String, GameError> {
        let resp = self
            .client
            .get(&self.config.url)
            .send()
            .await
            .map_err(|e| GameError::source_unavailable(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(GameError::source_unavailable(format!(
                "dashboard returned {}",
                resp.status()
            )));
        }
        resp.text()
            .await
            .map_err(|e| GameError::source_unavailable(e.to_string()))
    }

    async fn sample(&self, detect_dnf: bool) -> Result<RaceSnapshot, GameError> {
        let html = self.fetch_page().await?;
        let text = strip_tags(&html);
        let snapshot = scan_classification(&text, detect_dnf, &self.config)?;
        tracing::info!(
            url = %self.config.url,
            classified = snapshot.positions().len(),
            retired = snapshot.dnf_count(),
            "Dashboard sampled"
        );
        Ok(snapshot)
    }
}

impl SnapshotSource for LiveTimingSource {
    fn fetch_snapshot(&self, detect_dnf: bool) -> BoxFuture<'_, Result<RaceSnapshot, GameError>> {
        Box::pin(self.sample(detect_dnf))
    }

    fn name(&self) -> &str {
        "live-timing"
    }
}
