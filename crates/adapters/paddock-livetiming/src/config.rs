use serde::{Deserialize, Serialize};

/// Configuration for the live-timing dashboard source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveTimingConfig {
    /// Dashboard page to sample.
    pub url: String,
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Classified drivers kept per snapshot.
    pub max_drivers: usize,
    /// Text that marks a retired driver in the dashboard.
    pub dnf_marker: String,
    /// Characters after the last driver searched for the marker.
    pub tail_window: usize,
}

impl Default for LiveTimingConfig {
    fn default() -> Self {
        Self {
            url: "https://f1-dash.com/dashboard".to_string(),
            timeout_secs: 30,
            user_agent: "paddock-livetiming/0.1".to_string(),
            max_drivers: 20,
            dnf_marker: "STOPPED".to_string(),
            tail_window: 200,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: LiveTimingConfig = toml::from_str("timeout_secs = 5").unwrap();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.max_drivers, 20);
        assert_eq!(config.dnf_marker, "STOPPED");
    }
}
