use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub probe: ProbeConfig,
    #[serde(default)]
    pub polling: PollingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    /// Gateway health endpoint, e.g. `http://gateway.internal/api/health`.
    pub url: String,
    #[serde(default = "default_probe_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_probe_timeout_ms() -> u64 {
    5000
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Snapshots kept in memory (newest first).
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Max state updates buffered per /ws/health client (slow clients may lag).
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
    /// Start polling at boot and keep it running until shutdown.
    #[serde(default = "default_autostart")]
    pub autostart: bool,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            history_capacity: default_history_capacity(),
            broadcast_capacity: default_broadcast_capacity(),
            autostart: default_autostart(),
        }
    }
}

fn default_interval_secs() -> u64 {
    30
}

fn default_history_capacity() -> usize {
    24
}

fn default_broadcast_capacity() -> usize {
    16
}

fn default_autostart() -> bool {
    true
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.probe.url.trim().is_empty(),
            "probe.url must be non-empty"
        );
        anyhow::ensure!(
            self.probe.url.starts_with("http://") || self.probe.url.starts_with("https://"),
            "probe.url must be an http(s) URL, got {}",
            self.probe.url
        );
        anyhow::ensure!(
            self.probe.timeout_ms > 0,
            "probe.timeout_ms must be > 0, got {}",
            self.probe.timeout_ms
        );
        anyhow::ensure!(
            self.polling.interval_secs > 0,
            "polling.interval_secs must be > 0, got {}",
            self.polling.interval_secs
        );
        anyhow::ensure!(
            self.polling.history_capacity > 0,
            "polling.history_capacity must be > 0, got {}",
            self.polling.history_capacity
        );
        anyhow::ensure!(
            self.polling.broadcast_capacity > 0,
            "polling.broadcast_capacity must be > 0, got {}",
            self.polling.broadcast_capacity
        );
        Ok(())
    }
}
