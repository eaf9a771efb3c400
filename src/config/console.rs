use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_LISTEN_PORT: u16 = 3000;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Base URL of the strategy backend
    pub backend_url: String,
    pub listen_port: u16,
    /// Dashboard refresh period
    pub poll_interval_secs: u64,
    /// Unset means the HTTP stack's own default
    pub request_timeout_secs: Option<u64>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            listen_port: DEFAULT_LISTEN_PORT,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            request_timeout_secs: None,
        }
    }
}

impl ConsoleConfig {
    /// Reads `path` if it exists, then applies `CONSOLE_*` environment
    /// overrides (e.g. `CONSOLE_BACKEND_URL`).
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::from(Path::new(path)).required(false))
            .add_source(config::Environment::with_prefix("CONSOLE").try_parsing(true));

        let loaded: ConsoleConfig = builder.build()?.try_deserialize()?;
        if let Err(errors) = loaded.validate() {
            anyhow::bail!("invalid configuration: {}", errors.join(", "));
        }
        Ok(loaded)
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.backend_url.trim().is_empty() {
            errors.push("backend_url must not be empty".to_string());
        } else if !self.backend_url.starts_with("http://") && !self.backend_url.starts_with("https://") {
            errors.push("backend_url must start with http:// or https://".to_string());
        }
        if self.poll_interval_secs == 0 {
            errors.push("poll_interval_secs must be > 0".to_string());
        }
        if self.request_timeout_secs == Some(0) {
            errors.push("request_timeout_secs must be > 0 when set".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
