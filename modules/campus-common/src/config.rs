use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::{info, warn};

pub const DEFAULT_BASE_URL: &str = "https://www.philosophie.lmu.de";

/// The "load more" affordance on paginated listings.
pub const DEFAULT_REVEAL_SELECTOR: &str = "button.c-load-more, .js-load-more";

/// Application configuration loaded from environment variables.
/// Every value has a default; nothing is required to run a sync pass.
#[derive(Debug, Clone)]
pub struct Config {
    // Source site
    pub base_url: String,

    // Persistence
    pub data_dir: PathBuf,

    // Fetching
    pub fetch_retries: u32,
    pub fetch_timeout: Duration,
    pub fetch_concurrency: usize,
    pub force_encoding: String,

    // Interactive listings
    pub browser_ws: Option<String>,
    pub chrome_bin: String,
    pub reveal_selector: String,
    pub reveal_settle: Duration,
    pub reveal_max_clicks: u32,

    // Query API
    pub api_host: String,
    pub api_port: u16,
    pub graph_reload_interval: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            base_url: env::var("CAMPUS_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            data_dir: PathBuf::from(env::var("CAMPUS_DATA_DIR").unwrap_or_else(|_| "data".into())),
            fetch_retries: parsed_env("CAMPUS_FETCH_RETRIES", 3),
            fetch_timeout: Duration::from_secs(parsed_env("CAMPUS_FETCH_TIMEOUT_SECS", 30)),
            fetch_concurrency: parsed_env::<usize>("CAMPUS_FETCH_CONCURRENCY", 6).max(1),
            force_encoding: env::var("CAMPUS_FORCE_ENCODING").unwrap_or_else(|_| "utf-8".into()),
            browser_ws: env::var("CAMPUS_BROWSER_WS").ok().filter(|v| !v.is_empty()),
            chrome_bin: env::var("CHROME_BIN").unwrap_or_else(|_| "chromium".into()),
            reveal_selector: env::var("CAMPUS_REVEAL_SELECTOR")
                .unwrap_or_else(|_| DEFAULT_REVEAL_SELECTOR.into()),
            reveal_settle: Duration::from_millis(parsed_env("CAMPUS_REVEAL_SETTLE_MS", 1500)),
            reveal_max_clicks: parsed_env("CAMPUS_REVEAL_MAX_CLICKS", 50),
            api_host: env::var("CAMPUS_API_HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            api_port: parsed_env("CAMPUS_API_PORT", 3000),
            graph_reload_interval: Duration::from_secs(parsed_env("CAMPUS_GRAPH_RELOAD_SECS", 60)),
        }
    }

    pub fn graph_dir(&self) -> PathBuf {
        self.data_dir.join("graph")
    }

    /// Log the effective configuration. The browser endpoint may carry a token.
    pub fn log_summary(&self) {
        info!(
            base_url = self.base_url.as_str(),
            data_dir = %self.data_dir.display(),
            retries = self.fetch_retries,
            timeout_secs = self.fetch_timeout.as_secs(),
            concurrency = self.fetch_concurrency,
            encoding = self.force_encoding.as_str(),
            browser = if self.browser_ws.is_some() { "remote" } else { "local" },
            "Configuration loaded"
        );
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            data_dir: PathBuf::from("data"),
            fetch_retries: 3,
            fetch_timeout: Duration::from_secs(30),
            fetch_concurrency: 6,
            force_encoding: "utf-8".into(),
            browser_ws: None,
            chrome_bin: "chromium".into(),
            reveal_selector: DEFAULT_REVEAL_SELECTOR.into(),
            reveal_settle: Duration::from_millis(1500),
            reveal_max_clicks: 50,
            api_host: "127.0.0.1".into(),
            api_port: 3000,
            graph_reload_interval: Duration::from_secs(60),
        }
    }
}

fn parsed_env<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = raw.as_str(), default = %default, "Unparseable value, using default");
            default
        }),
        Err(_) => default,
    }
}
