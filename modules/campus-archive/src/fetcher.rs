// Static page fetching over plain HTTP.

use std::time::Duration;

use async_trait::async_trait;
use campus_common::Config;
use encoding_rs::Encoding;
use rand::Rng;
use tracing::{info, warn};

use crate::error::FetchError;

/// Base backoff between attempts. Actual delay is base * 3^attempt + jitter.
const RETRY_BASE: Duration = Duration::from_millis(500);

/// Retrieves one raw document per URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// reqwest-backed fetcher with bounded retries and a forced text encoding.
///
/// The response body is always decoded with the configured encoding. The
/// server's declared charset is ignored: a mis-declared Latin-1 header on a
/// UTF-8 page silently mangles dashes and umlauts instead of failing.
pub struct HttpFetcher {
    client: reqwest::Client,
    encoding: &'static Encoding,
    max_attempts: u32,
    retry_base: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, max_attempts: u32, encoding_label: &str) -> Result<Self, FetchError> {
        let encoding = Encoding::for_label(encoding_label.trim().as_bytes())
            .ok_or_else(|| FetchError::Encoding(encoding_label.to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("campus-scout/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network {
                url: String::new(),
                message: e.to_string(),
            })?;

        info!(encoding = encoding.name(), max_attempts, "HttpFetcher initialized");

        Ok(Self {
            client,
            encoding,
            max_attempts: max_attempts.max(1),
            retry_base: RETRY_BASE,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        Self::new(config.fetch_timeout, config.fetch_retries, &config.force_encoding)
    }

    /// Override the retry backoff base (tests use zero).
    pub fn with_retry_base(mut self, base: Duration) -> Self {
        self.retry_base = base;
        self
    }

    async fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        Ok(decode_forced(self.encoding, &bytes, url))
    }

    async fn backoff(&self, attempt: u32) {
        if self.retry_base.is_zero() {
            return;
        }
        let backoff = self.retry_base * 3u32.pow(attempt);
        let jitter = Duration::from_millis(rand::rng().random_range(0..250));
        tokio::time::sleep(backoff + jitter).await;
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let parsed = url::Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }

        let mut attempt = 0;
        loop {
            match self.fetch_once(url).await {
                Ok(body) => {
                    info!(url, bytes = body.len(), "Fetched successfully");
                    return Ok(body);
                }
                Err(e) if e.is_transient() && attempt + 1 < self.max_attempts => {
                    warn!(url, attempt = attempt + 1, error = %e, "Fetch failed, retrying");
                    self.backoff(attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Decode with a fixed encoding, dropping a matching BOM. Malformed sequences
/// become U+FFFD and are logged rather than failing the page.
pub fn decode_forced(encoding: &'static Encoding, bytes: &[u8], url: &str) -> String {
    let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
    if had_errors {
        warn!(url, encoding = encoding.name(), "Malformed byte sequences replaced while decoding");
    }
    text.into_owned()
}
