//! Printer adapters for sending ESC/POS data
//!
//! The service never talks to a thermal printer directly. Jobs go to a
//! print bridge running next to the printer, which accepts the raw document
//! over HTTP.

use crate::error::{PrintError, PrintResult};
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Where the bridge listens unless configured otherwise
pub const DEFAULT_BRIDGE_URL: &str = "http://localhost:8080/print";

/// Trait for printer adapters
#[allow(async_fn_in_trait)]
pub trait Printer {
    /// Send raw ESC/POS data to the printer
    async fn print(&self, data: &[u8]) -> PrintResult<()>;

    /// Check if the printer is online/reachable
    async fn is_online(&self) -> bool;
}

/// HTTP print bridge (`POST` of the raw document)
#[derive(Debug, Clone)]
pub struct BridgePrinter {
    client: reqwest::Client,
    url: reqwest::Url,
    timeout: Duration,
}

impl BridgePrinter {
    pub fn new(url: &str) -> PrintResult<Self> {
        let url = reqwest::Url::parse(url)
            .map_err(|e| PrintError::InvalidConfig(format!("Invalid bridge URL {url}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(PrintError::InvalidConfig(format!(
                "Unsupported bridge URL scheme: {}",
                url.scheme()
            )));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            url,
            timeout: Duration::from_secs(5),
        })
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }
}

impl Printer for BridgePrinter {
    #[instrument(skip(self, data), fields(url = %self.url, data_len = data.len()))]
    async fn print(&self, data: &[u8]) -> PrintResult<()> {
        let response = self
            .client
            .post(self.url.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .timeout(self.timeout)
            .body(data.to_vec())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PrintError::Timeout(format!("{}: {}", self.url, e))
                } else {
                    PrintError::Connection(format!("{}: {}", self.url, e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Print bridge rejected job");
            return Err(PrintError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        info!("Print job sent successfully");
        Ok(())
    }

    #[instrument(skip(self), fields(url = %self.url))]
    async fn is_online(&self) -> bool {
        // Any HTTP answer means the bridge is up, even 404/405
        match self
            .client
            .get(self.url.clone())
            .timeout(Duration::from_millis(500))
            .send()
            .await
        {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Print bridge offline");
                false
            }
        }
    }
}
