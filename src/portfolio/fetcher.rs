use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::parser::extract_holdings;
use super::types::FetchedHoldings;
use crate::cache::{CacheConfig, CacheManager};
use crate::errors::{OverlapError, Result};
use crate::utils::Config;

/// Retrieves the raw HTML of a fund page
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn get_page(&self, url: &str) -> Result<String>;
}

/// `PageSource` backed by a reqwest client
pub struct HttpPageSource {
    client: Client,
}

impl HttpPageSource {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| OverlapError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn get_page(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| OverlapError::fetch(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(OverlapError::fetch(url, format!("HTTP {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| OverlapError::fetch(url, format!("failed to read body: {}", e)))
    }
}

/// Fetches current fund holdings, memoized per URL for the session
pub struct HoldingsFetcher {
    source: Arc<dyn PageSource>,
    cache: CacheManager,
}

impl HoldingsFetcher {
    pub fn new(source: Arc<dyn PageSource>, cache: CacheManager) -> Self {
        Self { source, cache }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let source = HttpPageSource::new(&config.user_agent, Duration::from_secs(config.fetch_timeout_secs))?;
        let cache = CacheManager::new(CacheConfig {
            holdings_ttl: Duration::from_secs(config.cache_ttl_secs),
            max_capacity: config.cache_capacity,
        });

        Ok(Self::new(Arc::new(source), cache))
    }

    /// Fetch the holdings listed on the page at `url`, in document order.
    ///
    /// Fails with `Fetch` on transport errors or non-2xx responses and with
    /// `Schema` when the page lacks the holdings table. Only successful
    /// results are cached.
    pub async fn fetch(&self, url: &str) -> Result<Vec<String>> {
        self.fetch_timed(url).await.map(|fetched| fetched.holdings)
    }

    /// Like `fetch`, but also returns when the page was downloaded. Cache hits
    /// report the time of the original download.
    pub async fn fetch_timed(&self, url: &str) -> Result<FetchedHoldings> {
        self.cache
            .get_or_fetch_holdings(url, || async {
                info!("Fetching holdings from {}", url);
                let html = self.source.get_page(url).await?;
                extract_holdings(url, &html)
            })
            .await
    }

    /// Like `fetch_timed`, but downgrades per-fund failures to empty holdings
    /// with no fetch time.
    ///
    /// The recoverable error is handed back alongside so callers can surface it.
    pub async fn fetch_or_empty(&self, url: &str) -> Result<(FetchedHoldings, Option<OverlapError>)> {
        match self.fetch_timed(url).await {
            Ok(fetched) => {
                debug!("{} holdings for {}", fetched.holdings.len(), url);
                Ok((fetched, None))
            }
            Err(e) if e.is_recoverable() => {
                warn!("{}", e);
                Ok((FetchedHoldings::default(), Some(e)))
            }
            Err(e) => Err(e),
        }
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve one canned HTTP response on a loopback port and hand back the raw request.
    async fn serve_once(response: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/fund/portfolio", listener.local_addr().unwrap());

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).to_lowercase()
        });

        (url, server)
    }

    #[tokio::test]
    async fn test_non_success_status_is_fetch_error() {
        let (url, server) =
            serve_once("HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").await;
        let source = HttpPageSource::new("Mozilla/5.0", Duration::from_secs(5)).unwrap();

        let err = source.get_page(&url).await.unwrap_err();

        assert!(matches!(err, OverlapError::Fetch { .. }));
        assert!(err.to_string().contains("404"));
        let request = server.await.unwrap();
        assert!(request.contains("user-agent: mozilla/5.0"));
    }

    #[tokio::test]
    async fn test_success_returns_body() {
        let (url, server) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 13\r\nConnection: close\r\n\r\n<html></html>",
        )
        .await;
        let source = HttpPageSource::new("Mozilla/5.0", Duration::from_secs(5)).unwrap();

        let body = source.get_page(&url).await.unwrap();

        assert_eq!(body, "<html></html>");
        assert!(server.await.unwrap().starts_with("get /fund/portfolio"));
    }
}
