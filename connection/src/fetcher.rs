//! HTTP fetching of node crawl endpoints.

use crate::address::NodeAddress;
use crate::error::FetchError;
use log::debug;
use std::time::Duration;
use tokio::time::timeout;

/// Default timeout for a single crawl request.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(3);

/// Default user agent for crawl requests.
pub fn default_user_agent() -> String {
    format!("xrpl-peers/{}", env!("CARGO_PKG_VERSION"))
}

/// Configuration of crawl requests.
#[derive(Debug, Clone)]
pub struct FetchConfiguration {
    /// Upper bound for the whole request, including reading the body.
    pub timeout: Duration,
    /// Skip TLS certificate validation.
    ///
    /// XRP Ledger nodes serve the crawl endpoint on their peer port with
    /// self-signed certificates, so crawling the real network requires this.
    /// It is never enabled implicitly.
    pub insecure_transport: bool,
    /// User agent sent with each request.
    pub user_agent: String,
}

impl Default for FetchConfiguration {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_FETCH_TIMEOUT,
            insecure_transport: false,
            user_agent: default_user_agent(),
        }
    }
}

/// Fetches raw crawl documents over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Create a fetcher with the given configuration.
    ///
    /// # Returns
    ///
    /// * `Ok(HttpFetcher)` - A fetcher sharing one connection pool.
    /// * `Err(FetchError::ClientBuild)` - If the TLS backend could not be initialized.
    pub fn new(config: &FetchConfiguration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.insecure_transport)
            .connect_timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(FetchError::ClientBuild)?;

        Ok(Self {
            client,
            timeout: config.timeout,
        })
    }

    /// Fetch the crawl document of a node.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The response body.
    /// * `Err(FetchError)` - On timeout, connection or TLS failure, or a non-success status.
    pub async fn fetch(&self, address: &NodeAddress) -> Result<String, FetchError> {
        self.fetch_url(&address.url()).await
    }

    /// Fetch an arbitrary URL with the crawl timeout applied.
    pub async fn fetch_url(&self, url: &str) -> Result<String, FetchError> {
        debug!("Fetching {url}");

        let request = async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(FetchError::Request)?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status(status));
            }

            response.text().await.map_err(FetchError::Request)
        };

        match timeout(self.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve a single canned HTTP response on a local port.
    async fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}/crawl")
    }

    fn fetcher(timeout: Duration) -> HttpFetcher {
        HttpFetcher::new(&FetchConfiguration {
            timeout,
            ..FetchConfiguration::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{}",
        )
        .await;

        let body = fetcher(Duration::from_secs(2)).fetch_url(&url).await.unwrap();
        assert_eq!(body, "{}");
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let url = serve_once(
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;

        let result = fetcher(Duration::from_secs(2)).fetch_url(&url).await;
        match result {
            Err(FetchError::Status(status)) => assert_eq!(status.as_u16(), 503),
            other => panic!("Expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        // Accept the connection but never answer.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            std::future::pending::<()>().await;
        });

        let result = fetcher(Duration::from_millis(200))
            .fetch_url(&format!("http://{addr}/crawl"))
            .await;
        assert!(matches!(result, Err(FetchError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // Bind then drop to get a port nobody listens on.
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };

        let result = fetcher(Duration::from_secs(2))
            .fetch_url(&format!("http://{addr}/crawl"))
            .await;
        assert!(matches!(result, Err(FetchError::Request(_))));
    }

    #[test]
    fn test_insecure_transport_is_opt_in() {
        assert!(!FetchConfiguration::default().insecure_transport);
        assert_eq!(FetchConfiguration::default().timeout, Duration::from_secs(3));
    }
}
