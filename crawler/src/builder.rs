//! Builder pattern for configuring and creating crawler instances.

use crate::crawler::Crawler;
use crate::fetcher::NodeFetcher;
use crate::session::SessionConfig;
use std::fmt;
use std::time::Duration;
use xrpl_peers_connection::{
    FetchConfiguration, FetchError, HttpFetcher, DEFAULT_CRAWL_PORT, MAINNET_GENESIS_LEDGER,
};

/// Default maximum number of concurrent fetch tasks.
const DEFAULT_MAX_CONCURRENT_TASKS: usize = 8;

/// Errors that can occur during crawler configuration.
#[derive(Debug)]
pub enum CrawlerBuilderError {
    /// Genesis ledger index must be a non-empty decimal number.
    InvalidGenesisLedger(String),
    /// The HTTP client could not be created.
    HttpClient(FetchError),
}

impl fmt::Display for CrawlerBuilderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrawlerBuilderError::InvalidGenesisLedger(index) => {
                write!(f, "Invalid genesis ledger index: '{index}'")
            }
            CrawlerBuilderError::HttpClient(err) => write!(f, "HTTP client error: {err}"),
        }
    }
}

impl std::error::Error for CrawlerBuilderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CrawlerBuilderError::InvalidGenesisLedger(_) => None,
            CrawlerBuilderError::HttpClient(err) => Some(err),
        }
    }
}

/// Builder for creating a customized [`Crawler`] instance.
///
/// # Example
///
/// ```
/// # fn main() -> Result<(), xrpl_peers_crawler::CrawlerBuilderError> {
/// use std::time::Duration;
/// use xrpl_peers_crawler::CrawlerBuilder;
///
/// // Mainnet defaults, accepting the self-signed certificates nodes serve.
/// let crawler = CrawlerBuilder::new()
///     .with_insecure_transport(true)
///     .build()?;
///
/// // A test network with its own genesis ledger.
/// let custom_crawler = CrawlerBuilder::new()
///     .with_genesis_ledger("1")?
///     .with_fetch_timeout(Duration::from_secs(5))
///     .with_max_concurrent_tasks(16)
///     .with_insecure_transport(true)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CrawlerBuilder {
    /// Starting ledger index of a full-history node.
    genesis_ledger: String,
    /// Port advertised peers are crawled on.
    crawl_port: u16,
    /// Request settings.
    fetch: FetchConfiguration,
    /// Maximum number of concurrent fetch tasks.
    max_concurrent_tasks: usize,
}

impl Default for CrawlerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CrawlerBuilder {
    /// Create a new crawler builder with XRP Ledger mainnet defaults.
    ///
    /// Certificate validation stays enabled until
    /// [`CrawlerBuilder::with_insecure_transport`] is called.
    pub fn new() -> Self {
        CrawlerBuilder {
            genesis_ledger: MAINNET_GENESIS_LEDGER.to_string(),
            crawl_port: DEFAULT_CRAWL_PORT,
            fetch: FetchConfiguration::default(),
            max_concurrent_tasks: DEFAULT_MAX_CONCURRENT_TASKS,
        }
    }

    /// Set the ledger index at which full-history nodes start.
    ///
    /// Nodes whose history starts exactly here are classified as layer "1",
    /// every other node as layer "0".
    ///
    /// # Arguments
    ///
    /// * `index` - Decimal ledger index (defaults to mainnet's 32570).
    ///
    /// # Returns
    ///
    /// * `Ok(Self)` - The builder for method chaining if validation succeeds.
    /// * `Err(CrawlerBuilderError)` - If the index is not a decimal number.
    pub fn with_genesis_ledger<S: Into<String>>(
        mut self,
        index: S,
    ) -> Result<Self, CrawlerBuilderError> {
        let index = index.into();
        if index.is_empty() || !index.chars().all(|c| c.is_ascii_digit()) {
            return Err(CrawlerBuilderError::InvalidGenesisLedger(index));
        }
        self.genesis_ledger = index;
        Ok(self)
    }

    /// Set the port advertised peers are crawled on (defaults to 51235).
    pub fn with_crawl_port(mut self, port: u16) -> Self {
        self.crawl_port = port;
        self
    }

    /// Set the timeout of a single crawl request.
    ///
    /// The timeout covers connecting, the TLS handshake and reading the
    /// body. Unresponsive nodes dominate crawl time, so keep it short.
    ///
    /// # Arguments
    ///
    /// * `timeout` - Maximum time to wait for a node (defaults to 3 seconds).
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch.timeout = timeout;
        self
    }

    /// Accept invalid TLS certificates from crawled nodes.
    ///
    /// rippled serves its peer port with self-signed certificates, so
    /// crawling the live network needs this enabled.
    pub fn with_insecure_transport(mut self, insecure: bool) -> Self {
        self.fetch.insecure_transport = insecure;
        self
    }

    /// Set a custom user agent for crawl requests.
    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.fetch.user_agent = user_agent.into();
        self
    }

    /// Set the maximum number of concurrent fetch tasks.
    ///
    /// With a single task the crawl is strictly sequential and visits nodes
    /// in last-discovered-first order.
    ///
    /// # Arguments
    ///
    /// * `max_tasks` - Maximum concurrent tasks (defaults to 8, at least 1).
    pub fn with_max_concurrent_tasks(mut self, max_tasks: usize) -> Self {
        self.max_concurrent_tasks = max_tasks.max(1);
        self
    }

    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            genesis_ledger: self.genesis_ledger.clone(),
            crawl_port: self.crawl_port,
            max_concurrent_tasks: self.max_concurrent_tasks,
        }
    }

    /// Build the crawler with an HTTP fetcher.
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - A configured crawler.
    /// * `Err(CrawlerBuilderError)` - If the HTTP client could not be created.
    pub fn build(self) -> Result<Crawler, CrawlerBuilderError> {
        let fetcher = HttpFetcher::new(&self.fetch).map_err(CrawlerBuilderError::HttpClient)?;
        Ok(Crawler::new(self.session_config(), fetcher))
    }

    /// Build the crawler with a custom fetcher.
    ///
    /// Request settings of this builder are ignored, the fetcher owns them.
    pub fn build_with_fetcher<F: NodeFetcher>(self, fetcher: F) -> Crawler<F> {
        Crawler::new(self.session_config(), fetcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_ledger_validation() {
        assert!(CrawlerBuilder::new().with_genesis_ledger("1").is_ok());
        assert!(matches!(
            CrawlerBuilder::new().with_genesis_ledger(""),
            Err(CrawlerBuilderError::InvalidGenesisLedger(_))
        ));
        assert!(matches!(
            CrawlerBuilder::new().with_genesis_ledger("32570-"),
            Err(CrawlerBuilderError::InvalidGenesisLedger(_))
        ));
    }

    #[test]
    fn test_defaults() {
        let builder = CrawlerBuilder::new();
        assert_eq!(builder.genesis_ledger, "32570");
        assert_eq!(builder.crawl_port, 51235);
        assert_eq!(builder.fetch.timeout, Duration::from_secs(3));
        assert!(!builder.fetch.insecure_transport);
        assert_eq!(builder.with_max_concurrent_tasks(0).max_concurrent_tasks, 1);
    }
}
