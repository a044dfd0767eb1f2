use crate::fetcher::NodeFetcher;
use crate::session::{CrawlSession, SessionConfig};
use log::info;
use std::error::Error;
use std::fmt;
use tokio::sync::mpsc::{self, Receiver};
use xrpl_peers_connection::{HttpFetcher, Layer, NodeAddress};

/// Maximum number of messages in an error's cause chain kept for the error log.
pub const MAX_CAUSE_DEPTH: usize = 3;

/// Capacity of the channel carrying results back to the caller.
const MESSAGE_CHANNEL_CAPACITY: usize = 1000;

/// A successfully classified node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlResult {
    pub address: NodeAddress,
    pub layer: Layer,
}

/// Node-list line: `<address>\t<layer>`.
impl fmt::Display for CrawlResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.address, self.layer)
    }
}

/// A node whose fetch or parse failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub address: NodeAddress,
    /// Error message followed by the messages of its causes, innermost last.
    pub causes: Vec<String>,
}

impl ErrorRecord {
    /// Flatten an error and up to two levels of its causes.
    pub fn from_error(address: NodeAddress, err: &(dyn Error + 'static)) -> Self {
        let mut causes = Vec::with_capacity(MAX_CAUSE_DEPTH);
        let mut current = Some(err);
        while let Some(err) = current {
            if causes.len() == MAX_CAUSE_DEPTH {
                break;
            }
            causes.push(err.to_string());
            current = err.source();
        }
        ErrorRecord { address, causes }
    }
}

/// Error-log line: `<address>:<cause>[:<inner-cause>[:<inner-inner-cause>]]`.
impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)?;
        for cause in &self.causes {
            write!(f, ":{cause}")?;
        }
        Ok(())
    }
}

/// Messages sent from the [`Crawler`] to the caller about visited nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlerMessage {
    /// A node that answered with a ledger range.
    Node(CrawlResult),
    /// A node that answered without any ledger history. Its peers are not explored.
    Unclassifiable(NodeAddress),
    /// A node that could not be fetched or whose response could not be parsed.
    Failed(ErrorRecord),
}

impl fmt::Display for CrawlerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrawlerMessage::Node(result) => {
                write!(f, "Node: {} (layer {})", result.address, result.layer)
            }
            CrawlerMessage::Unclassifiable(address) => {
                write!(f, "Unclassifiable node: {address}")
            }
            CrawlerMessage::Failed(record) => write!(f, "Failed node: {record}"),
        }
    }
}

/// A crawler for the XRP Ledger peer-to-peer network.
///
/// The crawler asks each node for its crawl document, classifies it by the
/// ledger history it holds and follows the peers it advertises. Built with
/// [`crate::CrawlerBuilder`].
#[derive(Debug, Clone)]
pub struct Crawler<F = HttpFetcher> {
    config: SessionConfig,
    fetcher: F,
}

impl<F: NodeFetcher> Crawler<F> {
    pub(crate) fn new(config: SessionConfig, fetcher: F) -> Self {
        Self { config, fetcher }
    }

    /// Port advertised peers are crawled on.
    pub fn crawl_port(&self) -> u16 {
        self.config.crawl_port
    }

    /// Crawl the network starting from a seed node.
    ///
    /// This method returns a channel that receives one message per visited
    /// node. The channel is closed when the crawl is complete.
    ///
    /// # Termination
    ///
    /// * **Natural completion** - When the frontier is empty and no node is mid-fetch.
    /// * **Early termination** - When the returned receiver is dropped, the
    ///   crawler stops handing out new nodes and winds down.
    ///
    /// # Arguments
    ///
    /// * `seed` - The node to start crawling from.
    pub fn crawl(&self, seed: NodeAddress) -> Receiver<CrawlerMessage> {
        let (crawl_tx, crawl_rx) = mpsc::channel(MESSAGE_CHANNEL_CAPACITY);
        info!("Crawling from seed {}", seed.url());

        let session = CrawlSession::new(self.config.clone(), self.fetcher.clone(), crawl_tx);
        tokio::spawn(async move {
            session.coordinate(seed).await;
        });

        crawl_rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::test_utils::{address, MockFetcher};
    use crate::CrawlerBuilder;
    use std::collections::HashSet;
    use std::io;
    use std::time::Duration;

    #[derive(Debug)]
    struct Layered {
        message: &'static str,
        source: Option<Box<Layered>>,
    }

    impl fmt::Display for Layered {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.message)
        }
    }

    impl Error for Layered {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            self.source.as_deref().map(|e| e as &(dyn Error + 'static))
        }
    }

    fn layered(messages: &[&'static str]) -> Layered {
        let mut err: Option<Box<Layered>> = None;
        for &message in messages.iter().rev() {
            err = Some(Box::new(Layered {
                message,
                source: err,
            }));
        }
        *err.unwrap()
    }

    async fn collect(crawler: &Crawler<MockFetcher>, seed: &str) -> Vec<CrawlerMessage> {
        let mut rx = crawler.crawl(address(seed));
        let mut messages = Vec::new();
        while let Some(message) = rx.recv().await {
            messages.push(message);
        }
        messages
    }

    #[test]
    fn test_error_record_truncates_cause_chain() {
        let err = layered(&["outer", "middle", "inner", "innermost"]);
        let record = ErrorRecord::from_error(address("10.0.0.1"), &err);

        assert_eq!(record.causes, vec!["outer", "middle", "inner"]);
        assert_eq!(record.to_string(), "10.0.0.1:outer:middle:inner");
    }

    #[test]
    fn test_error_record_single_cause() {
        let err = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        let record = ErrorRecord::from_error(address("10.0.0.1"), &err);
        assert_eq!(record.to_string(), "10.0.0.1:refused");
    }

    #[test]
    fn test_crawl_result_line() {
        let result = CrawlResult {
            address: address("::ffff:10.0.0.5"),
            layer: Layer::Full,
        };
        assert_eq!(result.to_string(), "10.0.0.5\t1");
    }

    #[tokio::test]
    async fn test_crawl_scenario() {
        let fetcher = MockFetcher::new();
        fetcher.add_node("10.0.0.1", "32570-1000", &["10.0.0.2", "10.0.0.3"]);
        fetcher.add_node("10.0.0.2", "40000-1000", &["10.0.0.1"]);
        fetcher.add_timeout("10.0.0.3");

        let crawler = CrawlerBuilder::new()
            .with_max_concurrent_tasks(1)
            .build_with_fetcher(fetcher.clone());
        let messages = collect(&crawler, "10.0.0.1").await;

        assert_eq!(
            messages[0],
            CrawlerMessage::Node(CrawlResult {
                address: address("10.0.0.1"),
                layer: Layer::Full,
            })
        );
        assert!(matches!(&messages[1], CrawlerMessage::Failed(r) if r.address == address("10.0.0.3")));
        assert_eq!(
            messages[2],
            CrawlerMessage::Node(CrawlResult {
                address: address("10.0.0.2"),
                layer: Layer::Partial,
            })
        );
        assert_eq!(messages.len(), 3);

        // LIFO: the last advertised peer is visited first, the seed never twice.
        assert_eq!(
            fetcher.fetched(),
            vec![address("10.0.0.1"), address("10.0.0.3"), address("10.0.0.2")]
        );
    }

    #[tokio::test]
    async fn test_unclassifiable_node_peers_not_explored() {
        let fetcher = MockFetcher::new();
        fetcher.add_node("10.0.0.1", "32570-1000", &["10.0.0.2"]);
        fetcher.add_node("10.0.0.2", "empty", &["10.0.0.9"]);
        fetcher.add_node("10.0.0.9", "40000-1000", &[]);

        let crawler = CrawlerBuilder::new().build_with_fetcher(fetcher.clone());
        let messages = collect(&crawler, "10.0.0.1").await;

        assert_eq!(messages.len(), 2);
        assert!(messages.contains(&CrawlerMessage::Unclassifiable(address("10.0.0.2"))));
        assert!(!fetcher.fetched().contains(&address("10.0.0.9")));
    }

    #[tokio::test]
    async fn test_parse_failure_is_reported() {
        let fetcher = MockFetcher::new();
        fetcher.add_node("10.0.0.1", "32570-1000", &["10.0.0.2", "10.0.0.3"]);
        fetcher.add_body("10.0.0.2", "<html>502 Bad Gateway</html>");
        fetcher.add_node("10.0.0.3", "1-1000", &[]);

        let crawler = CrawlerBuilder::new().build_with_fetcher(fetcher);
        let messages = collect(&crawler, "10.0.0.1").await;

        let failed: Vec<&ErrorRecord> = messages
            .iter()
            .filter_map(|m| match m {
                CrawlerMessage::Failed(record) => Some(record),
                _ => None,
            })
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].address, address("10.0.0.2"));
        assert_eq!(failed[0].causes[0], "Invalid crawl response");
        assert_eq!(messages.len(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_crawl_visits_each_node_once() {
        // A densely connected network where every node advertises every other.
        let hosts: Vec<String> = (1..=20).map(|i| format!("10.0.1.{i}")).collect();
        let peers: Vec<&str> = hosts.iter().map(|h| h.as_str()).collect();
        let fetcher = MockFetcher::new().with_delay(Duration::from_millis(5));
        for (i, host) in hosts.iter().enumerate() {
            let range = if i % 2 == 0 { "32570-1000" } else { "50000-1000" };
            fetcher.add_node(host, range, &peers);
        }
        // Mapped spelling of a known host must not be visited again.
        fetcher.add_node("10.0.1.1", "32570-1000", &["::ffff:10.0.1.2", "10.0.1.3"]);

        let crawler = CrawlerBuilder::new()
            .with_max_concurrent_tasks(8)
            .build_with_fetcher(fetcher.clone());
        let messages = collect(&crawler, "10.0.1.1").await;

        let fetched = fetcher.fetched();
        let unique: HashSet<&NodeAddress> = fetched.iter().collect();
        assert_eq!(unique.len(), fetched.len());
        assert_eq!(fetched.len(), 20);
        assert_eq!(messages.len(), 20);
    }

    #[tokio::test]
    async fn test_identical_reruns() {
        let fetcher = MockFetcher::new();
        fetcher.add_node("10.0.0.1", "32570-1000", &["10.0.0.2", "10.0.0.3"]);
        fetcher.add_node("10.0.0.2", "40000-1000", &["10.0.0.3", "10.0.0.4"]);
        fetcher.add_node("10.0.0.3", "32570-1000", &["10.0.0.1"]);
        fetcher.add_node("10.0.0.4", "60000-1000", &[]);

        let crawler = CrawlerBuilder::new()
            .with_max_concurrent_tasks(1)
            .build_with_fetcher(fetcher);

        let first = collect(&crawler, "10.0.0.1").await;
        let second = collect(&crawler, "10.0.0.1").await;
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
    }

    #[tokio::test]
    async fn test_dropping_receiver_stops_crawl() {
        let fetcher = MockFetcher::new().with_delay(Duration::from_millis(20));
        let hosts: Vec<String> = (1..=50).map(|i| format!("10.0.2.{i}")).collect();
        let peers: Vec<&str> = hosts.iter().map(|h| h.as_str()).collect();
        for host in &hosts {
            fetcher.add_node(host, "40000-1000", &peers);
        }

        let crawler = CrawlerBuilder::new()
            .with_max_concurrent_tasks(1)
            .build_with_fetcher(fetcher.clone());
        let mut rx = crawler.crawl(address("10.0.2.1"));
        assert!(rx.recv().await.is_some());
        drop(rx);

        tokio::time::sleep(Duration::from_millis(200)).await;
        let fetched = fetcher.fetched().len();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fetcher.fetched().len(), fetched);
        assert!(fetched < 50);
    }
}
