//! Internal session coordination for crawling operations.
//!
//! This module contains the [`CrawlSession`] which orchestrates the crawling process
//! by managing the frontier and coordinating concurrent node processing tasks.

use crate::crawler::{CrawlResult, CrawlerMessage, ErrorRecord};
use crate::fetcher::NodeFetcher;
use crate::frontier::Frontier;
use log::{debug, info};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};
use xrpl_peers_connection::{classify, Classification, NodeAddress};

/// Configuration for a crawl session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Starting ledger index of a full-history node.
    pub genesis_ledger: String,
    /// Port advertised peers are crawled on.
    pub crawl_port: u16,
    pub max_concurrent_tasks: usize,
}

/// Result of processing a single node.
#[derive(Debug, Clone)]
enum TaskResult {
    /// Classified the node and pushed its new peers.
    Classified,
    /// The node holds no ledger history.
    Unclassifiable,
    /// Fetching or parsing failed.
    Failed,
    /// Task exited early due to channel closure.
    ChannelClosed,
}

/// Internal coordinator for a crawling session.
///
/// A session owns all state of one crawl, so concurrent or repeated crawls
/// never share a frontier.
///
/// # Architecture
///
/// * **Coordinator** (`coordinate()`) - Pops addresses from the frontier and spawns processing tasks.
/// * **Processors** (`process()`) - Fetch and classify a single node, pushing its peers.
///
/// Popping and marking an address visited happen under one frontier lock, so
/// no address is handed to two processors. Processors push their peers before
/// reporting completion, which lets the coordinator treat "frontier empty and
/// no active tasks" as the end of the crawl.
#[derive(Clone)]
pub struct CrawlSession<F> {
    config: Arc<SessionConfig>,
    fetcher: F,
    /// Channel for sending results back to the caller.
    crawl_tx: mpsc::Sender<CrawlerMessage>,
    frontier: Arc<Mutex<Frontier>>,
}

impl<F: NodeFetcher> CrawlSession<F> {
    /// Create a new crawl session with an empty frontier.
    pub fn new(config: SessionConfig, fetcher: F, crawl_tx: mpsc::Sender<CrawlerMessage>) -> Self {
        Self {
            config: Arc::new(config),
            fetcher,
            crawl_tx,
            frontier: Arc::new(Mutex::new(Frontier::new())),
        }
    }

    /// Fetches and classifies a single node, then pushes its unvisited peers.
    ///
    /// Every failure is reported through the message channel and stops here.
    async fn process(&self, address: NodeAddress) -> TaskResult {
        debug!("Processing node {address}");

        let body = match self.fetcher.fetch(&address).await {
            Ok(body) => body,
            Err(e) => {
                debug!("Failed to fetch {address}: {e}");
                let record = ErrorRecord::from_error(address, &e);
                return self.report(CrawlerMessage::Failed(record), TaskResult::Failed).await;
            }
        };

        match classify(&body, &self.config.genesis_ledger, self.config.crawl_port) {
            Ok(Classification::Classified { layer, peers }) => {
                let result = CrawlResult {
                    address: address.clone(),
                    layer,
                };
                if self.crawl_tx.send(CrawlerMessage::Node(result)).await.is_err() {
                    // Receiver dropped, stop processing.
                    return TaskResult::ChannelClosed;
                }

                let advertised = peers.len();
                let pushed = self.frontier.lock().await.extend_unvisited(peers);
                debug!("{address} advertised {advertised} peers, {pushed} not yet visited");
                TaskResult::Classified
            }
            Ok(Classification::Unclassifiable) => {
                debug!("{address} holds no ledger history");
                self.report(
                    CrawlerMessage::Unclassifiable(address),
                    TaskResult::Unclassifiable,
                )
                .await
            }
            Err(e) => {
                debug!("Failed to classify {address}: {e}");
                let record = ErrorRecord::from_error(address, &e);
                self.report(CrawlerMessage::Failed(record), TaskResult::Failed)
                    .await
            }
        }
    }

    async fn report(&self, message: CrawlerMessage, result: TaskResult) -> TaskResult {
        if self.crawl_tx.send(message).await.is_err() {
            return TaskResult::ChannelClosed;
        }
        result
    }

    /// Pops the next address nobody has visited yet, marking it visited.
    async fn next_unvisited(&self) -> Option<NodeAddress> {
        let mut frontier = self.frontier.lock().await;
        while let Some(address) = frontier.pop() {
            if frontier.mark_visited(&address) {
                return Some(address);
            }
        }
        None
    }

    /// Coordinates the crawling process by managing the frontier and task scheduling.
    ///
    /// This is the main control loop of the session. It hands unvisited
    /// addresses to up to `max_concurrent_tasks` processors until the crawl
    /// is complete or the caller hangs up.
    ///
    /// # Termination Conditions
    ///
    /// 1. **Natural Completion** - Frontier empty and all tasks finished.
    /// 2. **Channel Closure** - Receiver dropped, indicating caller no longer interested.
    pub async fn coordinate(&self, seed: NodeAddress) {
        let max_tasks = self.config.max_concurrent_tasks.max(1);
        // Channel to track task completion.
        let (task_done_tx, mut task_done_rx) = mpsc::channel::<TaskResult>(max_tasks);

        // Prime the pump with the seed node.
        self.frontier.lock().await.push(seed);

        // Number of in-flight tasks.
        let mut active_tasks = 0;

        let mut last_log_time = Instant::now();
        let log_interval = Duration::from_secs(60);

        loop {
            // Check if caller hung up before continuing.
            if self.crawl_tx.is_closed() {
                debug!("Receiver disconnected, stopping crawler");
                break;
            }

            if last_log_time.elapsed() >= log_interval {
                let frontier = self.frontier.lock().await;
                info!(
                    "{} active tasks (max: {}), {} pending, {} unique nodes visited",
                    active_tasks,
                    max_tasks,
                    frontier.pending(),
                    frontier.visited_count()
                );
                last_log_time = Instant::now();
            }

            // Fill every free slot.
            while active_tasks < max_tasks {
                let Some(address) = self.next_unvisited().await else {
                    break;
                };

                let session = self.clone();
                let done_tx = task_done_tx.clone();

                active_tasks += 1;
                tokio::spawn(async move {
                    let result = session.process(address).await;
                    if done_tx.send(result).await.is_err() {
                        debug!("Coordinator stopped before task completed");
                    }
                });
            }

            // Nothing in flight can push more work, so the frontier is drained.
            if active_tasks == 0 {
                let visited = self.frontier.lock().await.visited_count();
                info!("Crawler exhausted - {visited} nodes processed");
                break;
            }

            // Wait for something to happen.
            tokio::select! {
                Some(result) = task_done_rx.recv() => {
                    active_tasks -= 1;
                    debug!("Task completed with result: {result:?}");
                }
                _ = self.crawl_tx.closed() => {
                    debug!("Receiver disconnected, stopping crawler");
                    break;
                }
            }
        }
    }
}
