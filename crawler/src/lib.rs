//! Topology crawler for the XRP Ledger peer-to-peer network.
//!
//! Starting from one seed node, the crawler visits every reachable node's
//! crawl endpoint, records which layer of ledger history it serves and
//! follows the peers it advertises.

mod builder;
mod config;
mod crawler;
mod fetcher;
mod frontier;
mod publish;
mod run;
mod schedule;
mod session;
mod sink;

pub use builder::{CrawlerBuilder, CrawlerBuilderError};
pub use config::{ConfigError, RawConfig, ServiceConfig, DEFAULT_PUBLISH_BRANCH};
pub use crawler::{CrawlResult, Crawler, CrawlerMessage, ErrorRecord, MAX_CAUSE_DEPTH};
pub use fetcher::NodeFetcher;
pub use frontier::Frontier;
pub use publish::{GitHubPublisher, GitHubSettings, PublishError, Publisher};
pub use run::{
    publish, run_from, run_once, run_scheduled, OutputPaths, RunError, RunReport, ERROR_LOG_NAME,
};
pub use schedule::WeeklySchedule;
pub use sink::{ErrorSink, NodeListSink};

// Re-exports.
pub use xrpl_peers_connection::{
    FetchError, HttpFetcher, Layer, NodeAddress, DEFAULT_CRAWL_PORT, MAINNET_GENESIS_LEDGER,
};
