//! Fetching and classification of XRP Ledger node crawl endpoints.
//!
//! Every rippled node exposes a `/crawl` document on its peer port listing
//! its ledger history and connected peers. This crate fetches that document,
//! parses it and decides which layer of history the node serves.

mod address;
mod classify;
mod error;
mod fetcher;
mod response;

pub use address::{AddressError, NodeAddress, CRAWL_PATH, DEFAULT_CRAWL_PORT};
pub use classify::{
    classify, classify_ledger_range, Classification, Layer, MAINNET_GENESIS_LEDGER,
};
pub use error::{ClassifyError, FetchError};
pub use fetcher::{default_user_agent, FetchConfiguration, HttpFetcher, DEFAULT_FETCH_TIMEOUT};
pub use response::{ActivePeer, CrawlResponse, Overlay, ServerStatus};
