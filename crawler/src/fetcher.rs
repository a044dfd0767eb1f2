//! Node fetching abstraction for testing and mocking.
//!
//! The [`NodeFetcher`] trait is the seam between the traversal engine and the
//! network, so the engine can be driven against an in-memory network in tests.

use xrpl_peers_connection::{FetchError, HttpFetcher, NodeAddress};

/// Fetches the raw crawl document of a node.
pub trait NodeFetcher: Clone + Send + Sync + 'static {
    /// Issue a single request to the node's crawl endpoint.
    ///
    /// Implementations must not retry. A failure is reported once and the
    /// node is never revisited within a run.
    fn fetch(
        &self,
        address: &NodeAddress,
    ) -> impl std::future::Future<Output = Result<String, FetchError>> + Send;
}

impl NodeFetcher for HttpFetcher {
    fn fetch(
        &self,
        address: &NodeAddress,
    ) -> impl std::future::Future<Output = Result<String, FetchError>> + Send {
        let fetcher = self.clone();
        let address = address.clone();
        async move { HttpFetcher::fetch(&fetcher, &address).await }
    }
}
