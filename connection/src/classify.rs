//! Node classification by retained ledger history.

use crate::address::NodeAddress;
use crate::error::ClassifyError;
use crate::response::CrawlResponse;
use std::fmt;

/// First ledger index retained on XRP Ledger mainnet.
///
/// Earlier ledgers were lost, so a node whose history starts here holds the
/// full history of the network.
pub const MAINNET_GENESIS_LEDGER: &str = "32570";

/// Sentinel rippled reports when it holds no ledgers at all.
const EMPTY_LEDGER_RANGE: &str = "empty";

/// Binary classification of a node's retained ledger history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// History starts anywhere other than genesis.
    Partial,
    /// History starts at the genesis ledger.
    Full,
}

impl Layer {
    /// Node-list representation: `"0"` for partial, `"1"` for full history.
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Partial => "0",
            Layer::Full => "1",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of classifying a well-formed crawl response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The node reported a ledger range.
    Classified {
        layer: Layer,
        /// Advertised peers, in the order the node listed them.
        peers: Vec<NodeAddress>,
    },
    /// The node reported no ledger range. Not an error, but its peers are not explored.
    Unclassifiable,
}

/// Classify a ledger range string such as `"32570-91234567"`.
///
/// # Arguments
///
/// * `complete_ledgers` - The range reported by the node, if any.
/// * `genesis` - Starting index which marks a full-history node.
///
/// # Returns
///
/// * `Some(Layer)` - If the range is present and non-empty.
/// * `None` - If the range is absent, empty or the `"empty"` sentinel.
pub fn classify_ledger_range(complete_ledgers: Option<&str>, genesis: &str) -> Option<Layer> {
    let range = complete_ledgers?.trim();
    if range.is_empty() || range == EMPTY_LEDGER_RANGE {
        return None;
    }

    // A range without a separator is a single ledger, which is its own start.
    let start = range.split('-').next().unwrap_or(range).trim();
    if start == genesis {
        Some(Layer::Full)
    } else {
        Some(Layer::Partial)
    }
}

/// Parse and classify a raw crawl response.
///
/// # Arguments
///
/// * `raw` - Body returned by the node's crawl endpoint.
/// * `genesis` - Starting ledger index which marks a full-history node.
/// * `crawl_port` - Port used to build the crawl address of each advertised peer.
///
/// # Returns
///
/// * `Ok(Classification)` - The node's layer and peers, or `Unclassifiable`.
/// * `Err(ClassifyError)` - If the body is not a crawl document.
pub fn classify(
    raw: &str,
    genesis: &str,
    crawl_port: u16,
) -> Result<Classification, ClassifyError> {
    let response = CrawlResponse::parse(raw)?;

    let layer = match classify_ledger_range(response.server.complete_ledgers.as_deref(), genesis)
    {
        Some(layer) => layer,
        None => return Ok(Classification::Unclassifiable),
    };

    let peers = response
        .overlay
        .active
        .iter()
        .filter_map(|peer| peer.ip.as_deref())
        .map(|ip| NodeAddress::from_peer_ip(ip, crawl_port))
        .collect();

    Ok(Classification::Classified { layer, peers })
}
