//! Schema of the document served by a node's crawl endpoint.
//!
//! Only the fields needed for crawling are modelled. Unknown fields are
//! ignored, but the `server` and `overlay` objects must be present.

use serde::Deserialize;

/// Top level crawl document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CrawlResponse {
    /// Status of the node's own server.
    pub server: ServerStatus,
    /// The node's view of its peer overlay.
    pub overlay: Overlay,
}

/// Server status section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerStatus {
    /// Ledger range the node holds, e.g. `"32570-91234567"` or `"empty"`.
    #[serde(default)]
    pub complete_ledgers: Option<String>,
}

/// Overlay section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Overlay {
    /// Currently connected peers.
    pub active: Vec<ActivePeer>,
}

/// A connected peer as advertised by a node.
///
/// Peers that did not opt in to sharing their address have no `ip`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActivePeer {
    #[serde(default)]
    pub ip: Option<String>,
}

impl CrawlResponse {
    /// Parse a raw crawl document.
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ignores_unknown_fields() {
        let raw = r#"{
            "overlay": {
                "active": [
                    {"ip": "::ffff:10.0.0.5", "port": "51235", "type": "out", "version": "rippled-2.2.0"},
                    {"public_key": "n9abc", "type": "in"}
                ]
            },
            "server": {"build_version": "2.2.0", "complete_ledgers": "32570-90000000", "uptime": 12},
            "unl": {}
        }"#;

        let response = CrawlResponse::parse(raw).unwrap();
        assert_eq!(
            response.server.complete_ledgers.as_deref(),
            Some("32570-90000000")
        );
        assert_eq!(response.overlay.active.len(), 2);
        assert_eq!(
            response.overlay.active[0].ip.as_deref(),
            Some("::ffff:10.0.0.5")
        );
        assert_eq!(response.overlay.active[1].ip, None);
    }

    #[test]
    fn test_parse_missing_sections() {
        assert!(CrawlResponse::parse(r#"{"server": {}}"#).is_err());
        assert!(CrawlResponse::parse(r#"{"overlay": {"active": []}}"#).is_err());
        assert!(CrawlResponse::parse("<html>Bad Gateway</html>").is_err());
    }

    #[test]
    fn test_parse_null_ledger_range() {
        let raw = r#"{"server": {"complete_ledgers": null}, "overlay": {"active": []}}"#;
        let response = CrawlResponse::parse(raw).unwrap();
        assert_eq!(response.server.complete_ledgers, None);
    }
}
