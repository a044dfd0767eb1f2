//! Work queue of a crawl: addresses awaiting a fetch and addresses already visited.

use std::collections::HashSet;
use xrpl_peers_connection::NodeAddress;

/// LIFO stack of addresses to visit plus the set of addresses already visited.
///
/// Duplicates are allowed on the stack. Two nodes can advertise the same
/// peer before either is processed, and the duplicate is discarded when it
/// is popped and [`Frontier::mark_visited`] refuses it.
#[derive(Debug, Default)]
pub struct Frontier {
    stack: Vec<NodeAddress>,
    visited: HashSet<NodeAddress>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an address on top of the stack, unconditionally.
    pub fn push(&mut self, address: NodeAddress) {
        self.stack.push(address);
    }

    /// Pop the most recently pushed address, `None` once the stack is drained.
    pub fn pop(&mut self) -> Option<NodeAddress> {
        self.stack.pop()
    }

    /// Record an address as visited.
    ///
    /// # Returns
    ///
    /// `true` if the address was not visited before, `false` otherwise.
    pub fn mark_visited(&mut self, address: &NodeAddress) -> bool {
        if self.visited.contains(address) {
            return false;
        }
        self.visited.insert(address.clone())
    }

    #[cfg(test)]
    fn is_visited(&self, address: &NodeAddress) -> bool {
        self.visited.contains(address)
    }

    /// Push every address not yet visited, preserving order.
    ///
    /// # Returns
    ///
    /// The number of addresses pushed.
    pub fn extend_unvisited<I>(&mut self, addresses: I) -> usize
    where
        I: IntoIterator<Item = NodeAddress>,
    {
        let mut pushed = 0;
        for address in addresses {
            if !self.visited.contains(&address) {
                self.stack.push(address);
                pushed += 1;
            }
        }
        pushed
    }

    /// Number of entries awaiting processing, duplicates included.
    pub fn pending(&self) -> usize {
        self.stack.len()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xrpl_peers_connection::DEFAULT_CRAWL_PORT;

    fn addr(host: &str) -> NodeAddress {
        NodeAddress::from_peer_ip(host, DEFAULT_CRAWL_PORT)
    }

    #[test]
    fn test_pop_is_lifo() {
        let mut frontier = Frontier::new();
        frontier.push(addr("10.0.0.1"));
        frontier.push(addr("10.0.0.2"));
        frontier.push(addr("10.0.0.3"));

        assert_eq!(frontier.pop(), Some(addr("10.0.0.3")));
        assert_eq!(frontier.pop(), Some(addr("10.0.0.2")));
        assert_eq!(frontier.pop(), Some(addr("10.0.0.1")));
        assert_eq!(frontier.pop(), None);
    }

    #[test]
    fn test_push_keeps_duplicates() {
        let mut frontier = Frontier::new();
        frontier.push(addr("10.0.0.1"));
        frontier.push(addr("10.0.0.1"));
        assert_eq!(frontier.pending(), 2);

        let first = frontier.pop().unwrap();
        assert!(frontier.mark_visited(&first));
        let second = frontier.pop().unwrap();
        assert!(!frontier.mark_visited(&second));
        assert_eq!(frontier.visited_count(), 1);
    }

    #[test]
    fn test_mark_visited_normalized_forms() {
        let mut frontier = Frontier::new();
        assert!(frontier.mark_visited(&addr("10.0.0.5")));
        assert!(!frontier.mark_visited(&addr("::ffff:10.0.0.5")));
        assert!(frontier.is_visited(&addr("::ffff:10.0.0.5")));
    }

    #[test]
    fn test_extend_unvisited() {
        let mut frontier = Frontier::new();
        frontier.mark_visited(&addr("10.0.0.1"));

        let pushed =
            frontier.extend_unvisited(vec![addr("10.0.0.1"), addr("10.0.0.2"), addr("10.0.0.3")]);

        assert_eq!(pushed, 2);
        assert_eq!(frontier.pop(), Some(addr("10.0.0.3")));
        assert_eq!(frontier.pop(), Some(addr("10.0.0.2")));
        assert_eq!(frontier.pop(), None);
    }
}
