//! Node addresses and ordered cluster membership
//!
//! The launcher hands over the addresses of a running cluster as an ordered
//! list. Position 0 is the head (coordinator) node and every other position is
//! a worker. That ordering is the only source of role assignment.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Network address of one cluster member (hostname, IPv4 or IPv6 literal)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeAddress(String);

impl NodeAddress {
    /// Create a validated node address
    pub fn new(address: impl Into<String>) -> Result<Self> {
        let address = address.into();

        if address.is_empty() {
            return Err(Error::cluster_config("Node address cannot be empty"));
        }

        // Anything outside this set would either not be an address or would
        // break out of the quoted export statement on the node.
        if let Some(bad) = address
            .chars()
            .find(|&c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ':' | '[' | ']' | '%')))
        {
            return Err(Error::cluster_config(format!(
                "Invalid character {:?} in node address {:?}",
                bad, address
            )));
        }

        Ok(Self(address))
    }

    /// Borrow the address as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render `address:port`
    pub fn with_port(&self, port: u16) -> String {
        format!("{}:{}", self.0, port)
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NodeAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for NodeAddress {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<NodeAddress> for String {
    fn from(address: NodeAddress) -> Self {
        address.0
    }
}

impl AsRef<str> for NodeAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Ordered, non-empty list of unique node addresses.
///
/// Index 0 is always the head node; use [`ClusterMembership::head`] rather
/// than indexing directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<NodeAddress>", into = "Vec<NodeAddress>")]
pub struct ClusterMembership {
    nodes: Vec<NodeAddress>,
}

impl ClusterMembership {
    /// Create a membership from already-parsed addresses
    pub fn new(nodes: Vec<NodeAddress>) -> Result<Self> {
        if nodes.is_empty() {
            return Err(Error::cluster_config(
                "Cluster membership must contain at least one node",
            ));
        }

        let mut seen = HashSet::with_capacity(nodes.len());
        for node in &nodes {
            if !seen.insert(node) {
                return Err(Error::cluster_config(format!(
                    "Duplicate node address in cluster membership: {}",
                    node
                )));
            }
        }

        Ok(Self { nodes })
    }

    /// Parse and validate a list of raw address strings
    pub fn parse<I, S>(addresses: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let nodes = addresses
            .into_iter()
            .map(NodeAddress::new)
            .collect::<Result<Vec<_>>>()?;
        Self::new(nodes)
    }

    /// The head (coordinator) node, always at index 0
    pub fn head(&self) -> &NodeAddress {
        &self.nodes[0]
    }

    /// Every node except the head, in order
    pub fn workers(&self) -> &[NodeAddress] {
        &self.nodes[1..]
    }

    /// Number of nodes, including the head
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the membership has no nodes (never true once constructed)
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate addresses in membership order
    pub fn iter(&self) -> std::slice::Iter<'_, NodeAddress> {
        self.nodes.iter()
    }

    /// Addresses as a slice, in membership order
    pub fn as_slice(&self) -> &[NodeAddress] {
        &self.nodes
    }

    /// Position of an address within the membership
    pub fn position(&self, address: &NodeAddress) -> Option<usize> {
        self.nodes.iter().position(|node| node == address)
    }

    /// Whether the address belongs to this cluster
    pub fn contains(&self, address: &NodeAddress) -> bool {
        self.position(address).is_some()
    }

    /// Whether the address is the head node
    pub fn is_head(&self, address: &NodeAddress) -> bool {
        self.head() == address
    }
}

impl TryFrom<Vec<NodeAddress>> for ClusterMembership {
    type Error = Error;

    fn try_from(nodes: Vec<NodeAddress>) -> Result<Self> {
        Self::new(nodes)
    }
}

impl From<ClusterMembership> for Vec<NodeAddress> {
    fn from(membership: ClusterMembership) -> Self {
        membership.nodes
    }
}

impl<'a> IntoIterator for &'a ClusterMembership {
    type Item = &'a NodeAddress;
    type IntoIter = std::slice::Iter<'a, NodeAddress>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_addresses() {
        for addr in ["10.0.0.1", "head-node.internal", "node_3", "[fe80::1%eth0]", "fe80::1"] {
            assert!(NodeAddress::new(addr).is_ok(), "{} should be accepted", addr);
        }
    }

    #[test]
    fn test_invalid_addresses() {
        for addr in ["", "10.0.0.1 ", "a'b", "a\"b", "$(reboot)", "`id`", "a\\b", "a;b"] {
            let err = NodeAddress::new(addr).unwrap_err();
            assert!(matches!(err, Error::ClusterConfig(_)), "{:?}", addr);
        }
    }

    #[test]
    fn test_head_is_first() {
        let cluster = ClusterMembership::parse(["10.0.0.1", "10.0.0.2", "10.0.0.3"]).unwrap();
        assert_eq!(cluster.head().as_str(), "10.0.0.1");
        assert_eq!(cluster.workers().len(), 2);
        assert_eq!(cluster.workers()[0].as_str(), "10.0.0.2");
        assert!(cluster.is_head(&"10.0.0.1".parse().unwrap()));
        assert!(!cluster.is_head(&"10.0.0.3".parse().unwrap()));
        assert_eq!(cluster.position(&"10.0.0.3".parse().unwrap()), Some(2));
    }

    #[test]
    fn test_single_node_cluster() {
        let cluster = ClusterMembership::parse(["10.0.0.5"]).unwrap();
        assert_eq!(cluster.len(), 1);
        assert_eq!(cluster.head().as_str(), "10.0.0.5");
        assert!(cluster.workers().is_empty());
    }

    #[test]
    fn test_empty_membership_rejected() {
        let err = ClusterMembership::parse(Vec::<String>::new()).unwrap_err();
        assert!(err.to_string().contains("at least one node"));
    }

    #[test]
    fn test_duplicate_rejected() {
        let err = ClusterMembership::parse(["10.0.0.1", "10.0.0.2", "10.0.0.1"]).unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
    }

    #[test]
    fn test_malformed_entry_rejected() {
        assert!(ClusterMembership::parse(["10.0.0.1", "not an address"]).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let cluster: ClusterMembership = serde_json::from_str(r#"["a", "b"]"#).unwrap();
        assert_eq!(cluster.len(), 2);

        assert!(serde_json::from_str::<ClusterMembership>("[]").is_err());
        assert!(serde_json::from_str::<ClusterMembership>(r#"["a", "a"]"#).is_err());
        assert!(serde_json::from_str::<ClusterMembership>(r#"["a b"]"#).is_err());
    }
}
