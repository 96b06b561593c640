//! Per-node command maps and command sources

use crate::cluster::{ClusterMembership, NodeAddress};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Mapping from node address to the shell command to run on that node.
///
/// Iteration is sorted by address so rendering is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandMap {
    commands: BTreeMap<NodeAddress, String>,
}

impl CommandMap {
    /// Create an empty command map
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map by evaluating `f` once for every node in the cluster
    pub fn from_fn<F>(cluster: &ClusterMembership, mut f: F) -> Self
    where
        F: FnMut(usize, &NodeAddress) -> String,
    {
        cluster
            .iter()
            .enumerate()
            .map(|(index, node)| (node.clone(), f(index, node)))
            .collect()
    }

    /// Same command on every node of the cluster
    pub fn uniform(cluster: &ClusterMembership, command: impl Into<String>) -> Self {
        let command = command.into();
        Self::from_fn(cluster, |_, _| command.clone())
    }

    /// Insert a command, returning the previous one for that node
    pub fn insert(&mut self, node: NodeAddress, command: impl Into<String>) -> Option<String> {
        self.commands.insert(node, command.into())
    }

    /// Command for a node
    pub fn get(&self, node: &NodeAddress) -> Option<&str> {
        self.commands.get(node).map(String::as_str)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the map has no entries
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Node addresses in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &NodeAddress> {
        self.commands.keys()
    }

    /// Entries in sorted address order
    pub fn iter(&self) -> impl Iterator<Item = (&NodeAddress, &str)> {
        self.commands.iter().map(|(node, cmd)| (node, cmd.as_str()))
    }

    /// Set of node addresses
    pub fn key_set(&self) -> BTreeSet<&NodeAddress> {
        self.commands.keys().collect()
    }

    /// Addresses of `cluster` absent from this map, and addresses in this map
    /// that are not part of `cluster`
    pub fn key_mismatch(&self, cluster: &ClusterMembership) -> (Vec<NodeAddress>, Vec<NodeAddress>) {
        let missing = cluster
            .iter()
            .filter(|node| !self.commands.contains_key(*node))
            .cloned()
            .collect();
        let extra = self
            .commands
            .keys()
            .filter(|node| !cluster.contains(node))
            .cloned()
            .collect();
        (missing, extra)
    }
}

impl FromIterator<(NodeAddress, String)> for CommandMap {
    fn from_iter<T: IntoIterator<Item = (NodeAddress, String)>>(iter: T) -> Self {
        Self {
            commands: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for CommandMap {
    type Item = (NodeAddress, String);
    type IntoIter = std::collections::btree_map::IntoIter<NodeAddress, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.into_iter()
    }
}

/// Where a phase's command comes from: one command for all nodes, or one per node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandSource {
    /// Same command on every node
    Uniform(String),
    /// Node-specific commands
    PerNode(CommandMap),
}

impl CommandSource {
    /// Command to run on `node`, if any
    pub fn for_node(&self, node: &NodeAddress) -> Option<&str> {
        match self {
            Self::Uniform(cmd) => Some(cmd.as_str()),
            Self::PerNode(map) => map.get(node),
        }
    }

    /// Whether this is a per-node map
    pub fn is_per_node(&self) -> bool {
        matches!(self, Self::PerNode(_))
    }
}

impl From<String> for CommandSource {
    fn from(cmd: String) -> Self {
        Self::Uniform(cmd)
    }
}

impl From<&str> for CommandSource {
    fn from(cmd: &str) -> Self {
        Self::Uniform(cmd.to_string())
    }
}

impl From<CommandMap> for CommandSource {
    fn from(map: CommandMap) -> Self {
        Self::PerNode(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster() -> ClusterMembership {
        ClusterMembership::parse(["10.0.0.1", "10.0.0.2"]).unwrap()
    }

    #[test]
    fn test_from_fn_visits_every_node_in_order() {
        let map = CommandMap::from_fn(&cluster(), |i, node| format!("echo {} {}", i, node));
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&"10.0.0.1".parse().unwrap()), Some("echo 0 10.0.0.1"));
        assert_eq!(map.get(&"10.0.0.2".parse().unwrap()), Some("echo 1 10.0.0.2"));
    }

    #[test]
    fn test_key_mismatch() {
        let mut map = CommandMap::new();
        map.insert("10.0.0.1".parse().unwrap(), "a");
        map.insert("10.0.0.9".parse().unwrap(), "b");

        let (missing, extra) = map.key_mismatch(&cluster());
        assert_eq!(missing, vec!["10.0.0.2".parse::<NodeAddress>().unwrap()]);
        assert_eq!(extra, vec!["10.0.0.9".parse::<NodeAddress>().unwrap()]);

        let full = CommandMap::uniform(&cluster(), "x");
        assert_eq!(full.key_set().len(), 2);
        let (missing, extra) = full.key_mismatch(&cluster());
        assert!(missing.is_empty());
        assert!(extra.is_empty());
    }

    #[test]
    fn test_command_source_for_node() {
        let node: NodeAddress = "10.0.0.2".parse().unwrap();
        let uniform = CommandSource::from("python train.py");
        assert_eq!(uniform.for_node(&node), Some("python train.py"));
        assert!(!uniform.is_per_node());

        let per_node = CommandSource::from(CommandMap::from_fn(&cluster(), |i, _| i.to_string()));
        assert_eq!(per_node.for_node(&node), Some("1"));
        assert_eq!(per_node.for_node(&"10.0.0.3".parse().unwrap()), None);
    }

    #[test]
    fn test_command_source_yaml_shapes() {
        let uniform: CommandSource = serde_yaml::from_str("echo hi").unwrap();
        assert_eq!(uniform, CommandSource::Uniform("echo hi".to_string()));

        let per_node: CommandSource =
            serde_yaml::from_str("10.0.0.1: echo a\n10.0.0.2: echo b\n").unwrap();
        match per_node {
            CommandSource::PerNode(map) => assert_eq!(map.len(), 2),
            other => panic!("expected per-node map, got {:?}", other),
        }
    }
}
