use std::collections::{HashMap, HashSet};

use crate::node::{Connection, WorkflowNode};

/// Downstream links and source nodes of a topology, keyed by node id.
///
/// Connections to ids missing from the node list are still recorded.
#[derive(Debug, Clone, Default)]
pub struct Graph {
  downstream: HashMap<String, Vec<String>>,
  entry_points: Vec<String>,
}

impl Graph {
  pub fn new(nodes: &[WorkflowNode], connections: &[Connection]) -> Self {
    let mut downstream: HashMap<String, Vec<String>> = HashMap::new();
    let mut targets: HashSet<&str> = HashSet::new();
    for connection in connections {
      downstream
        .entry(connection.source_id.clone())
        .or_default()
        .push(connection.dest_id.clone());
      targets.insert(&connection.dest_id);
    }

    let mut entry_points: Vec<String> = Vec::new();
    for node in nodes {
      if !targets.contains(node.id.as_str()) && !entry_points.contains(&node.id) {
        entry_points.push(node.id.clone());
      }
    }

    Self {
      downstream,
      entry_points,
    }
  }

  /// Nodes without incoming connections, in node list order.
  pub fn entry_points(&self) -> &[String] {
    &self.entry_points
  }

  /// Destinations of `node_id`'s outgoing connections, in connection order.
  pub fn downstream(&self, node_id: &str) -> &[String] {
    self.downstream.get(node_id).map_or(&[], Vec::as_slice)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn node(id: &str) -> WorkflowNode {
    WorkflowNode {
      id: id.to_string(),
      filename: format!("Node (#{id})/settings.xml"),
    }
  }

  fn connect(from: &str, to: &str) -> Connection {
    Connection {
      source_id: from.to_string(),
      dest_id: to.to_string(),
      source_port: "1".to_string(),
      dest_port: "1".to_string(),
    }
  }

  #[test]
  fn test_entry_points_and_downstream() {
    let nodes = vec![node("1"), node("2"), node("3")];
    let connections = vec![connect("1", "3"), connect("2", "3"), connect("1", "2")];
    let graph = Graph::new(&nodes, &connections);

    assert_eq!(graph.entry_points(), &["1".to_string()]);
    assert_eq!(graph.downstream("1"), &["3".to_string(), "2".to_string()]);
    assert!(graph.downstream("3").is_empty());
  }

  #[test]
  fn test_dangling_connection_is_recorded() {
    let nodes = vec![node("1")];
    let graph = Graph::new(&nodes, &[connect("1", "9")]);

    assert_eq!(graph.downstream("1"), &["9".to_string()]);
    assert_eq!(graph.entry_points(), &["1".to_string()]);
  }

  #[test]
  fn test_duplicate_node_ids_are_one_entry_point() {
    let nodes = vec![node("1"), node("1")];
    let graph = Graph::new(&nodes, &[]);
    assert_eq!(graph.entry_points(), &["1".to_string()]);
  }
}
