use knwf_settings::xml::{Document, Element};
use knwf_settings::{find_container, read_entries};
use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;
use crate::graph::Graph;
use crate::node::{Connection, WorkflowNode};

const NODES_KEY: &str = "nodes";
const CONNECTIONS_KEY: &str = "connections";

/// Nodes and connections of one workflow, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
  pub nodes: Vec<WorkflowNode>,
  pub connections: Vec<Connection>,
}

impl Topology {
  /// Parse workflow document text.
  pub fn from_xml(xml: &str) -> Result<Self, WorkflowError> {
    read_topology(&Document::parse(xml)?)
  }

  /// Downstream links and entry points of this topology.
  pub fn graph(&self) -> Graph {
    Graph::new(&self.nodes, &self.connections)
  }

  /// Get a node by ID.
  pub fn get_node(&self, node_id: &str) -> Option<&WorkflowNode> {
    self.nodes.iter().find(|node| node.id == node_id)
  }
}

/// Read the node and connection lists out of a workflow document.
///
/// Each direct `config` child of the `nodes` and `connections` containers is
/// read as a flat entry list; nested containers are not visited.
pub fn read_topology(document: &Document) -> Result<Topology, WorkflowError> {
  let nodes = child_configs(document, NODES_KEY)?
    .map(read_node)
    .collect::<Result<Vec<_>, _>>()?;
  let connections = child_configs(document, CONNECTIONS_KEY)?
    .map(read_connection)
    .collect::<Result<Vec<_>, _>>()?;

  Ok(Topology { nodes, connections })
}

fn child_configs<'a>(
  document: &'a Document,
  key: &str,
) -> Result<impl Iterator<Item = &'a Element>, WorkflowError> {
  let container = find_container(document, key)?;
  Ok(
    container
      .elements()
      .filter(|child| child.local_name() == "config"),
  )
}

fn read_node(element: &Element) -> Result<WorkflowNode, WorkflowError> {
  let entries = read_entries(element)?;
  Ok(WorkflowNode {
    id: entries.require("id")?.to_string(),
    filename: entries.require("node_settings_file")?.to_string(),
  })
}

fn read_connection(element: &Element) -> Result<Connection, WorkflowError> {
  let entries = read_entries(element)?;
  Ok(Connection {
    source_id: entries.require("sourceID")?.to_string(),
    dest_id: entries.require("destID")?.to_string(),
    source_port: entries.require("sourcePort")?.to_string(),
    dest_port: entries.require("destPort")?.to_string(),
  })
}
