use serde::{Deserialize, Serialize};

/// A node listed in the workflow document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowNode {
  pub id: String,
  /// Settings document path, relative to the workflow directory.
  pub filename: String,
}

/// A connection between two node ports.
///
/// Node ids are not checked against the node list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
  pub source_id: String,
  pub dest_id: String,
  pub source_port: String,
  pub dest_port: String,
}
