//! Editable intermediate form of a workflow.
//!
//! This is what gets written to `workflow.json` for the editing step and read
//! back before rebuilding. Node and child order is kept as read.

use std::fs;
use std::path::{Path, PathBuf};

use knwf_settings::SettingsTree;
use knwf_workflow::Topology;
use serde::{Deserialize, Serialize};

use crate::error::ConvertError;

/// File name of the serialized intermediate form.
pub const WORKFLOW_JSON: &str = "workflow.json";

/// One node's settings as extracted from its settings document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSettings {
  pub id: String,
  /// Settings document path relative to the workflow directory.
  pub filename: String,
  /// Node name; selects the template on rebuild.
  pub name: String,
  pub model: SettingsTree,
}

/// A whole extracted workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedWorkflow {
  /// Workflow directory name inside the archive.
  pub name: String,
  /// Unpacked workflow directory the settings were read from.
  pub source_dir: PathBuf,
  pub topology: Topology,
  pub nodes: Vec<NodeSettings>,
}

impl ExtractedWorkflow {
  /// Get a node's settings by ID.
  pub fn node(&self, node_id: &str) -> Option<&NodeSettings> {
    self.nodes.iter().find(|node| node.id == node_id)
  }

  pub fn node_mut(&mut self, node_id: &str) -> Option<&mut NodeSettings> {
    self.nodes.iter_mut().find(|node| node.id == node_id)
  }

  /// Write the workflow as pretty-printed JSON.
  pub fn save(&self, path: &Path) -> Result<(), ConvertError> {
    let json = serde_json::to_string_pretty(self).map_err(|source| ConvertError::Json {
      path: path.to_path_buf(),
      source,
    })?;
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      fs::create_dir_all(parent).map_err(ConvertError::io(parent))?;
    }
    fs::write(path, json).map_err(ConvertError::io(path))
  }

  /// Read a workflow previously written by [`ExtractedWorkflow::save`].
  pub fn load(path: &Path) -> Result<Self, ConvertError> {
    let content = fs::read_to_string(path).map_err(ConvertError::io(path))?;
    serde_json::from_str(&content).map_err(|source| ConvertError::Json {
      path: path.to_path_buf(),
      source,
    })
  }
}

#[cfg(test)]
mod tests {
  use knwf_settings::{Config, Entry};
  use knwf_workflow::WorkflowNode;

  use super::*;

  fn workflow() -> ExtractedWorkflow {
    ExtractedWorkflow {
      name: "Flow".to_string(),
      source_dir: PathBuf::from("/tmp/input/Flow"),
      topology: Topology {
        nodes: vec![WorkflowNode {
          id: "1".to_string(),
          filename: "CSV Reader (#1)/settings.xml".to_string(),
        }],
        connections: Vec::new(),
      },
      nodes: vec![NodeSettings {
        id: "1".to_string(),
        filename: "CSV Reader (#1)/settings.xml".to_string(),
        name: "CSV Reader".to_string(),
        model: Config::new("model").with(Entry::new("url", "xstring", "data.csv")),
      }],
    }
  }

  #[test]
  fn test_save_and_load() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("edit").join(WORKFLOW_JSON);

    workflow().save(&path).unwrap();
    assert_eq!(ExtractedWorkflow::load(&path).unwrap(), workflow());
  }

  #[test]
  fn test_load_invalid_json() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join(WORKFLOW_JSON);
    fs::write(&path, "{ not json").unwrap();

    assert!(matches!(
      ExtractedWorkflow::load(&path),
      Err(ConvertError::Json { .. })
    ));
  }

  #[test]
  fn test_node_lookup() {
    let mut workflow = workflow();
    assert_eq!(workflow.node("1").unwrap().name, "CSV Reader");
    assert!(workflow.node("2").is_none());

    workflow
      .node_mut("1")
      .unwrap()
      .model
      .set_value("url", "other.csv");
    assert_eq!(workflow.nodes[0].model.entry("url").unwrap().value, "other.csv");
  }
}
