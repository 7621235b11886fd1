use std::path::PathBuf;

use knwf_archive::ArchiveError;
use knwf_settings::SettingsError;
use knwf_workflow::WorkflowError;
use thiserror::Error;

/// Errors that can occur during a conversion run. Every variant aborts the run.
#[derive(Debug, Error)]
pub enum ConvertError {
  #[error("archive error: {0}")]
  Archive(#[from] ArchiveError),

  #[error("workflow error: {0}")]
  Workflow(#[from] WorkflowError),

  /// Extraction or serialization of one node's settings failed.
  #[error("node {node_id}: {source}")]
  Node {
    node_id: String,
    #[source]
    source: SettingsError,
  },

  /// A node's settings file path would leave the workflow directory.
  #[error("node {node_id}: settings file '{filename}' is not a relative path inside the workflow")]
  UnsafePath { node_id: String, filename: String },

  /// The workflow name cannot be used as a directory name.
  #[error("workflow name '{name}' is not a plain directory name")]
  InvalidWorkflowName { name: String },

  #[error("io error at {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid workflow json at {}: {source}", path.display())]
  Json {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

impl ConvertError {
  pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
    let path = path.into();
    move |source| ConvertError::Io { path, source }
  }

  pub(crate) fn node(node_id: &str) -> impl FnOnce(SettingsError) -> Self {
    let node_id = node_id.to_string();
    move |source| ConvertError::Node { node_id, source }
  }
}
