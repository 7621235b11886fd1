use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or writing XML text.
#[derive(Debug, Error)]
pub enum XmlError {
  /// The underlying parser rejected the input.
  #[error("malformed xml at byte {position}: {message}")]
  Malformed { position: usize, message: String },

  /// Start and end tags do not balance.
  #[error("unbalanced xml: {0}")]
  Unbalanced(String),

  /// The document has no root element.
  #[error("xml document has no root element")]
  NoRoot,

  /// Writing the document back to text failed.
  #[error("failed to write xml: {0}")]
  Write(String),
}

/// Errors that can occur while extracting or serializing a settings tree.
#[derive(Debug, Error)]
pub enum SettingsError {
  /// No `config` element carries the requested key.
  #[error("missing anchor container: config key=\"{key}\"")]
  MissingAnchor { key: String },

  /// An `entry` or `config` element lacks a required attribute.
  #[error("<{element}> is missing required attribute '{attribute}'")]
  MissingAttribute { element: String, attribute: String },

  /// A container lacks a required named entry.
  #[error("missing entry: key=\"{key}\"")]
  MissingEntry { key: String },

  /// No template is available for the node name.
  #[error("no template found for node '{name}'")]
  TemplateNotFound { name: String },

  #[error(transparent)]
  Xml(#[from] XmlError),

  #[error("io error at {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}
