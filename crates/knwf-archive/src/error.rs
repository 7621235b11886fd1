use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while unpacking or packing a workflow archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
  #[error("io error at {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The zip container is corrupt or could not be written.
  #[error("zip error: {0}")]
  Zip(#[from] zip::result::ZipError),

  #[error("failed to walk {}: {source}", path.display())]
  Walk {
    path: PathBuf,
    #[source]
    source: walkdir::Error,
  },

  /// The unpacked archive holds no workflow document.
  #[error("no workflow.knime found under {}", path.display())]
  MissingWorkflow { path: PathBuf },
}

impl ArchiveError {
  pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
    let path = path.into();
    move |source| ArchiveError::Io { path, source }
  }
}
