use std::path::PathBuf;

/// Directories used by a conversion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertConfig {
  /// Root of the per-node template directories.
  pub templates_dir: PathBuf,
  /// Scratch space; archives are unpacked under `input/` and output is
  /// staged under `output/`.
  pub work_dir: PathBuf,
}

impl ConvertConfig {
  pub fn new(templates_dir: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
    Self {
      templates_dir: templates_dir.into(),
      work_dir: work_dir.into(),
    }
  }

  pub(crate) fn input_dir(&self, workflow: &str) -> PathBuf {
    self.work_dir.join("input").join(workflow)
  }

  pub(crate) fn output_dir(&self, workflow: &str) -> PathBuf {
    self.work_dir.join("output").join(workflow)
  }
}
