use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::ArchiveError;
use crate::WORKFLOW_FILE;

/// Extract `archive_path` into `dest_dir` and return the directory holding
/// the workflow document.
///
/// Entries whose names would escape `dest_dir` are skipped. The workflow
/// directory is either `dest_dir` itself or its single top-level
/// subdirectory, which is how exported archives are laid out.
pub fn unpack(archive_path: &Path, dest_dir: &Path) -> Result<PathBuf, ArchiveError> {
  let file = fs::File::open(archive_path).map_err(ArchiveError::io(archive_path))?;
  let mut archive = zip::ZipArchive::new(file)?;

  fs::create_dir_all(dest_dir).map_err(ArchiveError::io(dest_dir))?;

  let mut count: usize = 0;
  for i in 0..archive.len() {
    let mut entry = archive.by_index(i)?;

    let entry_path = match entry.enclosed_name() {
      Some(p) => p.to_path_buf(),
      None => {
        warn!(name = entry.name(), "skipping archive entry outside destination");
        continue;
      }
    };

    let output_path = dest_dir.join(&entry_path);

    if entry.is_dir() {
      fs::create_dir_all(&output_path).map_err(ArchiveError::io(&output_path))?;
    } else {
      if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).map_err(ArchiveError::io(parent))?;
      }
      let mut outfile = fs::File::create(&output_path).map_err(ArchiveError::io(&output_path))?;
      io::copy(&mut entry, &mut outfile).map_err(ArchiveError::io(&output_path))?;
      count += 1;
    }
  }

  info!(archive = %archive_path.display(), files = count, "unpacked archive");
  locate_workflow(dest_dir)
}

/// Find the directory holding `workflow.knime`: `root` itself, or its only
/// subdirectory that has one.
pub fn locate_workflow(root: &Path) -> Result<PathBuf, ArchiveError> {
  if root.join(WORKFLOW_FILE).is_file() {
    return Ok(root.to_path_buf());
  }

  let mut candidates = Vec::new();
  for entry in fs::read_dir(root).map_err(ArchiveError::io(root))? {
    let path = entry.map_err(ArchiveError::io(root))?.path();
    if path.is_dir() && path.join(WORKFLOW_FILE).is_file() {
      candidates.push(path);
    }
  }

  match candidates.len() {
    1 => {
      let dir = candidates.remove(0);
      debug!(dir = %dir.display(), "found workflow directory");
      Ok(dir)
    }
    _ => Err(ArchiveError::MissingWorkflow {
      path: root.to_path_buf(),
    }),
  }
}
