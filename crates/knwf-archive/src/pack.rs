use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use crate::error::ArchiveError;
use crate::ARCHIVE_EXTENSION;

/// Zip the contents of `source_dir` into `<desired_name>.zip`, then rename
/// the result to `<desired_name>.knwf` and return its path.
///
/// Entries are written in sorted order with `/` separators, relative to
/// `source_dir`.
pub fn pack(source_dir: &Path, desired_name: &Path) -> Result<PathBuf, ArchiveError> {
  let zip_path = with_suffix(desired_name, "zip");
  let archive_path = with_suffix(desired_name, ARCHIVE_EXTENSION);

  if let Some(parent) = zip_path.parent()
    && !parent.as_os_str().is_empty()
  {
    fs::create_dir_all(parent).map_err(ArchiveError::io(parent))?;
  }

  let file = fs::File::create(&zip_path).map_err(ArchiveError::io(&zip_path))?;
  let mut writer = zip::ZipWriter::new(file);
  let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

  let mut count: usize = 0;
  for entry in WalkDir::new(source_dir).min_depth(1).sort_by_file_name() {
    let entry = entry.map_err(|source| ArchiveError::Walk {
      path: source_dir.to_path_buf(),
      source,
    })?;
    let name = entry_name(source_dir, entry.path());

    if entry.file_type().is_dir() {
      writer.add_directory(name, options)?;
    } else {
      writer.start_file(name, options)?;
      let mut input = fs::File::open(entry.path()).map_err(ArchiveError::io(entry.path()))?;
      io::copy(&mut input, &mut writer).map_err(ArchiveError::io(entry.path()))?;
      count += 1;
    }
  }
  writer.finish()?;

  fs::rename(&zip_path, &archive_path).map_err(ArchiveError::io(&archive_path))?;
  info!(archive = %archive_path.display(), files = count, "packed archive");
  Ok(archive_path)
}

fn with_suffix(base: &Path, extension: &str) -> PathBuf {
  let mut name = OsString::from(base.as_os_str());
  name.push(".");
  name.push(extension);
  PathBuf::from(name)
}

fn entry_name(root: &Path, path: &Path) -> String {
  let relative = path.strip_prefix(root).unwrap_or(path);
  relative
    .components()
    .map(|c| c.as_os_str().to_string_lossy())
    .collect::<Vec<_>>()
    .join("/")
}
