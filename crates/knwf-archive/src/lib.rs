//! knwf Archive
//!
//! Unpacking and packing of `.knwf` workflow archives. An archive is a plain
//! zip container; the only difference on output is the extension.

mod error;
mod pack;
mod unpack;

pub use error::ArchiveError;
pub use pack::pack;
pub use unpack::{locate_workflow, unpack};

/// Extension given to packed workflow archives.
pub const ARCHIVE_EXTENSION: &str = "knwf";

/// File name of the top-level workflow document.
pub const WORKFLOW_FILE: &str = "workflow.knime";
