//! knwf Convert
//!
//! Orchestrates a conversion run: unpack a workflow archive, read its
//! topology, extract each node's settings tree into an editable
//! [`ExtractedWorkflow`], and later rebuild an archive by serializing each
//! tree into its node template.
//!
//! Runs are synchronous and fail fast: the first error aborts the run and
//! output left in the work directory is not guaranteed consistent.

mod config;
mod converter;
mod error;
mod model;

pub use config::ConvertConfig;
pub use converter::{Converter, read_node_settings, read_workflow_dir, write_workflow_dir};
pub use error::ConvertError;
pub use model::{ExtractedWorkflow, NodeSettings, WORKFLOW_JSON};
