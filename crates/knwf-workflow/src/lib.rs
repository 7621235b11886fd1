//! knwf Workflow
//!
//! This crate reads the topology of a workflow out of its top-level
//! `workflow.knime` document: the ordered node list (id and settings file of
//! each node) and the ordered connection list. Node ids referenced by
//! connections are not validated.

mod error;
mod graph;
mod node;
mod topology;

pub use error::WorkflowError;
pub use graph::Graph;
pub use node::{Connection, WorkflowNode};
pub use topology::{Topology, read_topology};
