//! knwf Settings
//!
//! This crate holds the node settings model for knwf and the two
//! transformations around it:
//! - extraction of an ordered [`SettingsTree`] from a `config`/`entry` XML
//!   document, starting at a named anchor container
//! - serialization of a tree back into a per-node template document
//!
//! Both sides work on the owned [`xml::Document`] model, so a serialized
//! document is always a new value built from a template and a tree.

mod error;
mod extract;
mod serialize;
mod template;
mod tree;
pub mod xml;

pub use error::{SettingsError, XmlError};
pub use extract::{
  EntryList, MODEL_KEY, NAME_KEY, extract, extract_model, find_container, node_name, read_config,
  read_entries, read_entry,
};
pub use serialize::{Serializer, render, setting_element};
pub use template::{FsTemplateStore, TEMPLATE_FILE, TemplateStore};
pub use tree::{Config, Entry, Setting, SettingsTree};
