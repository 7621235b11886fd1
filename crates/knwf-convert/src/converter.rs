use std::fs;
use std::path::{Component, Path, PathBuf};

use knwf_archive::WORKFLOW_FILE;
use knwf_settings::xml::Document;
use knwf_settings::{FsTemplateStore, Serializer, TemplateStore, extract_model, node_name};
use knwf_workflow::{Topology, WorkflowNode};
use tracing::{debug, info, instrument};

use crate::config::ConvertConfig;
use crate::error::ConvertError;
use crate::model::{ExtractedWorkflow, NodeSettings};

const FALLBACK_NAME: &str = "workflow";

/// Runs conversions between workflow archives and their editable form.
pub struct Converter<S: TemplateStore = FsTemplateStore> {
  config: ConvertConfig,
  serializer: Serializer<S>,
}

impl Converter<FsTemplateStore> {
  /// Create a converter reading templates from `config.templates_dir`.
  pub fn new(config: ConvertConfig) -> Self {
    let store = FsTemplateStore::new(&config.templates_dir);
    Self::with_store(config, store)
  }
}

impl<S: TemplateStore> Converter<S> {
  /// Create a converter with a custom template store.
  pub fn with_store(config: ConvertConfig, store: S) -> Self {
    Self {
      config,
      serializer: Serializer::new(store),
    }
  }

  /// Unpack `archive` into the work directory and extract every node's
  /// settings tree. Archives whose stem is not a plain name (`...knwf`)
  /// unpack under `input/workflow`.
  #[instrument(name = "extract", skip(self, archive), fields(archive = %archive.display()))]
  pub fn extract(&self, archive: &Path) -> Result<ExtractedWorkflow, ConvertError> {
    let stem = archive
      .file_stem()
      .and_then(|s| s.to_str())
      .filter(|s| is_plain_name(s))
      .unwrap_or(FALLBACK_NAME);
    let input_dir = self.config.input_dir(stem);
    clear_dir(&input_dir)?;

    let root = knwf_archive::unpack(archive, &input_dir)?;
    read_workflow_dir(&root)
  }

  /// Serialize every node into its template under the work directory and
  /// pack the result into `<desired_name>.knwf`.
  #[instrument(name = "build", skip(self, workflow), fields(workflow = %workflow.name))]
  pub fn build(
    &self,
    workflow: &ExtractedWorkflow,
    desired_name: &Path,
  ) -> Result<PathBuf, ConvertError> {
    if !is_plain_name(&workflow.name) {
      return Err(ConvertError::InvalidWorkflowName {
        name: workflow.name.clone(),
      });
    }
    let stage_dir = self.config.output_dir(&workflow.name);
    clear_dir(&stage_dir)?;

    write_workflow_dir(workflow, &self.serializer, &stage_dir.join(&workflow.name))?;
    let archive = knwf_archive::pack(&stage_dir, desired_name)?;

    info!(archive = %archive.display(), "workflow rebuilt");
    Ok(archive)
  }

  /// Extract and rebuild without an editing step in between.
  pub fn convert(&self, archive: &Path, desired_name: &Path) -> Result<PathBuf, ConvertError> {
    let workflow = self.extract(archive)?;
    self.build(&workflow, desired_name)
  }
}

/// Read the topology and every node's settings from an unpacked workflow
/// directory.
pub fn read_workflow_dir(root: &Path) -> Result<ExtractedWorkflow, ConvertError> {
  let workflow_path = root.join(WORKFLOW_FILE);
  let content = fs::read_to_string(&workflow_path).map_err(ConvertError::io(&workflow_path))?;
  let topology = Topology::from_xml(&content)?;

  info!(
    nodes = topology.nodes.len(),
    connections = topology.connections.len(),
    "read workflow topology"
  );

  let nodes = topology
    .nodes
    .iter()
    .map(|node| read_node_settings(root, node))
    .collect::<Result<Vec<_>, _>>()?;

  let name = root
    .file_name()
    .and_then(|n| n.to_str())
    .unwrap_or(FALLBACK_NAME)
    .to_string();

  Ok(ExtractedWorkflow {
    name,
    source_dir: root.to_path_buf(),
    topology,
    nodes,
  })
}

/// Extract one node's name and model tree from its settings document.
pub fn read_node_settings(root: &Path, node: &WorkflowNode) -> Result<NodeSettings, ConvertError> {
  let path = root.join(settings_path(&node.id, &node.filename)?);
  let content = fs::read_to_string(&path).map_err(ConvertError::io(&path))?;
  let document = Document::parse(&content).map_err(|err| ConvertError::Node {
    node_id: node.id.clone(),
    source: err.into(),
  })?;

  let name = node_name(&document).map_err(ConvertError::node(&node.id))?;
  let model = extract_model(&document).map_err(ConvertError::node(&node.id))?;
  debug!(node_id = %node.id, name = %name, entries = model.entry_count(), "extracted node settings");

  Ok(NodeSettings {
    id: node.id.clone(),
    filename: node.filename.clone(),
    name,
    model,
  })
}

/// Write the workflow document and one templated settings document per node
/// into `dest`.
pub fn write_workflow_dir<S: TemplateStore>(
  workflow: &ExtractedWorkflow,
  serializer: &Serializer<S>,
  dest: &Path,
) -> Result<(), ConvertError> {
  fs::create_dir_all(dest).map_err(ConvertError::io(dest))?;

  let source = workflow.source_dir.join(WORKFLOW_FILE);
  let target = dest.join(WORKFLOW_FILE);
  fs::copy(&source, &target).map_err(ConvertError::io(&source))?;

  for node in &workflow.nodes {
    let path = dest.join(settings_path(&node.id, &node.filename)?);
    let xml = serializer
      .serialize_to_string(&node.name, &node.model)
      .map_err(ConvertError::node(&node.id))?;

    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).map_err(ConvertError::io(parent))?;
    }
    fs::write(&path, xml).map_err(ConvertError::io(&path))?;
    debug!(node_id = %node.id, path = %path.display(), "wrote node settings");
  }

  Ok(())
}

/// Validate a node's settings file path: relative, with plain components only.
fn settings_path<'a>(node_id: &str, filename: &'a str) -> Result<&'a Path, ConvertError> {
  let path = Path::new(filename);
  let plain = path.components().count() > 0
    && path
      .components()
      .all(|component| matches!(component, Component::Normal(_)));
  if plain {
    Ok(path)
  } else {
    Err(ConvertError::UnsafePath {
      node_id: node_id.to_string(),
      filename: filename.to_string(),
    })
  }
}

/// A single normal path component, usable as a directory name.
fn is_plain_name(name: &str) -> bool {
  let mut components = Path::new(name).components();
  matches!(
    (components.next(), components.next()),
    (Some(Component::Normal(_)), None)
  )
}

/// Remove a previous run's leftovers and recreate the directory.
fn clear_dir(dir: &Path) -> Result<(), ConvertError> {
  if dir.exists() {
    fs::remove_dir_all(dir).map_err(ConvertError::io(dir))?;
  }
  fs::create_dir_all(dir).map_err(ConvertError::io(dir))
}
