//! Settings tree serialization into template documents.

use tracing::debug;

use crate::error::SettingsError;
use crate::extract::{MODEL_KEY, is_config};
use crate::template::TemplateStore;
use crate::tree::{Config, Entry, Setting, SettingsTree};
use crate::xml::{Document, Element, Node};

/// Build the output document for one node from its template and tree.
///
/// The tree's children are appended, in order, to the first `config` element
/// keyed `model` (after any children it already has). Everything else in the
/// template is copied unchanged. The template itself is not modified.
pub fn render(template: &Document, tree: &SettingsTree) -> Result<Document, SettingsError> {
  let mut inserted = false;
  let root = embed(&template.root, tree, &mut inserted);
  if !inserted {
    return Err(SettingsError::MissingAnchor {
      key: MODEL_KEY.to_string(),
    });
  }

  Ok(Document {
    declaration: template.declaration.clone(),
    prolog: template.prolog.clone(),
    root,
    epilog: template.epilog.clone(),
  })
}

fn embed(element: &Element, tree: &SettingsTree, inserted: &mut bool) -> Element {
  if !*inserted && is_config(element) && element.attr("key") == Some(MODEL_KEY) {
    *inserted = true;
    let prefix = tag_prefix(&element.name);
    let mut anchor = element.clone();
    anchor.children.extend(
      tree
        .children
        .iter()
        .map(|child| Node::Element(setting_element(child, prefix))),
    );
    return anchor;
  }

  let children = element
    .children
    .iter()
    .map(|child| match child {
      Node::Element(child) => Node::Element(embed(child, tree, inserted)),
      other => other.clone(),
    })
    .collect();

  Element {
    name: element.name.clone(),
    attributes: element.attributes.clone(),
    children,
  }
}

/// Expand one setting into its XML element, using `prefix` (e.g. `"knime:"`)
/// for the tag names.
pub fn setting_element(setting: &Setting, prefix: &str) -> Element {
  match setting {
    Setting::Entry(entry) => entry_element(entry, prefix),
    Setting::Config(config) => config_element(config, prefix),
  }
}

fn entry_element(entry: &Entry, prefix: &str) -> Element {
  let element = Element::new(format!("{prefix}entry"))
    .with_attribute("key", entry.key.as_str())
    .with_attribute("type", entry.value_type.as_str())
    .with_attribute("value", entry.value.as_str());
  if entry.isnull {
    element.with_attribute("isnull", "true")
  } else {
    element
  }
}

fn config_element(config: &Config, prefix: &str) -> Element {
  let mut element = Element::new(format!("{prefix}config")).with_attribute("key", config.key.as_str());
  for child in &config.children {
    element.push_element(setting_element(child, prefix));
  }
  element
}

fn tag_prefix(name: &str) -> &str {
  match name.rfind(':') {
    Some(index) => &name[..=index],
    None => "",
  }
}

/// Serializes settings trees into the templates of a [`TemplateStore`].
pub struct Serializer<S: TemplateStore> {
  store: S,
}

impl<S: TemplateStore> Serializer<S> {
  pub fn new(store: S) -> Self {
    Self { store }
  }

  /// Render `tree` into the template registered for node `name`.
  pub fn serialize(&self, name: &str, tree: &SettingsTree) -> Result<Document, SettingsError> {
    let template = self.store.get(name)?;
    debug!(name, children = tree.len(), "embedding settings into template");
    render(&template, tree)
  }

  /// Like [`Serializer::serialize`], returning XML text.
  pub fn serialize_to_string(&self, name: &str, tree: &SettingsTree) -> Result<String, SettingsError> {
    Ok(self.serialize(name, tree)?.to_xml()?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::extract::extract_model;
  use crate::template::MemoryTemplateStore;

  const TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<config xmlns="http://www.knime.org/2008/09/XMLConfig" key="settings.xml">
  <entry key="node_file" type="xstring" value="settings.xml"/>
  <config key="model"/>
  <config key="variables">
    <entry key="version" type="xstring" value="V_2019_09_13"/>
  </config>
</config>
"#;

  fn tree() -> SettingsTree {
    Config::new("model")
      .with(Entry::new("rowCount", "int", "5"))
      .with(Config::new("sub").with(Entry::new("flag", "boolean", "true").null()))
  }

  #[test]
  fn test_render_fills_anchor() {
    let template = Document::parse(TEMPLATE).unwrap();
    let output = render(&template, &tree()).unwrap();

    let model = output
      .find(&|e: &Element| e.attr("key") == Some("model"))
      .unwrap();
    let children: Vec<_> = model.elements().collect();
    assert_eq!(children.len(), 2);
    assert_eq!(
      children[0].attributes,
      vec![
        ("key".to_string(), "rowCount".to_string()),
        ("type".to_string(), "int".to_string()),
        ("value".to_string(), "5".to_string()),
      ]
    );
    assert_eq!(children[1].name, "config");
    let flag = children[1].elements().next().unwrap();
    assert_eq!(flag.attr("isnull"), Some("true"));
  }

  #[test]
  fn test_render_leaves_rest_of_template_alone() {
    let template = Document::parse(TEMPLATE).unwrap();
    let output = render(&template, &tree()).unwrap();

    assert_eq!(output.declaration, template.declaration);
    assert_eq!(output.root.attributes, template.root.attributes);
    let keys: Vec<_> = output.root.elements().map(|e| e.attr("key").unwrap()).collect();
    assert_eq!(keys, vec!["node_file", "model", "variables"]);
    assert_eq!(
      output.root.elements().nth(2),
      template.root.elements().nth(2)
    );
    // the template is untouched
    assert!(template.root.elements().nth(1).unwrap().children.is_empty());
  }

  #[test]
  fn test_render_appends_after_existing_children() {
    let template = Document::parse(
      r#"<config key="settings.xml">
  <config key="model">
    <entry key="preset" type="xstring" value="p"/>
  </config>
</config>"#,
    )
    .unwrap();
    let output = render(&template, &tree()).unwrap();

    let model = output.root.elements().next().unwrap();
    let keys: Vec<_> = model.elements().map(|e| e.attr("key").unwrap()).collect();
    assert_eq!(keys, vec!["preset", "rowCount", "sub"]);
  }

  #[test]
  fn test_isnull_false_is_written_as_true() {
    let source = Document::parse(
      r#"<config key="settings.xml">
  <config key="model">
    <entry key="limit" type="xint" value="0" isnull="false"/>
  </config>
</config>"#,
    )
    .unwrap();
    let tree = extract_model(&source).unwrap();
    let output = render(&Document::parse(TEMPLATE).unwrap(), &tree).unwrap();

    let limit = output
      .find(&|e: &Element| e.attr("key") == Some("limit"))
      .unwrap();
    assert_eq!(limit.attr("isnull"), Some("true"));
  }

  #[test]
  fn test_render_without_anchor() {
    let template = Document::parse(r#"<config key="settings.xml"/>"#).unwrap();
    assert!(matches!(
      render(&template, &tree()),
      Err(SettingsError::MissingAnchor { .. })
    ));
  }

  #[test]
  fn test_no_isnull_when_flag_unset() {
    let element = setting_element(&Setting::Entry(Entry::new("a", "xstring", "")), "");
    assert!(!element.has_attr("isnull"));
  }

  #[test]
  fn test_prefixed_anchor_keeps_prefix() {
    let template =
      Document::parse(r#"<k:config xmlns:k="urn:k" key="root"><k:config key="model"/></k:config>"#)
        .unwrap();
    let output = render(&template, &tree()).unwrap();
    let model = output.root.elements().next().unwrap();
    let names: Vec<_> = model.elements().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["k:entry", "k:config"]);
  }

  #[test]
  fn test_serialize_round_trip() {
    let serializer = Serializer::new(MemoryTemplateStore::new().with("Row Filter", TEMPLATE));
    let xml = serializer.serialize_to_string("Row Filter", &tree()).unwrap();

    let reread = extract_model(&Document::parse(&xml).unwrap()).unwrap();
    assert_eq!(reread, tree());
  }

  #[test]
  fn test_serialize_unknown_template() {
    let serializer = Serializer::new(MemoryTemplateStore::new());
    assert!(matches!(
      serializer.serialize("Column Filter", &tree()),
      Err(SettingsError::TemplateNotFound { name }) if name == "Column Filter"
    ));
  }
}
