//! Settings tree extraction from `config`/`entry` documents.

use crate::error::SettingsError;
use crate::tree::{Config, Entry, Setting, SettingsTree};
use crate::xml::{Document, Element};

/// Key of the container holding a node's editable settings.
pub const MODEL_KEY: &str = "model";
/// Key of the root-level entry naming a node's template.
pub const NAME_KEY: &str = "name";

const CONFIG_TAG: &str = "config";
const ENTRY_TAG: &str = "entry";

pub(crate) fn is_config(element: &Element) -> bool {
  element.local_name() == CONFIG_TAG
}

pub(crate) fn is_entry(element: &Element) -> bool {
  element.local_name() == ENTRY_TAG
}

/// Locate the first `config` element keyed `key`, in document order.
pub fn find_container<'a>(document: &'a Document, key: &str) -> Result<&'a Element, SettingsError> {
  document
    .find(&|element: &Element| is_config(element) && element.attr("key") == Some(key))
    .ok_or_else(|| SettingsError::MissingAnchor {
      key: key.to_string(),
    })
}

/// Extract the tree under the container keyed `anchor`.
pub fn extract(document: &Document, anchor: &str) -> Result<SettingsTree, SettingsError> {
  read_config(find_container(document, anchor)?)
}

/// Extract the tree under the `model` anchor.
pub fn extract_model(document: &Document) -> Result<SettingsTree, SettingsError> {
  extract(document, MODEL_KEY)
}

/// Read the template name from the first `name` entry directly under the
/// root. Only that entry's `value` is required; sibling entries are not read.
pub fn node_name(document: &Document) -> Result<String, SettingsError> {
  let entry = document
    .root
    .elements()
    .find(|child| is_entry(child) && child.attr("key") == Some(NAME_KEY))
    .ok_or_else(|| SettingsError::MissingEntry {
      key: NAME_KEY.to_string(),
    })?;
  Ok(required_attr(entry, "value")?.to_string())
}

/// Recursively read a `config` element. Only direct children are visited at
/// each level; tags other than `config` and `entry` are skipped.
pub fn read_config(element: &Element) -> Result<Config, SettingsError> {
  let mut config = Config::new(required_attr(element, "key")?);
  for child in element.elements() {
    if is_entry(child) {
      config.push(Setting::Entry(read_entry(child)?));
    } else if is_config(child) {
      config.push(Setting::Config(read_config(child)?));
    }
  }
  Ok(config)
}

/// Read one `entry` element. Any `isnull` attribute marks the entry null,
/// whatever its literal value.
pub fn read_entry(element: &Element) -> Result<Entry, SettingsError> {
  Ok(Entry {
    key: required_attr(element, "key")?.to_string(),
    value: required_attr(element, "value")?.to_string(),
    value_type: required_attr(element, "type")?.to_string(),
    isnull: element.has_attr("isnull"),
  })
}

/// Flat list of the direct `entry` children of one container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryList(Vec<Entry>);

impl EntryList {
  /// Value of the first entry keyed `key`.
  pub fn value(&self, key: &str) -> Option<&str> {
    self
      .0
      .iter()
      .find(|entry| entry.key == key)
      .map(|entry| entry.value.as_str())
  }

  /// Like [`EntryList::value`], failing with `MissingEntry` when absent.
  pub fn require(&self, key: &str) -> Result<&str, SettingsError> {
    self.value(key).ok_or_else(|| SettingsError::MissingEntry {
      key: key.to_string(),
    })
  }
}

/// Read the direct `entry` children of `element` without descending into
/// nested containers.
pub fn read_entries(element: &Element) -> Result<EntryList, SettingsError> {
  let entries = element
    .elements()
    .filter(|child| is_entry(child))
    .map(read_entry)
    .collect::<Result<Vec<_>, _>>()?;
  Ok(EntryList(entries))
}

fn required_attr<'a>(element: &'a Element, attribute: &str) -> Result<&'a str, SettingsError> {
  element
    .attr(attribute)
    .ok_or_else(|| SettingsError::MissingAttribute {
      element: element.local_name().to_string(),
      attribute: attribute.to_string(),
    })
}

#[cfg(test)]
mod tests {
  use super::*;

  const SETTINGS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<config xmlns="http://www.knime.org/2008/09/XMLConfig" key="settings.xml">
  <entry key="node_file" type="xstring" value="settings.xml"/>
  <entry key="name" type="xstring" value="Row Filter"/>
  <config key="model">
    <entry key="rowCount" type="int" value="5"/>
    <config key="sub">
      <entry key="flag" type="boolean" value="true" isnull="true"/>
    </config>
  </config>
</config>
"#;

  fn parse(xml: &str) -> Document {
    Document::parse(xml).unwrap()
  }

  #[test]
  fn test_extract_model_in_order() {
    let tree = extract_model(&parse(SETTINGS)).unwrap();

    assert_eq!(tree.key, "model");
    assert_eq!(tree.len(), 2);
    assert_eq!(
      tree.children[0],
      Setting::Entry(Entry::new("rowCount", "int", "5"))
    );
    assert_eq!(
      tree.children[1],
      Setting::Config(Config::new("sub").with(Entry::new("flag", "boolean", "true").null()))
    );
  }

  #[test]
  fn test_node_name() {
    assert_eq!(node_name(&parse(SETTINGS)).unwrap(), "Row Filter");
  }

  #[test]
  fn test_node_name_needs_only_value() {
    let doc = parse(
      r#"<config key="settings.xml">
        <entry key="customDescription" type="xstring" isnull="true"/>
        <entry key="name" value="Row Filter"/>
        <config key="model"><entry key="name" type="xstring" value="inner"/></config>
      </config>"#,
    );
    assert_eq!(node_name(&doc).unwrap(), "Row Filter");
  }

  #[test]
  fn test_node_name_errors() {
    let doc = parse(r#"<config key="settings.xml"><config key="model"/></config>"#);
    assert!(matches!(
      node_name(&doc),
      Err(SettingsError::MissingEntry { key }) if key == "name"
    ));

    let doc = parse(r#"<config key="settings.xml"><entry key="name" type="xstring"/></config>"#);
    assert!(matches!(
      node_name(&doc),
      Err(SettingsError::MissingAttribute { attribute, .. }) if attribute == "value"
    ));
  }

  #[test]
  fn test_missing_model_anchor() {
    let doc = parse(r#"<config key="settings.xml"><entry key="a" type="xint" value="1"/></config>"#);
    let err = extract_model(&doc).unwrap_err();
    assert!(matches!(err, SettingsError::MissingAnchor { key } if key == "model"));
  }

  #[test]
  fn test_entry_keyed_model_is_not_an_anchor() {
    let doc = parse(r#"<config key="root"><entry key="model" type="xstring" value="x"/></config>"#);
    assert!(matches!(
      extract_model(&doc),
      Err(SettingsError::MissingAnchor { .. })
    ));
  }

  #[test]
  fn test_missing_type_attribute() {
    let doc = parse(r#"<config key="model"><entry key="rowCount" value="5"/></config>"#);
    let err = extract_model(&doc).unwrap_err();
    assert!(matches!(
      err,
      SettingsError::MissingAttribute { element, attribute } if element == "entry" && attribute == "type"
    ));
  }

  #[test]
  fn test_isnull_presence_only() {
    let doc = parse(
      r#"<config key="model">
        <entry key="a" type="xstring" value="" isnull="false"/>
        <entry key="b" type="xstring" value="x"/>
      </config>"#,
    );
    let tree = extract_model(&doc).unwrap();
    assert!(tree.entry("a").unwrap().isnull);
    assert!(!tree.entry("b").unwrap().isnull);
  }

  #[test]
  fn test_unknown_tags_are_skipped() {
    let doc = parse(
      r#"<config key="model">
        <!-- comment -->
        <note>ignored <entry key="deep" type="xint" value="1"/></note>
        <entry key="kept" type="xint" value="2"/>
      </config>"#,
    );
    let tree = extract_model(&doc).unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.children[0].key(), "kept");
  }

  #[test]
  fn test_duplicate_keys_are_preserved() {
    let doc = parse(
      r#"<config key="model">
        <entry key="k" type="xint" value="1"/>
        <entry key="k" type="xint" value="2"/>
      </config>"#,
    );
    let tree = extract_model(&doc).unwrap();
    let values: Vec<_> = tree
      .children
      .iter()
      .filter_map(Setting::as_entry)
      .map(|e| e.value.as_str())
      .collect();
    assert_eq!(values, vec!["1", "2"]);
  }

  #[test]
  fn test_read_entries_is_flat() {
    let doc = parse(
      r#"<config key="node_1">
        <entry key="id" type="xint" value="1"/>
        <config key="ui_settings"><entry key="id" type="xint" value="99"/></config>
        <entry key="node_settings_file" type="xstring" value="File Reader (#1)/settings.xml"/>
      </config>"#,
    );
    let entries = read_entries(&doc.root).unwrap();
    assert_eq!(entries.value("id"), Some("1"));
    assert_eq!(
      entries.value("node_settings_file"),
      Some("File Reader (#1)/settings.xml")
    );
    assert!(matches!(
      entries.require("missing"),
      Err(SettingsError::MissingEntry { key }) if key == "missing"
    ));
  }
}
