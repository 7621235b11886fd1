//! Settings tree types.
//!
//! A node's configuration is an ordered tree of [`Setting`]s. Children are kept
//! in a `Vec` so that document order survives extraction, JSON editing and
//! serialization unchanged; duplicate keys are kept as-is.

use serde::{Deserialize, Serialize};

/// A typed key/value leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
  pub key: String,
  /// Raw value text. Typing is carried by `value_type` only.
  pub value: String,
  /// Declared type, passed through verbatim (e.g. "xint", "xstring").
  #[serde(rename = "type")]
  pub value_type: String,
  /// Set when the source element carried an `isnull` attribute.
  #[serde(default, skip_serializing_if = "std::ops::Not::not")]
  pub isnull: bool,
}

impl Entry {
  pub fn new(
    key: impl Into<String>,
    value_type: impl Into<String>,
    value: impl Into<String>,
  ) -> Self {
    Self {
      key: key.into(),
      value: value.into(),
      value_type: value_type.into(),
      isnull: false,
    }
  }

  /// Mark the entry as null. The value text is left untouched.
  pub fn null(mut self) -> Self {
    self.isnull = true;
    self
  }
}

/// A named, ordered container of settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
  pub key: String,
  #[serde(default)]
  pub children: Vec<Setting>,
}

/// One child of a [`Config`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Setting {
  Entry(Entry),
  Config(Config),
}

/// The root of a node's settings: the config found under the `model` anchor.
pub type SettingsTree = Config;

impl Setting {
  pub fn key(&self) -> &str {
    match self {
      Setting::Entry(entry) => &entry.key,
      Setting::Config(config) => &config.key,
    }
  }

  pub fn as_entry(&self) -> Option<&Entry> {
    match self {
      Setting::Entry(entry) => Some(entry),
      Setting::Config(_) => None,
    }
  }

  pub fn as_config(&self) -> Option<&Config> {
    match self {
      Setting::Config(config) => Some(config),
      Setting::Entry(_) => None,
    }
  }
}

impl From<Entry> for Setting {
  fn from(entry: Entry) -> Self {
    Setting::Entry(entry)
  }
}

impl From<Config> for Setting {
  fn from(config: Config) -> Self {
    Setting::Config(config)
  }
}

impl Config {
  pub fn new(key: impl Into<String>) -> Self {
    Self {
      key: key.into(),
      children: Vec::new(),
    }
  }

  /// Builder-style child append.
  pub fn with(mut self, child: impl Into<Setting>) -> Self {
    self.children.push(child.into());
    self
  }

  pub fn push(&mut self, child: impl Into<Setting>) {
    self.children.push(child.into());
  }

  pub fn len(&self) -> usize {
    self.children.len()
  }

  pub fn is_empty(&self) -> bool {
    self.children.is_empty()
  }

  /// First direct child with the given key.
  pub fn get(&self, key: &str) -> Option<&Setting> {
    self.children.iter().find(|child| child.key() == key)
  }

  pub fn get_mut(&mut self, key: &str) -> Option<&mut Setting> {
    self.children.iter_mut().find(|child| child.key() == key)
  }

  /// First direct entry child with the given key.
  pub fn entry(&self, key: &str) -> Option<&Entry> {
    self.children.iter().find_map(|child| match child {
      Setting::Entry(entry) if entry.key == key => Some(entry),
      _ => None,
    })
  }

  pub fn entry_mut(&mut self, key: &str) -> Option<&mut Entry> {
    self.children.iter_mut().find_map(|child| match child {
      Setting::Entry(entry) if entry.key == key => Some(entry),
      _ => None,
    })
  }

  /// First direct config child with the given key.
  pub fn config(&self, key: &str) -> Option<&Config> {
    self.children.iter().find_map(|child| match child {
      Setting::Config(config) if config.key == key => Some(config),
      _ => None,
    })
  }

  pub fn config_mut(&mut self, key: &str) -> Option<&mut Config> {
    self.children.iter_mut().find_map(|child| match child {
      Setting::Config(config) if config.key == key => Some(config),
      _ => None,
    })
  }

  /// Resolve a `/`-separated key path, e.g. `"sub/flag"`.
  ///
  /// Every segment but the last must name a config.
  pub fn lookup(&self, path: &str) -> Option<&Setting> {
    let (parents, last) = split_path(path)?;
    let mut current = self;
    for segment in parents {
      current = current.config(segment)?;
    }
    current.get(last)
  }

  pub fn lookup_mut(&mut self, path: &str) -> Option<&mut Setting> {
    let (parents, last) = split_path(path)?;
    let mut current = self;
    for segment in parents {
      current = current.config_mut(segment)?;
    }
    current.get_mut(last)
  }

  /// Replace the value of the entry at `path`. Returns false when the path
  /// does not lead to an entry. The `isnull` flag is left as it is.
  pub fn set_value(&mut self, path: &str, value: impl Into<String>) -> bool {
    match self.lookup_mut(path) {
      Some(Setting::Entry(entry)) => {
        entry.value = value.into();
        true
      }
      _ => false,
    }
  }

  /// Number of entries in the whole subtree.
  pub fn entry_count(&self) -> usize {
    self
      .children
      .iter()
      .map(|child| match child {
        Setting::Entry(_) => 1,
        Setting::Config(config) => config.entry_count(),
      })
      .sum()
  }
}

fn split_path(path: &str) -> Option<(Vec<&str>, &str)> {
  let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
  let last = segments.pop()?;
  Some((segments, last))
}
