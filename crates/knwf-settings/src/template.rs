use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::SettingsError;
use crate::xml::Document;

/// File name of a template inside its node directory.
pub const TEMPLATE_FILE: &str = "settings_no_model.xml";

/// Source of per-node template documents, keyed by node name.
pub trait TemplateStore {
  /// Load the template for `name`, failing with `TemplateNotFound` when the
  /// store has none.
  fn get(&self, name: &str) -> Result<Document, SettingsError>;
}

impl<T: TemplateStore + ?Sized> TemplateStore for &T {
  fn get(&self, name: &str) -> Result<Document, SettingsError> {
    (**self).get(name)
  }
}

/// Filesystem-based template store.
///
/// Templates are stored one directory per node name:
/// ```text
/// {root}/
/// ├── CSV Reader/
/// │   └── settings_no_model.xml
/// └── Row Filter/
///     └── settings_no_model.xml
/// ```
pub struct FsTemplateStore {
  root: PathBuf,
}

impl FsTemplateStore {
  /// Create a new store at the given root path.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// Path of the template for `name`. Names that are not a single plain path
  /// component (separators, `..`) have no path.
  pub fn template_path(&self, name: &str) -> Option<PathBuf> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
      (Some(Component::Normal(_)), None) => Some(self.root.join(name).join(TEMPLATE_FILE)),
      _ => None,
    }
  }
}

impl TemplateStore for FsTemplateStore {
  fn get(&self, name: &str) -> Result<Document, SettingsError> {
    let path = match self.template_path(name) {
      Some(path) if path.is_file() => path,
      _ => {
        return Err(SettingsError::TemplateNotFound {
          name: name.to_string(),
        });
      }
    };

    debug!(name, path = %path.display(), "loading template");
    let content = fs::read_to_string(&path).map_err(|source| SettingsError::Io {
      path: path.clone(),
      source,
    })?;
    Ok(Document::parse(&content)?)
  }
}

/// In-memory template store holding raw template text.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryTemplateStore {
  templates: std::collections::HashMap<String, String>,
}

#[cfg(test)]
impl MemoryTemplateStore {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  pub(crate) fn with(mut self, name: &str, xml: &str) -> Self {
    self.templates.insert(name.to_string(), xml.to_string());
    self
  }
}

#[cfg(test)]
impl TemplateStore for MemoryTemplateStore {
  fn get(&self, name: &str) -> Result<Document, SettingsError> {
    let xml = self
      .templates
      .get(name)
      .ok_or_else(|| SettingsError::TemplateNotFound {
        name: name.to_string(),
      })?;
    Ok(Document::parse(xml)?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const TEMPLATE: &str = r#"<config key="settings.xml"><config key="model"/></config>"#;

  fn write_template(root: &Path, name: &str) {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(TEMPLATE_FILE), TEMPLATE).unwrap();
  }

  #[test]
  fn test_get_existing_template() {
    let temp = tempfile::tempdir().unwrap();
    write_template(temp.path(), "Row Filter");

    let store = FsTemplateStore::new(temp.path());
    let doc = store.get("Row Filter").unwrap();
    assert_eq!(doc.root.attr("key"), Some("settings.xml"));
  }

  #[test]
  fn test_get_missing_template() {
    let temp = tempfile::tempdir().unwrap();
    let store = FsTemplateStore::new(temp.path());
    assert!(matches!(
      store.get("Row Filter"),
      Err(SettingsError::TemplateNotFound { name }) if name == "Row Filter"
    ));
  }

  #[test]
  fn test_path_like_names_never_resolve() {
    let store = FsTemplateStore::new("/templates");
    assert_eq!(store.template_path("../etc"), None);
    assert_eq!(store.template_path("a/b"), None);
    assert_eq!(store.template_path(""), None);
    assert_eq!(
      store.template_path("Row Filter"),
      Some(PathBuf::from("/templates/Row Filter/settings_no_model.xml"))
    );
  }
}
