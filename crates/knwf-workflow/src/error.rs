use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error("invalid workflow document: {0}")]
  Settings(#[from] knwf_settings::SettingsError),

  #[error("invalid workflow xml: {0}")]
  Xml(#[from] knwf_settings::XmlError),
}
