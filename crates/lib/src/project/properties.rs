//! String-keyed project properties with typed accessors.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::ProjectError;

/// Property keys understood by the workflow.
pub mod keys {
  pub const ACCESS_CONTROL: &str = "lambda_file_access_control";
  pub const BUCKET_PREFIX: &str = "bucket_prefix";
  pub const BUCKET_NAME: &str = "bucket_name";
  pub const TEAMCITY_OUTPUT: &str = "teamcity_output";
  pub const TEAMCITY_PARAMETER: &str = "teamcity_parameter_name";
  pub const PIP_COMMAND: &str = "pip_command";
  pub const IGNORE_INSTALL_FAILURES: &str = "ignore_install_failures";
}

/// Project properties.
///
/// Values are kept as strings; the project file may use TOML booleans and
/// numbers, which are stored in their textual form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<String, PropertyValue>")]
pub struct Properties(BTreeMap<String, String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum PropertyValue {
  Bool(bool),
  Integer(i64),
  Float(f64),
  String(String),
}

impl From<BTreeMap<String, PropertyValue>> for Properties {
  fn from(raw: BTreeMap<String, PropertyValue>) -> Self {
    let values = raw
      .into_iter()
      .map(|(key, value)| {
        let value = match value {
          PropertyValue::Bool(b) => b.to_string(),
          PropertyValue::Integer(i) => i.to_string(),
          PropertyValue::Float(f) => f.to_string(),
          PropertyValue::String(s) => s,
        };
        (key, value)
      })
      .collect();
    Self(values)
  }
}

impl Properties {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
    self.0.insert(key.into(), value.into());
  }

  pub fn get(&self, key: &str) -> Option<&str> {
    self.0.get(key).map(String::as_str)
  }

  pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
    self.get(key).unwrap_or(default)
  }

  /// Get a property that must be present and non-empty.
  pub fn mandatory(&self, key: &str) -> Result<&str, ProjectError> {
    match self.get(key).map(str::trim) {
      Some(value) if !value.is_empty() => Ok(value),
      _ => Err(ProjectError::MissingProperty(key.to_string())),
    }
  }

  /// Interpret a property as a flag. Absent means `false`.
  pub fn get_bool(&self, key: &str) -> Result<bool, ProjectError> {
    let Some(value) = self.get(key) else {
      return Ok(false);
    };

    match value.trim().to_ascii_lowercase().as_str() {
      "true" | "yes" | "on" | "1" => Ok(true),
      "false" | "no" | "off" | "0" | "" => Ok(false),
      _ => Err(ProjectError::InvalidProperty {
        key: key.to_string(),
        value: value.to_string(),
        reason: "expected a boolean".to_string(),
      }),
    }
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

/// Parse a `key=value` override as given on the command line.
///
/// Only the first `=` separates; the value may itself contain `=`.
pub fn parse_override(raw: &str) -> Result<(String, String), ProjectError> {
  match raw.split_once('=') {
    Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
    _ => Err(ProjectError::InvalidOverride(raw.to_string())),
  }
}
