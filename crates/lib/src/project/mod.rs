//! Project descriptor.
//!
//! A project is described by a TOML file (`lambdapack.toml`):
//!
//! ```toml
//! [project]
//! name = "myfunc"
//! version = "1.2.3"
//! dependencies = ["requests>=2.0", { name = "six", version = "1.16" }]
//!
//! [layout]
//! target_dir = "target"
//!
//! [properties]
//! bucket_name = "my-bucket"
//! teamcity_output = true
//! ```
//!
//! Paths in `[layout]` are relative to the directory holding the file.
//! Properties given on the command line replace those from the file.

mod properties;
mod types;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::consts::DEPENDENCIES_DIR;

pub use properties::{Properties, keys, parse_override};
pub use types::{Dependency, Layout, normalize_name};

/// Errors raised while loading or querying the project configuration.
#[derive(Debug, Error)]
pub enum ProjectError {
  #[error("project file not found: {}", path.display())]
  NotFound { path: PathBuf },

  #[error("failed to read project file {}: {source}", path.display())]
  Read { path: PathBuf, source: io::Error },

  #[error("failed to parse project file {}: {source}", path.display())]
  Parse { path: PathBuf, source: toml::de::Error },

  #[error("failed to canonicalize path {}: {source}", path.display())]
  Canonicalize { path: PathBuf, source: io::Error },

  #[error("project {0} must not be empty")]
  EmptyField(&'static str),

  #[error("missing mandatory property '{0}'")]
  MissingProperty(String),

  #[error("invalid value '{value}' for property '{key}': {reason}")]
  InvalidProperty { key: String, value: String, reason: String },

  #[error("invalid property override '{0}': expected key=value")]
  InvalidOverride(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProjectFile {
  project: ProjectSection,
  #[serde(default)]
  layout: Layout,
  #[serde(default)]
  properties: Properties,
}

#[derive(Debug, Deserialize)]
struct ProjectSection {
  name: String,
  version: String,
  #[serde(default)]
  dependencies: Vec<Dependency>,
}

/// The project being packaged. Read-only for the duration of a run.
#[derive(Debug, Clone)]
pub struct Project {
  pub name: String,
  pub version: String,
  pub dependencies: Vec<Dependency>,
  pub properties: Properties,
  pub layout: Layout,
  root: PathBuf,
}

impl Project {
  /// Create a project rooted at `root` with the default layout.
  pub fn new(name: impl Into<String>, version: impl Into<String>, root: impl Into<PathBuf>) -> Self {
    Self {
      name: name.into(),
      version: version.into(),
      dependencies: Vec::new(),
      properties: Properties::new(),
      layout: Layout::default(),
      root: root.into(),
    }
  }

  pub fn with_dependency(mut self, dependency: Dependency) -> Self {
    self.dependencies.push(dependency);
    self
  }

  pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.properties.set(key, value);
    self
  }

  /// Load a project file and apply `key=value` overrides on top of its properties.
  pub fn load(path: &Path, overrides: &[(String, String)]) -> Result<Self, ProjectError> {
    let content = match fs::read_to_string(path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        return Err(ProjectError::NotFound {
          path: path.to_path_buf(),
        });
      }
      Err(e) => {
        return Err(ProjectError::Read {
          path: path.to_path_buf(),
          source: e,
        });
      }
    };

    let file: ProjectFile = toml::from_str(&content).map_err(|e| ProjectError::Parse {
      path: path.to_path_buf(),
      source: e,
    })?;

    let root = match path.parent() {
      Some(parent) if !parent.as_os_str().is_empty() => parent,
      _ => Path::new("."),
    };
    let root = dunce::canonicalize(root).map_err(|e| ProjectError::Canonicalize {
      path: root.to_path_buf(),
      source: e,
    })?;

    let mut project = Self {
      name: file.project.name.trim().to_string(),
      version: file.project.version.trim().to_string(),
      dependencies: file.project.dependencies,
      properties: file.properties,
      layout: file.layout,
      root,
    };

    for (key, value) in overrides {
      debug!(key = %key, value = %value, "property override");
      project.properties.set(key.clone(), value.clone());
    }

    project.validate()?;
    Ok(project)
  }

  fn validate(&self) -> Result<(), ProjectError> {
    if self.name.is_empty() {
      return Err(ProjectError::EmptyField("name"));
    }
    if self.version.is_empty() {
      return Err(ProjectError::EmptyField("version"));
    }
    Ok(())
  }

  /// Directory holding the project file.
  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn target_dir(&self) -> PathBuf {
    self.root.join(&self.layout.target_dir)
  }

  pub fn source_dir(&self) -> PathBuf {
    self.root.join(&self.layout.source_dir)
  }

  pub fn scripts_dir(&self) -> PathBuf {
    self.root.join(&self.layout.scripts_dir)
  }

  /// Where dependencies are installed before archiving.
  pub fn dependencies_dir(&self) -> PathBuf {
    self.target_dir().join(DEPENDENCIES_DIR)
  }

  /// File name of the bundle, also the last segment of both object keys.
  pub fn archive_name(&self) -> String {
    format!("{}.zip", self.name)
  }

  pub fn archive_path(&self) -> PathBuf {
    self.target_dir().join(self.archive_name())
  }
}
