//! Dependency specifiers and directory layout of a project.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_SCRIPTS_DIR, DEFAULT_SOURCE_DIR, DEFAULT_TARGET_DIR};

/// Comparison operators that make a version string usable as-is.
///
/// Longest first, so `===` is not mistaken for `==`.
const VERSION_OPERATORS: &[&str] = &["===", "==", "!=", "<=", ">=", "~=", "<", ">"];

/// Characters that end the name part of a requirement string.
const NAME_TERMINATORS: &[char] = &['<', '>', '=', '!', '~', ' '];

/// A declared runtime dependency.
///
/// In the project file a dependency is either a requirement string
/// (`"requests>=2.0"`, `"mylib @ https://host/mylib.whl"`) or a table with
/// `name` and optional `version`, `url` and `marker`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawDependency")]
pub struct Dependency {
  pub name: String,
  pub version: Option<String>,
  pub url: Option<String>,
  /// Environment marker, without the leading `;`.
  pub marker: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDependency {
  Requirement(String),
  Table {
    name: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    marker: Option<String>,
  },
}

impl From<RawDependency> for Dependency {
  fn from(raw: RawDependency) -> Self {
    match raw {
      RawDependency::Requirement(req) => Dependency::parse(&req),
      RawDependency::Table {
        name,
        version,
        url,
        marker,
      } => Dependency {
        name: name.trim().to_string(),
        version: non_empty(version.as_deref()),
        url: non_empty(url.as_deref()),
        marker: non_empty(marker.as_deref()),
      },
    }
  }
}

impl Dependency {
  /// A dependency on any version of `name`.
  pub fn named(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      version: None,
      url: None,
      marker: None,
    }
  }

  pub fn with_version(mut self, version: impl Into<String>) -> Self {
    self.version = Some(version.into());
    self
  }

  pub fn with_url(mut self, url: impl Into<String>) -> Self {
    self.url = Some(url.into());
    self
  }

  pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
    self.marker = Some(marker.into());
    self
  }

  /// Split a requirement string into its parts.
  ///
  /// Handles `name<op>version`, direct references (`name @ url`) and a
  /// trailing environment marker (`...; python_version >= '3.8'`).
  pub fn parse(requirement: &str) -> Self {
    let (requirement, marker) = match requirement.split_once(';') {
      Some((req, marker)) => (req.trim(), non_empty(Some(marker))),
      None => (requirement.trim(), None),
    };

    match requirement.split_once('@') {
      Some((name, url)) if !name.contains([':', '/']) => {
        return Self {
          name: name.trim().to_string(),
          version: None,
          url: non_empty(Some(url)),
          marker,
        };
      }
      _ => {}
    }

    if requirement.contains("://") {
      return Self {
        name: requirement.to_string(),
        version: None,
        url: Some(requirement.to_string()),
        marker,
      };
    }

    let (name, version) = match requirement.find(NAME_TERMINATORS) {
      Some(idx) => (&requirement[..idx], non_empty(Some(&requirement[idx..]))),
      None => (requirement, None),
    };

    Self {
      name: name.trim().to_string(),
      version,
      url: None,
      marker,
    }
  }

  /// Render the dependency as a single installer argument.
  ///
  /// A URL wins over name and version. A bare version number becomes a
  /// minimum (`name>=version`); a version that already starts with an
  /// operator is appended unchanged. A marker is kept at the end.
  pub fn pip_argument(&self) -> String {
    match (&self.url, &self.marker) {
      (Some(url), None) => return url.clone(),
      // pip needs the whitespace before `;` after a URL.
      (Some(url), Some(marker)) => return format!("{} @ {url} ; {marker}", self.name),
      (None, _) => {}
    }

    let requirement = match &self.version {
      None => self.name.clone(),
      Some(version) if VERSION_OPERATORS.iter().any(|op| version.starts_with(op)) => {
        format!("{}{}", self.name, version)
      }
      Some(version) => format!("{}>={}", self.name, version),
    };

    match &self.marker {
      Some(marker) => format!("{requirement}; {marker}"),
      None => requirement,
    }
  }

  /// The name used for exclusion checks: extras stripped, lowercased and
  /// with runs of `-`, `_` and `.` collapsed to a single `-`.
  pub fn normalized_name(&self) -> String {
    normalize_name(&self.name)
  }
}

impl std::fmt::Display for Dependency {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.pip_argument())
  }
}

fn non_empty(value: Option<&str>) -> Option<String> {
  value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Normalize a distribution name for comparison.
pub fn normalize_name(name: &str) -> String {
  let base = name.split('[').next().unwrap_or(name).trim();
  let mut out = String::with_capacity(base.len());
  let mut last_sep = false;
  for c in base.chars() {
    if matches!(c, '-' | '_' | '.') {
      if !last_sep {
        out.push('-');
      }
      last_sep = true;
    } else {
      out.extend(c.to_lowercase());
      last_sep = false;
    }
  }
  out
}

/// Project directories, relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
  pub target_dir: PathBuf,
  pub source_dir: PathBuf,
  pub scripts_dir: PathBuf,
}

impl Default for Layout {
  fn default() -> Self {
    Self {
      target_dir: PathBuf::from(DEFAULT_TARGET_DIR),
      source_dir: PathBuf::from(DEFAULT_SOURCE_DIR),
      scripts_dir: PathBuf::from(DEFAULT_SCRIPTS_DIR),
    }
  }
}
