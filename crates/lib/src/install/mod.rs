//! Dependency materialization.
//!
//! Installs each declared dependency into a local directory by running an
//! external installer once per dependency. No resolution happens here; the
//! installer sees exactly the rendered specifier.

mod pip;

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::consts::DEFAULT_EXCLUDES;
use crate::project::{Dependency, normalize_name};

pub use pip::PipInstaller;

/// Errors that can occur while installing dependencies.
#[derive(Debug, Error)]
pub enum InstallError {
  /// The installer process could not be started at all.
  #[error("failed to spawn installer '{program}': {source}")]
  Spawn {
    program: String,
    source: std::io::Error,
  },

  #[error("failed to clear dependency directory {}: {source}", path.display())]
  Prepare { path: PathBuf, source: io::Error },

  /// The installer ran and exited unsuccessfully.
  #[error("installing '{argument}' failed with exit code {code:?}: {stderr}")]
  Failed {
    argument: String,
    code: Option<i32>,
    stderr: String,
  },
}

/// What a single installer invocation reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
  Success,
  Failed { code: Option<i32>, stderr: String },
}

/// Runs the external package installer.
#[allow(async_fn_in_trait)]
pub trait Installer {
  /// Install one rendered specifier into `target_dir`.
  async fn install(&self, argument: &str, target_dir: &Path) -> Result<InstallOutcome, InstallError>;
}

/// How a failed installer run affects the workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
  /// Stop at the first failing dependency.
  #[default]
  Abort,
  /// Log a warning and continue with the next dependency.
  Warn,
}

/// Dependency names that must never be installed into the bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Excludes(BTreeSet<String>);

impl Excludes {
  pub fn new<I, S>(names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    Self(names.into_iter().map(|n| normalize_name(n.as_ref())).collect())
  }

  pub fn none() -> Self {
    Self(BTreeSet::new())
  }

  pub fn contains(&self, dependency: &Dependency) -> bool {
    self.0.contains(&dependency.normalized_name())
  }
}

impl Default for Excludes {
  /// The store client and its SDK, which the Lambda runtime already ships.
  fn default() -> Self {
    Self::new(DEFAULT_EXCLUDES)
  }
}

/// Summary of a materialization run, as installer arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MaterializeReport {
  pub installed: Vec<String>,
  pub excluded: Vec<String>,
  pub failed: Vec<String>,
}

/// Remove whatever a previous run left in `target_dir`.
pub fn clear_target_dir(target_dir: &Path) -> Result<(), InstallError> {
  match fs::remove_dir_all(target_dir) {
    Ok(()) => {
      debug!(path = %target_dir.display(), "cleared dependency directory");
      Ok(())
    }
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
    Err(e) => Err(InstallError::Prepare {
      path: target_dir.to_path_buf(),
      source: e,
    }),
  }
}

/// Install every non-excluded dependency into `target_dir`, in declaration order.
pub async fn materialize_dependencies(
  dependencies: &[Dependency],
  target_dir: &Path,
  excludes: &Excludes,
  policy: FailurePolicy,
  installer: &impl Installer,
) -> Result<MaterializeReport, InstallError> {
  let mut report = MaterializeReport::default();

  for dependency in dependencies {
    let argument = dependency.pip_argument();

    if excludes.contains(dependency) {
      info!(dependency = %argument, "skipping excluded dependency");
      report.excluded.push(argument);
      continue;
    }

    match installer.install(&argument, target_dir).await? {
      InstallOutcome::Success => report.installed.push(argument),
      InstallOutcome::Failed { code, stderr } => match policy {
        FailurePolicy::Abort => {
          return Err(InstallError::Failed { argument, code, stderr });
        }
        FailurePolicy::Warn => {
          warn!(dependency = %argument, code = ?code, stderr = %stderr, "dependency install failed, continuing");
          report.failed.push(argument);
        }
      },
    }
  }

  Ok(report)
}
