//! pip-backed installer.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use super::{InstallError, InstallOutcome, Installer};
use crate::consts::DEFAULT_PIP_COMMAND;
use crate::project::{Project, keys};

/// Runs `<program> install --target <dir> <spec>`.
#[derive(Debug, Clone)]
pub struct PipInstaller {
  program: String,
}

impl PipInstaller {
  pub fn new(program: impl Into<String>) -> Self {
    Self { program: program.into() }
  }

  /// Use the project's `pip_command` property, falling back to `pip`.
  pub fn from_project(project: &Project) -> Self {
    Self::new(project.properties.get_or(keys::PIP_COMMAND, DEFAULT_PIP_COMMAND))
  }

  pub fn program(&self) -> &str {
    &self.program
  }
}

impl Default for PipInstaller {
  fn default() -> Self {
    Self::new(DEFAULT_PIP_COMMAND)
  }
}

impl Installer for PipInstaller {
  async fn install(&self, argument: &str, target_dir: &Path) -> Result<InstallOutcome, InstallError> {
    info!(dependency = %argument, target = %target_dir.display(), "installing dependency");

    let mut command = Command::new(&self.program);
    command
      .arg("install")
      .arg("--target")
      .arg(target_dir)
      .arg(argument)
      .stdin(Stdio::null());

    debug!(program = %self.program, "spawning installer");

    let output = command.output().await.map_err(|e| InstallError::Spawn {
      program: self.program.clone(),
      source: e,
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
      debug!(stdout = %stdout.trim(), "installer output");
    }

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
      return Ok(InstallOutcome::Failed {
        code: output.status.code(),
        stderr,
      });
    }

    Ok(InstallOutcome::Success)
  }
}
