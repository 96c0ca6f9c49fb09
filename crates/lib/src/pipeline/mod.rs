//! The packaging and upload workflow.
//!
//! Stages run strictly in sequence:
//!
//! ```text
//! MATERIALIZING -> ARCHIVING -> PUBLISHING -> NOTIFYING -> DONE
//! ```
//!
//! `package` covers the first two, `upload` runs `package` and then the
//! rest. Any error ends the run at the stage that produced it.

use std::fmt;
use std::future::Future;
use std::io::Write;

use serde::Serialize;
use thiserror::Error;
use tracing::{Instrument, debug, info, info_span};

use crate::archive::{ArchiveError, ArchiveSummary, SourceDir, build_archive};
use crate::install::{
  Excludes, FailurePolicy, InstallError, Installer, MaterializeReport, clear_target_dir, materialize_dependencies,
};
use crate::notify::Notifier;
use crate::project::{Project, ProjectError, keys};
use crate::publish::{ObjectStore, PublishConfig, PublishError, PublishReport, publish, read_archive};
use crate::util::hash::hash_file;

/// A step of the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
  Materializing,
  Archiving,
  Publishing,
  Notifying,
  Done,
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Stage::Materializing => "materializing",
      Stage::Archiving => "archiving",
      Stage::Publishing => "publishing",
      Stage::Notifying => "notifying",
      Stage::Done => "done",
    };
    f.write_str(name)
  }
}

/// Any error that aborts a run. Messages pass through unchanged.
#[derive(Debug, Error)]
pub enum PipelineError {
  #[error(transparent)]
  Project(#[from] ProjectError),

  #[error(transparent)]
  Install(#[from] InstallError),

  #[error(transparent)]
  Archive(#[from] ArchiveError),

  #[error(transparent)]
  Publish(#[from] PublishError),
}

impl PipelineError {
  /// The stage that failed, or `None` for configuration errors raised
  /// before any stage started.
  pub fn stage(&self) -> Option<Stage> {
    match self {
      PipelineError::Project(_) => None,
      PipelineError::Install(_) => Some(Stage::Materializing),
      PipelineError::Archive(_) => Some(Stage::Archiving),
      PipelineError::Publish(_) => Some(Stage::Publishing),
    }
  }
}

/// Result of the packaging task.
#[derive(Debug, Clone, Serialize)]
pub struct PackageReport {
  pub dependencies: MaterializeReport,
  pub archive: ArchiveSummary,
  pub sha256: String,
}

/// Result of the upload task.
#[derive(Debug, Clone, Serialize)]
pub struct UploadReport {
  pub package: PackageReport,
  pub publish: PublishReport,
  pub notified: bool,
}

async fn run_stage<T, E, F>(stage: Stage, work: F) -> Result<T, PipelineError>
where
  F: Future<Output = Result<T, E>>,
  E: Into<PipelineError>,
{
  let span = info_span!("stage", stage = %stage);
  match work.instrument(span.clone()).await {
    Ok(value) => Ok(value),
    Err(e) => {
      let e = e.into();
      span.in_scope(|| debug!(error = %e, "stage failed"));
      Err(e)
    }
  }
}

/// Install dependencies and assemble the bundle.
///
/// Dependencies go to a freshly cleared `<target>/lambda_dependencies`; the archive is built
/// from that directory (when present), the source tree and the scripts
/// tree, in that order, all at the archive root.
pub async fn package(project: &Project, installer: &impl Installer) -> Result<PackageReport, PipelineError> {
  let policy = if project.properties.get_bool(keys::IGNORE_INSTALL_FAILURES)? {
    FailurePolicy::Warn
  } else {
    FailurePolicy::Abort
  };

  let dependencies_dir = project.dependencies_dir();

  info!(count = project.dependencies.len(), "preparing dependencies");
  let dependencies = run_stage(Stage::Materializing, async {
    clear_target_dir(&dependencies_dir)?;
    materialize_dependencies(
      &project.dependencies,
      &dependencies_dir,
      &Excludes::default(),
      policy,
      installer,
    )
    .await
  })
  .await?;

  let mut sources = Vec::with_capacity(3);
  if dependencies_dir.is_dir() {
    sources.push(SourceDir::new(&dependencies_dir));
  }
  sources.push(SourceDir::new(project.source_dir()));
  sources.push(SourceDir::new(project.scripts_dir()));

  let output = project.archive_path();

  info!(path = %output.display(), "assembling archive");
  let (archive, sha256) = run_stage(Stage::Archiving, async {
    let summary = build_archive(&sources, &output)?;
    let sha256 = hash_file(&output).map_err(|e| ArchiveError::ReadFile {
      path: output.clone(),
      source: e,
    })?;
    Ok::<_, ArchiveError>((summary, sha256))
  })
  .await?;

  info!(path = %output.display(), "lambda zip is available");

  Ok(PackageReport {
    dependencies,
    archive,
    sha256,
  })
}

/// Package the project, publish the bundle, and notify.
///
/// Upload settings are resolved before anything else, so a missing
/// `bucket_name` fails without touching the filesystem or the network.
pub async fn upload<W: Write>(
  project: &Project,
  installer: &impl Installer,
  store: &impl ObjectStore,
  notifier: &mut Notifier<W>,
) -> Result<UploadReport, PipelineError> {
  let config = PublishConfig::from_project(project)?;

  let package = package(project, installer).await?;

  let publish = run_stage(Stage::Publishing, async {
    let data = read_archive(&package.archive.path)?;
    publish(store, &config, &data).await
  })
  .await?;

  let notified = info_span!("stage", stage = %Stage::Notifying).in_scope(|| notifier.notify(&config.keys.versioned));

  info!(stage = %Stage::Done, versioned = %config.keys.versioned, latest = %config.keys.latest, "upload complete");

  Ok(UploadReport {
    package,
    publish,
    notified,
  })
}
