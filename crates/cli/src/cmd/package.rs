//! Implementation of the `lambdapack package` command.
//!
//! Installs the declared dependencies with pip and assembles the Lambda zip
//! under the target directory.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};

use lambdapack_lib::install::PipInstaller;
use lambdapack_lib::pipeline::{PackageReport, package};

use super::{elapsed, load_project, runtime};
use crate::output::{
  OutputFormat, format_bytes, print_json, print_skipped, print_stat, print_success, print_warning, truncate_hash,
};

pub fn cmd_package(project_path: &Path, properties: &[(String, String)], output: OutputFormat) -> Result<()> {
  let start = Instant::now();
  let project = load_project(project_path, properties)?;
  let installer = PipInstaller::from_project(&project);

  let rt = runtime()?;
  let report = rt
    .block_on(package(&project, &installer))
    .context("Packaging failed")?;

  if output.is_json() {
    return print_json(&report);
  }

  print_success(&format!("Lambda zip is available at {}", report.archive.path.display()));
  print_package_stats(&report);
  print_stat("Elapsed", &elapsed(start));
  Ok(())
}

/// Shared summary lines for `package` and `upload`.
pub(super) fn print_package_stats(report: &PackageReport) {
  let deps = &report.dependencies;

  print_stat("Entries", &report.archive.entries.len().to_string());
  print_stat("Size", &format_bytes(report.archive.size));
  print_stat("SHA-256", truncate_hash(&report.sha256));
  print_stat(
    "Dependencies",
    &format!(
      "{} installed, {} excluded, {} failed",
      deps.installed.len(),
      deps.excluded.len(),
      deps.failed.len()
    ),
  );

  for name in &deps.excluded {
    print_skipped(&format!("{name} (provided by the runtime)"));
  }
  for name in &deps.failed {
    print_warning(&format!("Dependency {name} failed to install"));
  }
  for name in &report.archive.duplicates {
    print_warning(&format!("{name} appears in more than one source; the last one was kept"));
  }
}
