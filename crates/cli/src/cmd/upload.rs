//! Implementation of the `lambdapack upload` command.
//!
//! Packages the project, uploads the zip under its versioned and latest keys,
//! and optionally reports the versioned key to TeamCity.

use std::io::{self, Write};
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};

use lambdapack_lib::install::PipInstaller;
use lambdapack_lib::notify::Notifier;
use lambdapack_lib::pipeline::{UploadReport, upload};
use lambdapack_lib::publish::{MemoryStore, PublishConfig, S3Store};

use super::package::print_package_stats;
use super::{elapsed, load_project, runtime};
use crate::output::{OutputFormat, print_info, print_json, print_stat, print_success};

/// Stream that receives TeamCity service messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NotifySink {
  Stdout,
  Stderr,
}

impl NotifySink {
  /// JSON reports own stdout, so service messages move to stderr.
  /// TeamCity reads both streams.
  fn for_output(output: OutputFormat) -> Self {
    if output.is_json() {
      NotifySink::Stderr
    } else {
      NotifySink::Stdout
    }
  }
}

impl Write for NotifySink {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    match self {
      NotifySink::Stdout => io::stdout().write(buf),
      NotifySink::Stderr => io::stderr().write(buf),
    }
  }

  fn flush(&mut self) -> io::Result<()> {
    match self {
      NotifySink::Stdout => io::stdout().flush(),
      NotifySink::Stderr => io::stderr().flush(),
    }
  }
}

pub fn cmd_upload(
  project_path: &Path,
  properties: &[(String, String)],
  dry_run: bool,
  output: OutputFormat,
) -> Result<()> {
  let start = Instant::now();
  let project = load_project(project_path, properties)?;
  // Fail on bad upload settings before credentials and region are resolved.
  PublishConfig::from_project(&project)?;
  let mut notifier = Notifier::from_project(&project, NotifySink::for_output(output))?;
  if dry_run {
    notifier = notifier.disabled();
  }

  let installer = PipInstaller::from_project(&project);
  let rt = runtime()?;

  let report = if dry_run {
    let store = MemoryStore::new();
    rt.block_on(upload(&project, &installer, &store, &mut notifier))
  } else {
    rt.block_on(async {
      let store = S3Store::from_env().await;
      upload(&project, &installer, &store, &mut notifier).await
    })
  }
  .context("Upload failed")?;

  if output.is_json() {
    return print_json(&report);
  }

  print_summary(&report, dry_run);
  print_stat("Elapsed", &elapsed(start));
  Ok(())
}

fn print_summary(report: &UploadReport, dry_run: bool) {
  let publish = &report.publish;

  if dry_run {
    print_info("Dry run: nothing was uploaded");
  } else {
    print_success(&format!("Uploaded to s3://{}", publish.bucket));
  }
  print_stat("Versioned", &publish.keys.versioned);
  print_stat("Latest", &publish.keys.latest);
  print_stat("ACL", publish.acl.as_str());
  print_package_stats(&report.package);
}
