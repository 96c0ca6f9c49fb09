//! Implementation of the `lambdapack keys` command.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use lambdapack_lib::publish::{AccessControl, PublishConfig};

use super::load_project;
use crate::output::{OutputFormat, print_json, print_stat};

#[derive(Serialize)]
struct KeysOutput<'a> {
  bucket: &'a str,
  versioned: &'a str,
  latest: &'a str,
  acl: AccessControl,
}

/// Print where an upload of the current project would go, without building anything.
pub fn cmd_keys(project_path: &Path, properties: &[(String, String)], output: OutputFormat) -> Result<()> {
  let project = load_project(project_path, properties)?;
  let config = PublishConfig::from_project(&project)?;

  if output.is_json() {
    return print_json(&KeysOutput {
      bucket: &config.bucket,
      versioned: &config.keys.versioned,
      latest: &config.keys.latest,
      acl: config.acl,
    });
  }

  print_stat("Bucket", &config.bucket);
  print_stat("Versioned", &config.keys.versioned);
  print_stat("Latest", &config.keys.latest);
  print_stat("ACL", config.acl.as_str());
  Ok(())
}
