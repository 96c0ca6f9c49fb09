mod keys;
mod package;
mod upload;

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::runtime::Runtime;
use tracing::debug;

use lambdapack_lib::project::Project;

pub use keys::cmd_keys;
pub use package::cmd_package;
pub use upload::cmd_upload;

fn load_project(path: &Path, properties: &[(String, String)]) -> Result<Project> {
  debug!(path = %path.display(), overrides = properties.len(), "loading project");
  let project =
    Project::load(path, properties).with_context(|| format!("Failed to load project {}", path.display()))?;
  debug!(name = %project.name, version = %project.version, root = %project.root().display(), "project loaded");
  Ok(project)
}

fn runtime() -> Result<Runtime> {
  tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .context("Failed to create async runtime")
}

/// Elapsed time since `start`, rounded to milliseconds for display.
fn elapsed(start: Instant) -> String {
  let millis = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
  humantime::format_duration(Duration::from_millis(millis)).to_string()
}
