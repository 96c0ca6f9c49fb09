//! TeamCity build notification.
//!
//! Reports the versioned key as a build parameter through a TeamCity
//! service message so later build steps can pick it up.

use std::io::Write;

use tracing::{debug, warn};

use crate::consts::DEFAULT_TEAMCITY_PARAMETER;
use crate::project::{Project, ProjectError, keys};

/// Writes `##teamcity[setParameter ...]` lines to a sink.
#[derive(Debug)]
pub struct Notifier<W: Write> {
  sink: W,
  parameter: String,
  enabled: bool,
}

impl<W: Write> Notifier<W> {
  pub fn new(sink: W, parameter: impl Into<String>, enabled: bool) -> Self {
    Self {
      sink,
      parameter: parameter.into(),
      enabled,
    }
  }

  /// Configure from `teamcity_output` and `teamcity_parameter_name`.
  pub fn from_project(project: &Project, sink: W) -> Result<Self, ProjectError> {
    let enabled = project.properties.get_bool(keys::TEAMCITY_OUTPUT)?;
    let parameter = project
      .properties
      .get_or(keys::TEAMCITY_PARAMETER, DEFAULT_TEAMCITY_PARAMETER);
    Ok(Self::new(sink, parameter, enabled))
  }

  /// Keep the configuration but never write.
  pub fn disabled(mut self) -> Self {
    self.enabled = false;
    self
  }

  pub fn is_enabled(&self) -> bool {
    self.enabled
  }

  /// Emit the versioned key. Returns whether a line was written.
  ///
  /// Write failures are logged, never returned.
  pub fn notify(&mut self, versioned_key: &str) -> bool {
    if !self.enabled {
      debug!("teamcity output disabled");
      return false;
    }

    let line = service_message(&self.parameter, versioned_key);
    let written = writeln!(self.sink, "{line}").and_then(|_| self.sink.flush());
    if let Err(e) = written {
      warn!(error = %e, "failed to write teamcity service message");
      return false;
    }
    true
  }

  pub fn into_inner(self) -> W {
    self.sink
  }
}

/// Format a `setParameter` service message.
pub fn service_message(name: &str, value: &str) -> String {
  format!(
    "##teamcity[setParameter name='{}' value='{}']",
    escape(name),
    escape(value)
  )
}

/// Escape a value for use inside a TeamCity service message.
fn escape(value: &str) -> String {
  let mut out = String::with_capacity(value.len());
  for c in value.chars() {
    match c {
      '|' => out.push_str("||"),
      '\'' => out.push_str("|'"),
      '[' => out.push_str("|["),
      ']' => out.push_str("|]"),
      '\n' => out.push_str("|n"),
      '\r' => out.push_str("|r"),
      _ => out.push(c),
    }
  }
  out
}
