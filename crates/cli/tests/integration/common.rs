//! Shared test helpers for CLI integration tests.

use std::io::Read;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Project file used by most tests.
pub const MYFUNC: &str = r#"
[project]
name = "myfunc"
version = "1.2.3"

[properties]
bucket_name = "releases"
"#;

/// A stand-in for `pip install --target <dir> <spec>`.
///
/// Creates `<dir>/<name>/__init__.py` containing the spec. Specs starting
/// with `fail-` exit with status 3 and a pip-like error on stderr. Any other
/// argument shape exits with status 2.
const FAKE_PIP: &str = r#"#!/bin/sh
[ "$1" = "install" ] || exit 2
[ "$2" = "--target" ] || exit 2
target="$3"
spec="$4"
case "$spec" in
  fail-*)
    echo "ERROR: No matching distribution found for $spec" >&2
    exit 3
    ;;
esac
name=$(printf '%s' "$spec" | sed 's/[<>=!~;@ ].*//')
mkdir -p "$target/$name"
printf '%s\n' "$spec" > "$target/$name/__init__.py"
echo "Successfully installed $name"
"#;

/// Isolated project directory.
///
/// Every test gets its own temporary directory holding `lambdapack.toml`
/// and the default source layout.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  /// Create a project with `manifest` and a single handler module.
  pub fn new(manifest: &str) -> Self {
    let env = Self {
      temp: TempDir::new().unwrap(),
    };
    env.write_file("lambdapack.toml", manifest);
    env.write_file("src/main/python/handler.py", "def handler(event, context):\n    return 'ok'\n");
    env.write_file("src/main/scripts/bootstrap.sh", "#!/bin/sh\n");
    env
  }

  /// Write a file relative to the project root.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn path(&self) -> &Path {
    self.temp.path()
  }

  pub fn archive_path(&self) -> PathBuf {
    self.path().join("target").join("myfunc.zip")
  }

  /// Install the fake pip into the project and return its path.
  #[cfg(unix)]
  pub fn fake_pip(&self) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = self.path().join("fake-pip");
    std::fs::write(&path, FAKE_PIP).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
  }

  /// Get a Command for the lambdapack binary, run from the project root.
  ///
  /// `RUST_LOG` is cleared so log output does not depend on the caller's
  /// environment.
  pub fn lambdapack_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("lambdapack");
    cmd.current_dir(self.path());
    cmd.env_remove("RUST_LOG");
    cmd
  }
}

/// Names and contents of every file entry in a zip archive.
pub fn zip_entries(path: &Path) -> Vec<(String, String)> {
  let file = std::fs::File::open(path).unwrap();
  let mut archive = zip::ZipArchive::new(file).unwrap();
  let mut entries = Vec::new();
  for i in 0..archive.len() {
    let mut entry = archive.by_index(i).unwrap();
    if entry.is_dir() {
      continue;
    }
    let mut content = String::new();
    entry.read_to_string(&mut content).unwrap();
    entries.push((entry.name().to_string(), content));
  }
  entries
}

pub fn zip_names(path: &Path) -> Vec<String> {
  zip_entries(path).into_iter().map(|(name, _)| name).collect()
}
