//! Bundle assembly.
//!
//! Walks one or more source directories and writes every regular file into
//! a single deflate-compressed zip, merging all trees into one namespace.
//!
//! Entries are visited in file-name order and carry a fixed timestamp, so
//! unchanged inputs always produce a byte-identical archive.

use std::collections::HashMap;
use std::fs::{self, File, FileType};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Errors that can occur while building an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
  #[error("source directory does not exist: {}", path.display())]
  MissingSource { path: PathBuf },

  #[error("failed to walk {}: {source}", path.display())]
  Walk { path: PathBuf, source: walkdir::Error },

  #[error("failed to create archive {}: {source}", path.display())]
  Create { path: PathBuf, source: io::Error },

  #[error("failed to read {}: {source}", path.display())]
  ReadFile { path: PathBuf, source: io::Error },

  #[error("failed to add archive entry {name}: {source}")]
  Entry { name: String, source: ZipError },

  #[error("failed to finalize archive {}: {source}", path.display())]
  Finish { path: PathBuf, source: ZipError },
}

/// A directory to include and the folder it lands under in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDir {
  pub path: PathBuf,
  /// Archive folder for this tree; empty places it at the archive root.
  pub prefix: String,
}

impl SourceDir {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      prefix: String::new(),
    }
  }

  pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
    self.prefix = prefix.into();
    self
  }
}

/// How a directory entry is treated during the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
  /// Regular file: included.
  File,
  /// Directory: descended into.
  Directory,
  /// Symlink, socket, device or fifo: skipped and logged.
  Other,
}

impl EntryKind {
  /// Classify without following symlinks.
  pub fn classify(file_type: &FileType) -> Self {
    if file_type.is_symlink() {
      EntryKind::Other
    } else if file_type.is_file() {
      EntryKind::File
    } else if file_type.is_dir() {
      EntryKind::Directory
    } else {
      EntryKind::Other
    }
  }
}

/// What ended up in a finished archive.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveSummary {
  pub path: PathBuf,
  /// Entry names in the order they were written.
  pub entries: Vec<String>,
  /// Entry names provided by more than one source; the last source won.
  pub duplicates: Vec<String>,
  /// Number of non-regular entries that were left out.
  pub skipped: usize,
  pub size: u64,
}

/// A file selected for the archive.
struct PlannedEntry {
  name: String,
  path: PathBuf,
  len: u64,
  #[cfg_attr(not(unix), allow(dead_code))]
  mode: u32,
}

/// Build a zip at `output` from `sources`, in the given order.
///
/// The output is truncated if it exists. All sources must exist; nothing
/// is written when one is missing. When two sources contain the same
/// relative path the later source's file is stored, once, at the position
/// of the first occurrence.
pub fn build_archive(sources: &[SourceDir], output: &Path) -> Result<ArchiveSummary, ArchiveError> {
  for source in sources {
    if !source.path.is_dir() {
      return Err(ArchiveError::MissingSource {
        path: source.path.clone(),
      });
    }
  }

  let mut planned: Vec<PlannedEntry> = Vec::new();
  let mut positions: HashMap<String, usize> = HashMap::new();
  let mut duplicates = Vec::new();
  let mut skipped = 0;

  for source in sources {
    debug!(source = %source.path.display(), prefix = %source.prefix, "walking source directory");

    for entry in collect_tree(source, output, &mut skipped)? {
      match positions.get(&entry.name) {
        Some(&idx) => {
          warn!(entry = %entry.name, replaced = %planned[idx].path.display(), by = %entry.path.display(), "duplicate archive entry");
          duplicates.push(entry.name.clone());
          planned[idx] = entry;
        }
        None => {
          positions.insert(entry.name.clone(), planned.len());
          planned.push(entry);
        }
      }
    }
  }

  write_archive(&planned, output)?;

  let size = fs::metadata(output)
    .map_err(|e| ArchiveError::ReadFile {
      path: output.to_path_buf(),
      source: e,
    })?
    .len();

  info!(path = %output.display(), entries = planned.len(), size, "archive written");

  Ok(ArchiveSummary {
    path: output.to_path_buf(),
    entries: planned.into_iter().map(|e| e.name).collect(),
    duplicates,
    skipped,
    size,
  })
}

/// Select the regular files of one source tree, in file-name order.
fn collect_tree(source: &SourceDir, output: &Path, skipped: &mut usize) -> Result<Vec<PlannedEntry>, ArchiveError> {
  let walker = WalkDir::new(&source.path)
    .min_depth(1)
    .follow_links(false)
    .sort_by_file_name();

  let mut entries = Vec::new();

  for entry in walker {
    let entry = entry.map_err(|e| ArchiveError::Walk {
      path: source.path.clone(),
      source: e,
    })?;
    let entry_path = entry.path();

    match EntryKind::classify(&entry.file_type()) {
      EntryKind::Directory => continue,
      EntryKind::Other => {
        debug!(path = %entry_path.display(), "skipping non-regular entry");
        *skipped += 1;
        continue;
      }
      EntryKind::File => {}
    }

    // The archive itself may live inside a source tree.
    if entry_path == output {
      debug!(path = %entry_path.display(), "skipping the archive being written");
      continue;
    }

    let metadata = entry.metadata().map_err(|e| ArchiveError::Walk {
      path: source.path.clone(),
      source: e,
    })?;

    let relative = entry_path.strip_prefix(&source.path).unwrap_or(entry_path);

    entries.push(PlannedEntry {
      name: entry_name(&source.prefix, relative),
      path: entry_path.to_path_buf(),
      len: metadata.len(),
      mode: file_mode(&metadata),
    });
  }

  Ok(entries)
}

fn write_archive(entries: &[PlannedEntry], output: &Path) -> Result<(), ArchiveError> {
  let create_err = |e: io::Error| ArchiveError::Create {
    path: output.to_path_buf(),
    source: e,
  };

  if let Some(parent) = output.parent() {
    fs::create_dir_all(parent).map_err(create_err)?;
  }

  let file = File::create(output).map_err(create_err)?;
  let mut writer = ZipWriter::new(BufWriter::new(file));

  for entry in entries {
    writer
      .start_file(entry.name.as_str(), entry_options(entry))
      .map_err(|e| ArchiveError::Entry {
        name: entry.name.clone(),
        source: e,
      })?;

    let mut input = File::open(&entry.path).map_err(|e| ArchiveError::ReadFile {
      path: entry.path.clone(),
      source: e,
    })?;
    io::copy(&mut input, &mut writer).map_err(|e| ArchiveError::Entry {
      name: entry.name.clone(),
      source: ZipError::Io(e),
    })?;
  }

  let mut inner = writer.finish().map_err(|e| ArchiveError::Finish {
    path: output.to_path_buf(),
    source: e,
  })?;
  inner.flush().map_err(|e| ArchiveError::Finish {
    path: output.to_path_buf(),
    source: ZipError::Io(e),
  })?;

  Ok(())
}

/// Join the prefix and relative path with forward slashes.
fn entry_name(prefix: &str, relative: &Path) -> String {
  let mut parts: Vec<String> = prefix
    .split(['/', '\\'])
    .filter(|p| !p.is_empty())
    .map(str::to_string)
    .collect();
  parts.extend(
    relative
      .components()
      .map(|c| c.as_os_str().to_string_lossy().into_owned()),
  );
  parts.join("/")
}

fn entry_options(entry: &PlannedEntry) -> SimpleFileOptions {
  let options = SimpleFileOptions::default()
    .compression_method(CompressionMethod::Deflated)
    .last_modified_time(DateTime::default())
    .large_file(entry.len >= u64::from(u32::MAX));

  #[cfg(unix)]
  let options = options.unix_permissions(entry.mode);

  options
}

#[cfg(unix)]
fn file_mode(metadata: &fs::Metadata) -> u32 {
  use std::os::unix::fs::PermissionsExt;
  metadata.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn file_mode(_metadata: &fs::Metadata) -> u32 {
  0o644
}
