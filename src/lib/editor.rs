//! Editing operations over one env file.
//!
//! An [`EnvEditor`] is bound to a single file path at construction. Every
//! operation reads the whole file, transforms it in memory and writes the
//! whole file back; nothing is cached between calls. A missing file reads as
//! an empty document. Backups are plain copies of the file in a
//! `.env.backup/` directory next to it.
//!
//! Writes go through a temporary file in the same directory followed by a
//! rename, so a crash mid-write cannot leave a half-written env file.
//!
//! # Examples
//!
//! ```rust,no_run
//! use env_editor::editor::EnvEditor;
//!
//! let editor = EnvEditor::new(".env");
//! editor.set("APP_NAME", "MyApp")?;
//! assert_eq!(editor.get("APP_NAME")?.as_deref(), Some("MyApp"));
//! # Ok::<(), env_editor::editor::EnvEditorError>(())
//! ```

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

#[cfg(feature = "tracing")]
use tracing::{debug, info, trace};

use crate::parse::{Document, format_value, parse_value};

const BACKUP_DIR_NAME: &str = ".env.backup";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S.env";

/// Editor for one `KEY=value` file, with backups in a sibling directory.
pub struct EnvEditor {
  file_path: PathBuf,
  backup_dir: PathBuf,
}

impl EnvEditor {
  /// Binds the editor to a file path. The backup directory is derived as
  /// `.env.backup/` inside the file's parent directory.
  pub fn new(file_path: impl Into<PathBuf>) -> Self {
    let file_path = file_path.into();
    let backup_dir = parent_dir(&file_path).join(BACKUP_DIR_NAME);

    Self {
      file_path,
      backup_dir,
    }
  }

  pub fn file_path(&self) -> &Path {
    &self.file_path
  }

  pub fn backup_dir(&self) -> &Path {
    &self.backup_dir
  }

  /// Returns the value of the first entry with this key, or `None` when the
  /// key (or the file itself) is absent.
  pub fn get(&self, key: &str) -> Result<Option<String>, EnvEditorError> {
    let document = self.read_document()?;
    Ok(document.get(key).map(parse_value))
  }

  /// Like [`get`](Self::get), falling back to `default` when the key is
  /// absent.
  pub fn get_or(&self, key: &str, default: &str) -> Result<String, EnvEditorError> {
    Ok(self.get(key)?.unwrap_or_else(|| default.to_string()))
  }

  /// Every entry in file order. Duplicate keys are last-wins.
  pub fn get_all(&self) -> Result<Vec<(String, String)>, EnvEditorError> {
    Ok(self.read_document()?.entries())
  }

  pub fn has(&self, key: &str) -> Result<bool, EnvEditorError> {
    Ok(self.read_document()?.contains_key(key))
  }

  /// Sets a key: replaces the first existing entry in place, or appends a
  /// new `key=value` line at the end of the file.
  ///
  /// Keys are a caller contract: non-empty, no `=`, no line breaks. The
  /// value is stored via its `Display` form, quoted when it contains a space
  /// or a double quote, so `set("PORT", 8080)` reads back as `"8080"`.
  pub fn set(&self, key: &str, value: impl fmt::Display) -> Result<(), EnvEditorError> {
    #[cfg(feature = "tracing")]
    debug!("Setting {}", key);

    let mut document = self.read_document()?;
    document.set(key, format_value(&value.to_string()));
    self.write_document(&document)
  }

  /// Replaces the value of an existing key, preserving its line position.
  /// Fails with [`EnvEditorError::KeyNotFound`] when the key is absent; it
  /// never creates the key.
  pub fn update(&self, key: &str, value: impl fmt::Display) -> Result<(), EnvEditorError> {
    #[cfg(feature = "tracing")]
    debug!("Updating {}", key);

    let mut document = self.read_document()?;
    if document
      .replace(key, format_value(&value.to_string()))
      .is_none()
    {
      return Err(EnvEditorError::KeyNotFound(key.to_string()));
    }
    self.write_document(&document)
  }

  /// [`update`](Self::update) when the key exists, [`set`](Self::set)
  /// otherwise. Never fails with `KeyNotFound`.
  pub fn set_or_update(&self, key: &str, value: impl fmt::Display) -> Result<(), EnvEditorError> {
    if self.has(key)? {
      self.update(key, value)
    } else {
      self.set(key, value)
    }
  }

  /// Removes a key and its whole line. A no-op success when the key is
  /// absent. The rewritten file has no stray blank where the line stood and
  /// ends with exactly one line terminator.
  pub fn remove(&self, key: &str) -> Result<(), EnvEditorError> {
    let mut document = self.read_document()?;
    if !document.remove(key) {
      #[cfg(feature = "tracing")]
      trace!("{} not present, nothing to remove", key);
      return Ok(());
    }

    let serialized = document.to_string();
    let trimmed = serialized.trim_end();
    let content = if trimmed.is_empty() {
      String::new()
    } else {
      format!("{}\n", trimmed)
    };
    self.write_bytes(content.as_bytes())
  }

  /// Copies the live file into the backup directory, creating the directory
  /// (and parents) on first use. `name` defaults to a
  /// `YYYY-MM-DD_HH-MM-SS.env` timestamp. Returns the full backup path.
  /// Fails when the live file does not exist.
  pub fn backup(&self, name: Option<&str>) -> Result<PathBuf, EnvEditorError> {
    fs::create_dir_all(&self.backup_dir).map_err(EnvEditorError::CreateBackupDir)?;

    let name = match name {
      Some(name) => name.to_string(),
      None => chrono::Local::now()
        .format(BACKUP_TIMESTAMP_FORMAT)
        .to_string(),
    };
    let backup_path = self.backup_dir.join(&name);

    #[cfg(feature = "tracing")]
    info!("Backing up {:?} to {:?}", self.file_path, backup_path);

    fs::copy(&self.file_path, &backup_path).map_err(EnvEditorError::Copy)?;
    Ok(backup_path)
  }

  /// Overwrites the live file with a backup's bytes, verbatim. Fails with
  /// [`EnvEditorError::BackupNotFound`] when no such backup exists; the live
  /// file is untouched in that case.
  pub fn restore(&self, name: &str) -> Result<(), EnvEditorError> {
    let backup_path = self.backup_dir.join(name);
    if !backup_path.exists() {
      return Err(EnvEditorError::BackupNotFound(name.to_string()));
    }

    #[cfg(feature = "tracing")]
    info!("Restoring {:?} from {:?}", self.file_path, backup_path);

    let bytes = fs::read(&backup_path).map_err(EnvEditorError::Read)?;
    self.write_bytes(&bytes)
  }

  /// Backup filenames, in directory-listing order (unsorted).
  pub fn list_backups(&self) -> Result<Vec<String>, EnvEditorError> {
    if !self.backup_dir.exists() {
      return Ok(Vec::new());
    }

    let entries = fs::read_dir(&self.backup_dir).map_err(EnvEditorError::ListBackups)?;
    let mut names = Vec::new();
    for entry in entries {
      let entry = entry.map_err(EnvEditorError::ListBackups)?;
      names.push(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
  }

  fn read_document(&self) -> Result<Document, EnvEditorError> {
    if !self.file_path.exists() {
      #[cfg(feature = "tracing")]
      trace!("{:?} missing, reading as empty document", self.file_path);
      return Ok(Document::default());
    }

    let content = fs::read_to_string(&self.file_path).map_err(EnvEditorError::Read)?;
    Ok(Document::parse(&content))
  }

  fn write_document(&self, document: &Document) -> Result<(), EnvEditorError> {
    self.write_bytes(document.to_string().as_bytes())
  }

  fn write_bytes(&self, bytes: &[u8]) -> Result<(), EnvEditorError> {
    let dir = parent_dir(&self.file_path);
    let mut temp = NamedTempFile::new_in(dir).map_err(EnvEditorError::Write)?;
    temp.write_all(bytes).map_err(EnvEditorError::Write)?;
    temp
      .persist(&self.file_path)
      .map_err(|e| EnvEditorError::Write(e.error))?;
    Ok(())
  }
}

fn parent_dir(path: &Path) -> PathBuf {
  match path.parent() {
    Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
    _ => PathBuf::from("."),
  }
}

/// Errors raised by [`EnvEditor`] operations.
#[derive(Debug, thiserror::Error)]
pub enum EnvEditorError {
  /// `update` was asked for a key the file does not contain
  #[error("Key '{0}' does not exist in .env file")]
  KeyNotFound(String),
  /// `restore` was asked for a backup that does not exist
  #[error("Backup file '{0}' does not exist")]
  BackupNotFound(String),
  /// Error reading the env file or a backup
  #[error("Read error: {0}")]
  Read(std::io::Error),
  /// Error writing the env file
  #[error("Write error: {0}")]
  Write(std::io::Error),
  /// Error copying the env file into the backup directory
  #[error("Backup copy error: {0}")]
  Copy(std::io::Error),
  /// Error creating the backup directory
  #[error("Failed to create backup directory: {0}")]
  CreateBackupDir(std::io::Error),
  /// Error listing the backup directory
  #[error("Failed to list backups: {0}")]
  ListBackups(std::io::Error),
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn editor_in(dir: &TempDir) -> EnvEditor {
    EnvEditor::new(dir.path().join(".env"))
  }

  #[test]
  fn test_set_creates_missing_file() {
    let dir = TempDir::new().unwrap();
    let editor = editor_in(&dir);

    editor.set("KEY", "value").unwrap();

    let content = fs::read_to_string(editor.file_path()).unwrap();
    assert_eq!(content, "KEY=value\n");
  }

  #[test]
  fn test_backup_dir_derived_from_file_dir() {
    let dir = TempDir::new().unwrap();
    let editor = editor_in(&dir);

    assert_eq!(editor.backup_dir(), dir.path().join(".env.backup"));
  }

  #[test]
  fn test_update_missing_key_leaves_file_alone() {
    let dir = TempDir::new().unwrap();
    let editor = editor_in(&dir);
    fs::write(editor.file_path(), "A=1\n").unwrap();

    let result = editor.update("MISSING", "value");

    assert!(matches!(result, Err(EnvEditorError::KeyNotFound(key)) if key == "MISSING"));
    assert_eq!(fs::read_to_string(editor.file_path()).unwrap(), "A=1\n");
  }

  #[test]
  fn test_backup_fails_without_source_file() {
    let dir = TempDir::new().unwrap();
    let editor = editor_in(&dir);

    assert!(matches!(
      editor.backup(Some("orphan.env")),
      Err(EnvEditorError::Copy(_))
    ));
  }

  #[test]
  fn test_default_backup_name_is_timestamped() {
    let dir = TempDir::new().unwrap();
    let editor = editor_in(&dir);
    fs::write(editor.file_path(), "A=1\n").unwrap();

    let path = editor.backup(None).unwrap();
    let name = path.file_name().unwrap().to_string_lossy().into_owned();

    // YYYY-MM-DD_HH-MM-SS.env
    assert_eq!(name.len(), "2024-01-01_00-00-00.env".len());
    assert!(name.ends_with(".env"));
    assert_eq!(&name[4..5], "-");
    assert_eq!(&name[10..11], "_");
  }
}
