//! Key binding file lookup and persistence.
//!
//! Binding files live in the keymap directory. For a saved entry named
//! `desktop` the lookup order is `desktop.keymap`, then the shared `keymap`
//! file. When neither exists the canonical default table is written to
//! `keymap` so the user has something to edit.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use dualview_core::BindingTable;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Name of the shared binding file.
pub const SHARED_KEYMAP_FILE: &str = "keymap";

/// Extension of per-entry binding files.
pub const ENTRY_KEYMAP_EXTENSION: &str = "keymap";

/// Error type for binding file operations.
#[derive(Debug, Error)]
pub enum KeymapError {
    /// A binding file exists but could not be read.
    #[error("failed to read key bindings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The default binding file could not be written.
    #[error("failed to write key bindings to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where a loaded table came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingSource {
    /// The per-entry file.
    Entry(PathBuf),
    /// The shared `keymap` file.
    Shared(PathBuf),
    /// No file existed; `persisted` is where the defaults were written, if that worked.
    Defaults { persisted: Option<PathBuf> },
}

/// A binding table together with its origin.
#[derive(Debug, Clone)]
pub struct LoadedBindings {
    pub table: BindingTable,
    pub source: BindingSource,
}

/// Path of the per-entry binding file for `entry`.
pub fn entry_keymap_path(dir: &Path, entry: &str) -> PathBuf {
    dir.join(format!("{entry}.{ENTRY_KEYMAP_EXTENSION}"))
}

/// Loads the binding table for `entry` (or the shared table when `None`).
///
/// Missing files are not an error: the defaults are persisted and used, and a
/// failure to persist them is only logged.
///
/// # Errors
///
/// Returns [`KeymapError::Read`] if a binding file exists but cannot be read.
pub fn load_bindings(dir: &Path, entry: Option<&str>) -> Result<LoadedBindings, KeymapError> {
    let mut candidates = Vec::with_capacity(2);
    if let Some(entry) = entry {
        candidates.push((entry_keymap_path(dir, entry), true));
    }
    candidates.push((dir.join(SHARED_KEYMAP_FILE), false));

    for (path, per_entry) in candidates {
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                let mut table = BindingTable::default();
                let report = table.apply_overrides(&text);
                info!(
                    path = %path.display(),
                    applied = report.applied,
                    ignored = report.ignored.len(),
                    "loaded key bindings"
                );
                let source = if per_entry {
                    BindingSource::Entry(path)
                } else {
                    BindingSource::Shared(path)
                };
                return Ok(LoadedBindings { table, source });
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no binding file");
            }
            Err(source) => return Err(KeymapError::Read { path, source }),
        }
    }

    let table = BindingTable::default();
    let path = dir.join(SHARED_KEYMAP_FILE);
    let persisted = match save_bindings(&path, &table) {
        Ok(()) => {
            info!(path = %path.display(), "wrote default key bindings");
            Some(path)
        }
        Err(e) => {
            warn!(error = %e, "using default key bindings without persisting them");
            None
        }
    };
    Ok(LoadedBindings {
        table,
        source: BindingSource::Defaults { persisted },
    })
}

/// Writes `table` in binding-file syntax, creating the directory if needed.
///
/// # Errors
///
/// Returns [`KeymapError::Write`] on any file-system failure.
pub fn save_bindings(path: &Path, table: &BindingTable) -> Result<(), KeymapError> {
    let write_err = |source| KeymapError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(write_err)?;
    }
    std::fs::write(path, table.to_file_string()).map_err(write_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dualview_core::{PadButton, ResolvedCode};

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("dualview_keymap_{tag}_{}", std::process::id()));
        std::fs::remove_dir_all(&dir).ok();
        dir
    }

    #[test]
    fn test_missing_files_persist_defaults() {
        // Arrange
        let dir = temp_dir("defaults");

        // Act
        let loaded = load_bindings(&dir, Some("desktop")).expect("defaults are not an error");

        // Assert
        let shared = dir.join(SHARED_KEYMAP_FILE);
        assert_eq!(
            loaded.source,
            BindingSource::Defaults {
                persisted: Some(shared.clone())
            }
        );
        let written = std::fs::read_to_string(&shared).unwrap();
        assert!(written.starts_with('#'), "default file carries a comment header");
        assert_eq!(loaded.table, BindingTable::default());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_entry_file_wins_over_shared_file() {
        // Arrange
        let dir = temp_dir("entry");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(SHARED_KEYMAP_FILE), "A 0x0071\n").unwrap();
        std::fs::write(entry_keymap_path(&dir, "desktop"), "A 0x0062\n").unwrap();

        // Act
        let loaded = load_bindings(&dir, Some("desktop")).unwrap();

        // Assert
        assert!(matches!(loaded.source, BindingSource::Entry(_)));
        assert_eq!(
            loaded.table.resolve(PadButton::A, false),
            ResolvedCode::KeySym(0x62)
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_shared_file_used_when_entry_file_missing() {
        let dir = temp_dir("shared");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(SHARED_KEYMAP_FILE), "B 0x0003\n").unwrap();

        let loaded = load_bindings(&dir, Some("other")).unwrap();

        assert!(matches!(loaded.source, BindingSource::Shared(_)));
        assert_eq!(
            loaded.table.resolve(PadButton::B, false),
            ResolvedCode::from_raw(3)
        );
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_saved_bindings_reload_identically() {
        let dir = temp_dir("save");
        let path = dir.join("custom.keymap");
        let mut table = BindingTable::default();
        table.apply_overrides("META_START 0x0003\n");

        save_bindings(&path, &table).unwrap();
        let loaded = load_bindings(&dir, Some("custom")).unwrap();

        assert_eq!(loaded.table, table);
        std::fs::remove_dir_all(&dir).ok();
    }
}
