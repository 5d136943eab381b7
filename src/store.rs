//! Payload file store.
//!
//! The wizard state machine never touches the file system directly; it goes
//! through the [`FileStore`] capability, which loads a named payload fully
//! into memory and reports its size. This keeps the state machine testable
//! with an in-memory store and keeps the disk access in one place.

use std::fs;
use std::path::PathBuf;

use hexplay::HexViewBuilder;
use log::{debug, log_enabled, Level::Debug};
use thiserror::Error;

use crate::settings::DEFAULT_PAYLOAD;

// =============================================================================
// Public Interface
// =============================================================================

/// One payload resident in memory.
///
/// The byte count is always `bytes.len()`, so a `LoadedFile` can never claim
/// a size that does not match its buffer. `loaded` is false only for the
/// empty placeholder created at startup; a store never returns an unloaded
/// file.
#[derive(Debug, Clone, Default)]
pub struct LoadedFile {
    /// The name the payload was actually loaded under (after any fallback).
    pub name: String,
    /// The full payload content. Read to completion before the store
    /// returns; there is no partial or streamed load.
    pub bytes: Vec<u8>,
    /// Whether this instance holds a real payload.
    pub loaded: bool,
}
impl LoadedFile {
    /// The empty placeholder owned by the application before any load.
    pub fn empty() -> Self {
        LoadedFile::default()
    }

    /// Payload size in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Errors reported by a payload store.
///
/// A lookup failure is not fatal to the wizard: the state machine stays on
/// the file-selection screen and the upload simply cannot start.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Neither the requested payload nor the fallback could be read.
    #[error("payload `{name}` not found")]
    NotFound { name: String },
}

/// Capability to load a named payload into memory.
pub trait FileStore: std::fmt::Debug {
    /// Read the payload identified by `name` fully into memory.
    ///
    /// The store may fall back to a single well-known default payload name
    /// when the exact name cannot be read; both failures propagate as
    /// [`StoreError::NotFound`]. No state outside the returned value is
    /// mutated.
    fn load(&mut self, name: &str) -> Result<LoadedFile, StoreError>;
}

/// The production [`FileStore`]: reads payloads from the file system.
///
/// Lookup policy: try the exact name first, then fall back once to
/// [`DEFAULT_PAYLOAD`] in the store's base directory.
#[derive(Debug)]
pub struct DiskStore {
    base: PathBuf,
}
impl DiskStore {
    /// A store rooted at the current working directory.
    pub fn new() -> Self {
        DiskStore::in_dir(".")
    }

    /// A store rooted at `base`. Relative payload names (and the fallback)
    /// resolve under it; absolute names are used as given.
    pub fn in_dir(base: impl Into<PathBuf>) -> Self {
        DiskStore { base: base.into() }
    }
}
impl Default for DiskStore {
    fn default() -> Self {
        DiskStore::new()
    }
}
impl FileStore for DiskStore {
    fn load(&mut self, name: &str) -> Result<LoadedFile, StoreError> {
        let (used, bytes) = match fs::read(self.base.join(name)) {
            Ok(bytes) => (name.to_owned(), bytes),
            Err(e) => {
                debug!("`{}` error: {}", name, e);
                debug!("falling back to `{}`", DEFAULT_PAYLOAD);
                match fs::read(self.base.join(DEFAULT_PAYLOAD)) {
                    Ok(bytes) => (DEFAULT_PAYLOAD.to_owned(), bytes),
                    Err(e) => {
                        debug!("`{}` error: {}", DEFAULT_PAYLOAD, e);
                        return Err(StoreError::NotFound {
                            name: name.to_owned(),
                        });
                    }
                }
            }
        };

        debug!("loaded `{}`, {} bytes", used, bytes.len());

        // Dump the head of the payload in a hex table for debugging
        if log_enabled!(Debug) {
            let head = &bytes[..bytes.len().min(64)];
            let view = HexViewBuilder::new(head)
                .address_offset(0)
                .row_width(16)
                .finish();
            println!("{}", view);
        }

        Ok(LoadedFile {
            name: used,
            bytes,
            loaded: true,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn scratch_file(name: &str, size: usize) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("uplink-store-{}-{}", std::process::id(), name));
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(&vec![0xA5; size]).unwrap();
        path
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("uplink-store-{}-{}", std::process::id(), name));
        fs::create_dir_all(&path).unwrap();
        path
    }

    #[test]
    fn load_exact_name() {
        let path = scratch_file("exact.bin", 1024);
        let mut store = DiskStore::new();
        let file = store.load(path.to_str().unwrap()).unwrap();
        assert!(file.loaded);
        assert_eq!(file.size(), 1024);
        assert_eq!(file.name, path.to_str().unwrap());
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn missing_name_falls_back_to_the_default_payload() {
        let dir = scratch_dir("fallback");
        fs::write(dir.join(DEFAULT_PAYLOAD), vec![0x5A; 256]).unwrap();

        let mut store = DiskStore::in_dir(&dir);
        let file = store.load("wrong-name.bin").unwrap();
        assert!(file.loaded);
        assert_eq!(file.name, DEFAULT_PAYLOAD);
        assert_eq!(file.size(), 256);
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn missing_payload_is_not_found() {
        // An empty base directory, so neither the name nor the fallback can
        // be read.
        let dir = scratch_dir("empty");
        let mut store = DiskStore::in_dir(&dir);
        let err = store.load("uplink-definitely-missing.bin").unwrap_err();
        match err {
            StoreError::NotFound { name } => {
                assert_eq!(name, "uplink-definitely-missing.bin")
            }
        }
        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn empty_placeholder_reports_unloaded() {
        let file = LoadedFile::empty();
        assert!(!file.loaded);
        assert_eq!(file.size(), 0);
        assert!(file.name.is_empty());
    }
}
