//! Provides mechanisms to retrieve file-like data from several backends

use std::{
    borrow::Cow,
    collections::HashMap,
    error::Error,
    fmt::{self, Display},
    io,
    path::{Path, PathBuf},
};

use log::trace;

/// Read-only access to named blobs of binary content.
///
/// Implementations are shared between the event loop and loader threads.
pub trait FileStorage: Send + Sync {
    /// Returns the complete content stored under `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if nothing is stored under `path`
    /// and [`StorageError::Io`] if the backend failed to read it.
    fn get_content(&self, path: &Path) -> Result<Cow<'_, [u8]>, StorageError>;
}

/// Failure to retrieve a file from a [`FileStorage`].
#[derive(Debug)]
pub enum StorageError {
    /// Nothing is stored under the given path.
    NotFound(PathBuf),
    /// The file exists but could not be read.
    Io { path: PathBuf, source: io::Error },
}

impl Display for StorageError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::NotFound(path) => {
                write!(formatter, "file not found: {}", path.display())
            }
            StorageError::Io { path, source } => {
                write!(formatter, "failed to read {}: {source}", path.display())
            }
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StorageError::NotFound(_) => None,
            StorageError::Io { source, .. } => Some(source),
        }
    }
}

/// Keeps all files in memory.
#[derive(Default)]
pub struct StaticStorage {
    files: HashMap<PathBuf, Vec<u8>>,
}

impl StaticStorage {
    /// Adds a file.
    ///
    /// # Panics
    ///
    /// Panics if a file has already been stored under the same path.
    pub fn store(&mut self, path: impl Into<PathBuf>, content: Vec<u8>) {
        assert!(
            self.files.insert(path.into(), content).is_none(),
            "duplicate path"
        );
    }
}

impl FileStorage for StaticStorage {
    fn get_content(&self, path: &Path) -> Result<Cow<'_, [u8]>, StorageError> {
        match self.files.get(path) {
            Some(file) => Ok(Cow::Borrowed(file)),
            None => Err(StorageError::NotFound(path.to_path_buf())),
        }
    }
}

/// Reads files from the local file system, relative to a root directory.
///
/// Absolute paths passed to [`FileStorage::get_content`] ignore the root.
#[derive(Default)]
pub struct DirectoryStorage {
    root: PathBuf,
}

impl DirectoryStorage {
    /// Creates a storage rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileStorage for DirectoryStorage {
    fn get_content(&self, path: &Path) -> Result<Cow<'_, [u8]>, StorageError> {
        let full_path = self.root.join(path);
        trace!("reading {}", full_path.display());
        match std::fs::read(&full_path) {
            Ok(content) => Ok(Cow::Owned(content)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(full_path))
            }
            Err(source) => Err(StorageError::Io {
                path: full_path,
                source,
            }),
        }
    }
}
