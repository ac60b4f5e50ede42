//! File access used by the resource cache.
//!
//! The cache never touches `std::fs` directly; it asks a [`FileSystem`] whether
//! a path exists and opens it through the same handle. [`MemoryFileSystem`]
//! serves files from memory for tests and for embedders that pack assets.

use std::collections::HashMap;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Path-existence and open primitives.
pub trait FileSystem {
    /// Returns true if `path` names an existing file.
    fn exists(&self, path: &Path) -> bool;

    /// Opens `path` for reading.
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read>>;
}

/// The host file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read>> {
        Ok(Box::new(io::BufReader::new(std::fs::File::open(path)?)))
    }
}

/// Files held in memory, keyed by their full path.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    files: HashMap<PathBuf, Rc<[u8]>>,
}

impl MemoryFileSystem {
    /// Creates an empty file system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a file.
    pub fn insert(&mut self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), Rc::from(contents.into()));
    }

    /// Builder variant of [`MemoryFileSystem::insert`].
    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(path, contents);
        self
    }

    /// Removes a file, returning whether it existed.
    pub fn remove(&mut self, path: &Path) -> bool {
        self.files.remove(path).is_some()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Reader over shared in-memory file contents.
struct SharedBytes(Rc<[u8]>);

impl AsRef<[u8]> for SharedBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FileSystem for MemoryFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read>> {
        let contents = self.files.get(path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not in the memory file system", path.display()),
            )
        })?;
        Ok(Box::new(Cursor::new(SharedBytes(Rc::clone(contents)))))
    }
}
