//! Re-openable partial sources.
//!
//! A partial is read several times: once to find its sections, once to
//! compute its digest, and again every time one of its sections is copied.
//! Each of those passes calls [`PartialSource::open`] and gets its own reader,
//! so no read cursor is ever shared between passes, documents, or threads.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A text source that can be opened any number of times.
pub trait PartialSource: fmt::Debug + Send + Sync {
    /// Opens a fresh reader positioned at the start of the source.
    fn open(&self) -> io::Result<Box<dyn Read + Send>>;

    /// Human-readable location of the source, used in logs and manifests.
    fn describe(&self) -> String;
}

/// A partial stored in a file, reopened on every read.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PartialSource for FileSource {
    fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        let file = File::open(&self.path)?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// A partial held in memory.
///
/// The bytes are shared, so cloning the source or opening it repeatedly never
/// copies the text.
#[derive(Clone)]
pub struct MemorySource {
    label: String,
    bytes: Arc<[u8]>,
}

impl MemorySource {
    pub fn new(label: impl Into<String>, text: impl AsRef<[u8]>) -> Self {
        Self {
            label: label.into(),
            bytes: Arc::from(text.as_ref()),
        }
    }
}

impl fmt::Debug for MemorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySource")
            .field("label", &self.label)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl PartialSource for MemorySource {
    fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(Cursor::new(SharedBytes(self.bytes.clone()))))
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

struct SharedBytes(Arc<[u8]>);

impl AsRef<[u8]> for SharedBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
