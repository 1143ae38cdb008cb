//! The filesystem seam between request handlers and the flash filesystem.

use heapless::{String, Vec};

/// Longest accepted file name, without the leading slash.
pub const MAX_NAME_LEN: usize = 64;

/// Room for the root slash in front of a name.
pub const MAX_PATH_LEN: usize = MAX_NAME_LEN + 1;

/// Directory listings are capped at this many entries.
pub const MAX_FILES: usize = 32;

pub type FileName = String<MAX_NAME_LEN>;
pub type FilePath = String<MAX_PATH_LEN>;

/// One root-directory entry, as reported by the filesystem at request time.
///
/// Nothing is cached between requests; an entry only exists for as long as
/// the listing that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Bare name, no leading slash.
    pub name: FileName,
    /// Size in bytes.
    pub size: usize,
}

pub type Entries = Vec<FileEntry, MAX_FILES>;

/// Storage operations the request handlers need.
///
/// Paths start with `/` and name files in the filesystem root. Implementations
/// are free to open and close handles per call; handlers never hold a handle
/// across operations.
pub trait FileStore {
    type Error: core::fmt::Debug;

    /// Does a file exist at `path`?
    fn exists(&self, path: &str) -> bool;

    /// Size of the file at `path`, in bytes.
    fn size(&self, path: &str) -> Result<usize, Self::Error>;

    /// Read up to `buf.len()` bytes starting at `offset`; returns the count
    /// actually read (0 at end of file).
    fn read_at(&self, path: &str, offset: usize, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Create the file at `path`, truncating any previous content.
    fn create(&self, path: &str) -> Result<(), Self::Error>;

    /// Append `data` to an existing file.
    fn append(&self, path: &str, data: &[u8]) -> Result<(), Self::Error>;

    /// Delete the file at `path`.
    fn remove(&self, path: &str) -> Result<(), Self::Error>;

    /// Enumerate the root directory.
    fn entries(&self) -> Result<Entries, Self::Error>;
}

/// Prefix a bare file name with the filesystem root.
///
/// Returns `None` when the result would not fit [`MAX_PATH_LEN`].
pub fn rooted(name: &str) -> Option<FilePath> {
    let mut path = FilePath::new();
    if !name.starts_with('/') {
        path.push('/').ok()?;
    }
    path.push_str(name).ok()?;
    Some(path)
}
