//! Upload session state machine.
//!
//! One session lives for the duration of one `/upload` request and applies
//! [`UploadEvent`]s to a [`FileStore`]. The two states are `Idle` (no file
//! open) and `Writing` (a created file is being appended to). A `Start`
//! arriving while `Writing` is an error rather than a silent replacement of
//! the previous file.

use crate::multipart::UploadEvent;
use crate::store::{FilePath, FileStore, MAX_NAME_LEN, rooted};

#[derive(Debug, PartialEq, Eq)]
pub enum SessionError<E> {
    /// A new part started before the previous one ended.
    AlreadyWriting,
    /// Empty, oversized, or path-traversing file name.
    BadName,
    /// The store failed.
    Store(E),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Writing,
}

#[derive(Debug)]
pub struct UploadSession {
    state: State,
    path: FilePath,
    written: usize,
    completed: usize,
}

impl UploadSession {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            path: FilePath::new(),
            written: 0,
            completed: 0,
        }
    }

    /// Is a file currently open for writing?
    pub fn is_writing(&self) -> bool {
        self.state == State::Writing
    }

    /// Bytes appended to the current (or last) file.
    pub fn bytes_written(&self) -> usize {
        self.written
    }

    /// Files fully received during this session.
    pub fn files_completed(&self) -> usize {
        self.completed
    }

    /// Path of the current (or last) file.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Apply one upload event against `store`.
    pub fn apply<S: FileStore>(
        &mut self,
        store: &S,
        event: UploadEvent<'_>,
    ) -> Result<(), SessionError<S::Error>> {
        match event {
            UploadEvent::Start { filename } => {
                if self.state == State::Writing {
                    return Err(SessionError::AlreadyWriting);
                }
                if !valid_name(filename) {
                    return Err(SessionError::BadName);
                }
                self.path = rooted(filename).ok_or(SessionError::BadName)?;
                store.create(&self.path).map_err(SessionError::Store)?;
                self.written = 0;
                self.state = State::Writing;
                Ok(())
            }
            UploadEvent::Chunk(data) => {
                // A chunk with no open file is dropped, matching the original
                // firmware's behavior.
                if self.state == State::Writing {
                    store.append(&self.path, data).map_err(SessionError::Store)?;
                    self.written += data.len();
                }
                Ok(())
            }
            UploadEvent::End => {
                if self.state == State::Writing {
                    self.state = State::Idle;
                    self.completed += 1;
                }
                Ok(())
            }
        }
    }
}

impl Default for UploadSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Client-declared names must be bare file names: nothing below this layer
/// sanitizes paths, so separators and `..` are rejected here.
fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains("..")
}
