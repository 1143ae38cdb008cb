//! Core logic of the flash file manager.
//!
//! Everything in this crate is hardware independent: the firmware feeds it
//! request paths, query strings, and multipart body chunks, and it talks back
//! through the [`store::FileStore`] trait and `core::fmt::Write` sinks. That
//! keeps the whole request-handling surface testable on the host.

#![cfg_attr(not(test), no_std)]

pub mod content_type;
pub mod escape;
pub mod multipart;
pub mod page;
pub mod query;
pub mod session;
pub mod store;

pub use content_type::content_type_for;
pub use multipart::{MultipartError, MultipartStream, UploadEvent, UploadError};
pub use session::{SessionError, UploadSession};
pub use store::{Entries, FileEntry, FileName, FilePath, FileStore, MAX_FILES, MAX_NAME_LEN};
