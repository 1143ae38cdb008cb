//! File manager page, rendered as a stream of fixed pieces and per-entry rows.
//!
//! The page is never assembled as one string; the handler writes
//! [`PAGE_HEAD`], then one row (or [`EMPTY_NOTICE`]) at a time, then
//! [`PAGE_FOOT`]. File names are escaped at every interpolation point.

use core::fmt::{self, Write};

use crate::escape::{write_escaped, write_query_encoded};
use crate::store::FileEntry;

/// Upper bound of one rendered row: two escaped and two percent-encoded
/// copies of a worst-case name plus the surrounding markup.
pub const MAX_ROW_LEN: usize = 1600;

/// Document head, styles, upload form, and the opening of the file list.
pub const PAGE_HEAD: &str = "<!DOCTYPE html><html><head>\
<meta charset='UTF-8'>\
<meta name='viewport' content='width=device-width, initial-scale=1.0'>\
<title>File manager</title>\
<style>\
body { font-family: Arial; padding: 20px; background: #2f2f2f; color: white; }\
#files { margin-top: 15px; }\
button { padding: 5px 10px; margin: 5px; cursor: pointer; }\
.file { padding: 6px; border-bottom: 1px solid #444; display: flex; justify-content: space-between; align-items: center; }\
.file:hover { background: #444; }\
.file a { color: #4CAF50; text-decoration: none; }\
.delete-btn { color: #ff4444; cursor: pointer; padding: 5px; }\
.upload-form { margin: 20px 0; padding: 15px; background: #444; border-radius: 5px; }\
</style></head><body>\
<h1>File manager</h1>\
<div class='upload-form'>\
<form method='POST' action='/upload' enctype='multipart/form-data'>\
<input type='file' name='file' required>\
<button type='submit'>Upload file</button>\
</form></div>\
<h2>Files:</h2><div id='files'>";

/// Shown in place of rows when the root directory is empty.
pub const EMPTY_NOTICE: &str = "<p>File system is empty</p>";

/// Closes the list and the document.
pub const PAGE_FOOT: &str =
    "</div><br><a href='/' style='color: #4CAF50;'>&larr; Back</a></body></html>";

/// Fallback for `GET /` when the application page has not been uploaded yet.
pub const INDEX_FALLBACK: &str = "<h1>Upload the application page through the \
<a href='/filemanager'>file manager</a></h1>";

/// Render one file row: download link with name and size, and a delete
/// control guarded by a client-side confirmation.
pub fn write_row(out: &mut impl Write, entry: &FileEntry) -> fmt::Result {
    out.write_str("<div class='file'><a href='/")?;
    write_query_encoded(out, &entry.name)?;
    out.write_str("'>")?;
    write_escaped(out, &entry.name)?;
    write!(out, " ({} bytes)</a>", entry.size)?;
    out.write_str("<span class='delete-btn' onclick=\"if(confirm('Delete ")?;
    write_escaped(out, &entry.name)?;
    out.write_str("?')) window.location='/delete?file=")?;
    write_query_encoded(out, &entry.name)?;
    out.write_str("'\"> Delete</span></div>")?;
    Ok(())
}
