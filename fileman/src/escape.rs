//! Escaping for user-controlled file names embedded into the manager page.

use core::fmt::{self, Write};

/// Write `text` with HTML metacharacters replaced by entities.
///
/// Safe for element text, quoted attribute values, and single-quoted
/// JavaScript string literals inside attributes (`'` becomes `&#39;`).
pub fn write_escaped(out: &mut impl Write, text: &str) -> fmt::Result {
    for ch in text.chars() {
        match ch {
            '&' => out.write_str("&amp;")?,
            '<' => out.write_str("&lt;")?,
            '>' => out.write_str("&gt;")?,
            '"' => out.write_str("&quot;")?,
            '\'' => out.write_str("&#39;")?,
            _ => out.write_char(ch)?,
        }
    }
    Ok(())
}

/// Write `text` percent-encoded for use as a URL path segment or query value.
pub fn write_query_encoded(out: &mut impl Write, text: &str) -> fmt::Result {
    for byte in text.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.write_char(byte as char)?;
            }
            _ => write!(out, "%{:02X}", byte)?,
        }
    }
    Ok(())
}
