//! Query string parameter extraction.

use heapless::{String, Vec};

/// Look up `key` in an `a=1&b=2` style query string and percent-decode its
/// value. Returns `None` when the key is absent, the value does not decode,
/// or it does not fit `N` bytes.
pub fn param<const N: usize>(query: &str, key: &str) -> Option<String<N>> {
    for pair in query.split('&') {
        let (name, value) = match pair.split_once('=') {
            Some(split) => split,
            None => (pair, ""),
        };
        if name == key {
            return decode(value);
        }
    }
    None
}

fn decode<const N: usize>(raw: &str) -> Option<String<N>> {
    let mut bytes = Vec::<u8, N>::new();
    let input = raw.as_bytes();
    let mut i = 0;
    while i < input.len() {
        let byte = match input[i] {
            b'+' => {
                i += 1;
                b' '
            }
            b'%' => {
                let hi = hex_value(*input.get(i + 1)?)?;
                let lo = hex_value(*input.get(i + 2)?)?;
                i += 3;
                hi << 4 | lo
            }
            other => {
                i += 1;
                other
            }
        };
        bytes.push(byte).ok()?;
    }

    let text = core::str::from_utf8(&bytes).ok()?;
    let mut out = String::new();
    out.push_str(text).ok()?;
    Some(out)
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
