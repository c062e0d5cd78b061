//! Parser for internet shortcut (`.url`) files.
//!
//! These are small INI-style text files. Depending on the tool that wrote
//! them they may be UTF-8 or UTF-16LE (with or without a BOM), so the raw
//! bytes are decoded leniently before the `URL=` and `IconFile=` keys are
//! looked up.

/// The fields of an internet shortcut used for icon lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InternetShortcut {
    pub url: Option<String>,
    pub icon_file: Option<String>,
}

fn utf16le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

/// Decodes the raw file bytes to text.
///
/// A `FF FE` byte-order mark selects UTF-16LE. Otherwise UTF-8 is tried,
/// and if the result contains NUL characters the bytes are re-read as
/// UTF-16LE. Any NULs left after that are dropped.
pub fn decode_text(bytes: &[u8]) -> String {
    let text = if bytes.starts_with(&[0xFF, 0xFE]) {
        utf16le(&bytes[2..])
    } else {
        let utf8 = String::from_utf8_lossy(bytes).into_owned();
        if utf8.contains('\0') {
            utf16le(bytes)
        } else {
            utf8
        }
    };
    text.trim_start_matches('\u{FEFF}')
        .chars()
        .filter(|c| *c != '\0')
        .collect()
}

/// Value of the first line starting with `key` (case-insensitive), with
/// surrounding whitespace and quotes removed.
fn field(text: &str, key: &str) -> Option<String> {
    text.lines().find_map(|line| {
        let head = line.get(..key.len())?;
        if !head.eq_ignore_ascii_case(key) {
            return None;
        }
        let value = line[key.len()..].trim().replace('"', "");
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

/// Parses the bytes of a `.url` file. Missing keys are `None`.
pub fn parse(bytes: &[u8]) -> InternetShortcut {
    let text = decode_text(bytes);
    InternetShortcut {
        url: field(&text, "URL="),
        icon_file: field(&text, "IconFile="),
    }
}
