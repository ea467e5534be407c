//! Properties files: `key=value` / `key: value` text documents.
//!
//! Grammar (the classic `.properties` format):
//!
//! - Lines whose first non-blank character is `#` or `!` are comments.
//! - A key ends at the first unescaped `=`, `:` or blank. Blanks around the
//!   separator are skipped; the rest of the line is the value.
//! - A line ending in an odd number of `\` continues on the next line; the
//!   continuation's leading blanks are dropped.
//! - Escapes: `\t`, `\n`, `\r`, `\f`, `\uXXXX`, and `\c` for any other `c`.
//!
//! Files are decoded as UTF-8, falling back to Latin-1 when the bytes are
//! not valid UTF-8.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::PropertiesError;

/// Text encoding a document was decoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Latin1,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Utf8 => write!(f, "UTF-8"),
            Encoding::Latin1 => write!(f, "ISO-8859-1"),
        }
    }
}

/// Decode `bytes` as UTF-8, or as Latin-1 if that fails. A leading UTF-8
/// byte-order mark is dropped.
pub fn decode(bytes: &[u8]) -> (String, Encoding) {
    match std::str::from_utf8(bytes) {
        Ok(text) => {
            let text = text.strip_prefix('\u{feff}').unwrap_or(text);
            (text.to_string(), Encoding::Utf8)
        }
        // Every byte is one code point in Latin-1.
        Err(_) => (bytes.iter().map(|&b| char::from(b)).collect(), Encoding::Latin1),
    }
}

/// String-to-string table, ordered by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a properties document.
    pub fn parse(text: &str) -> Result<Self, PropertiesError> {
        let mut props = Self::new();
        for (line_no, line) in logical_lines(text) {
            let (key, value) = split_entry(&line);
            let key = unescape(key, line_no)?;
            let value = unescape(value, line_no)?;
            props.entries.insert(key, value);
        }
        Ok(props)
    }

    /// Read, decode and parse the file at `path`.
    pub fn load(path: &Path) -> Result<(Self, Encoding), PropertiesError> {
        let bytes = std::fs::read(path).map_err(|source| PropertiesError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let (text, encoding) = decode(&bytes);
        if encoding != Encoding::Utf8 {
            warn!(path = %path.display(), %encoding, "properties file is not valid UTF-8, decoded as Latin-1");
        }
        let props = Self::parse(&text)?;
        debug!(path = %path.display(), entries = props.len(), "properties file loaded");
        Ok((props, encoding))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Copy every entry of `other` into `self`; `other` wins on collisions.
    pub fn merge(&mut self, other: Properties) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Properties {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Properties {
    type Item = (String, String);
    type IntoIter = std::collections::btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\u{c}')
}

/// Number of `\` at the end of `line`.
fn trailing_backslashes(line: &str) -> usize {
    line.chars().rev().take_while(|&c| c == '\\').count()
}

/// Join continuation lines and drop comments and blank lines. Yields the
/// 1-based number of the line each logical line started on.
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut current: Option<(usize, String)> = None;

    for (index, raw) in text.lines().enumerate() {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        let trimmed = raw.trim_start_matches(is_blank);

        let (start, mut buf) = match current.take() {
            Some(pending) => pending,
            None => {
                if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                    continue;
                }
                (index + 1, String::new())
            }
        };

        if trailing_backslashes(trimmed) % 2 == 1 {
            buf.push_str(&trimmed[..trimmed.len() - 1]);
            current = Some((start, buf));
        } else {
            buf.push_str(trimmed);
            out.push((start, buf));
        }
    }

    // A dangling continuation at end of input still counts.
    if let Some(pending) = current {
        out.push(pending);
    }
    out
}

/// Split a logical line into its raw (still escaped) key and value.
fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = i;
                break;
            }
            c if is_blank(c) => {
                key_end = i;
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let mut rest = line[key_end..].trim_start_matches(is_blank);
    if let Some(after) = rest.strip_prefix(['=', ':']) {
        rest = after.trim_start_matches(is_blank);
    }
    (key, rest)
}

fn unescape(raw: &str, line: usize) -> Result<String, PropertiesError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let code = (hex.len() == 4)
                    .then(|| u32::from_str_radix(&hex, 16).ok())
                    .flatten()
                    .and_then(char::from_u32)
                    .ok_or(PropertiesError::MalformedUnicodeEscape { line })?;
                out.push(code);
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    Ok(out)
}
