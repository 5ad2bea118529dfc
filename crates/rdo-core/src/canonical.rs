//! Canonical text encoding for rule sets.
//!
//! A rule set is hashed over this encoding, so it must be byte-stable:
//! - Object keys sorted by byte comparison, at every nesting level
//! - Strings quoted, with `"` and `\` escaped and control characters as `\u00XX`
//! - Integers and booleans written literally
//! - No floats, no whitespace, no trailing separators
//!
//! **This encoding is frozen.** Changing it changes every rules hash.

use std::fmt::Write;

/// A value in the canonical encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalValue {
    Text(String),
    Integer(u64),
    Bool(bool),
    Array(Vec<CanonicalValue>),
    Object(Vec<(String, CanonicalValue)>),
}

impl CanonicalValue {
    /// Build an object from `(key, value)` pairs in any order.
    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, CanonicalValue)>) -> Self {
        Self::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }
}

/// Encode a value to its canonical string.
pub fn encode_canonical(value: &CanonicalValue) -> String {
    let mut buf = String::new();
    encode_value_to(&mut buf, value);
    buf
}

/// Recursively encode a value.
fn encode_value_to(buf: &mut String, value: &CanonicalValue) {
    match value {
        CanonicalValue::Text(s) => encode_text(buf, s),
        CanonicalValue::Integer(n) => {
            let _ = write!(buf, "{n}");
        }
        CanonicalValue::Bool(b) => buf.push_str(if *b { "true" } else { "false" }),
        CanonicalValue::Array(items) => {
            buf.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    buf.push(',');
                }
                encode_value_to(buf, item);
            }
            buf.push(']');
        }
        CanonicalValue::Object(entries) => encode_object_canonical(buf, entries),
    }
}

/// Encode a quoted, escaped string.
fn encode_text(buf: &mut String, s: &str) {
    buf.push('"');
    for c in s.chars() {
        match c {
            '"' => buf.push_str("\\\""),
            '\\' => buf.push_str("\\\\"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                let _ = write!(buf, "\\u{:04x}", c as u32);
            }
            c => buf.push(c),
        }
    }
    buf.push('"');
}

/// Encode an object with keys sorted by byte comparison.
fn encode_object_canonical(buf: &mut String, entries: &[(String, CanonicalValue)]) {
    let mut sorted: Vec<&(String, CanonicalValue)> = entries.iter().collect();
    sorted.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
    debug_assert!(
        sorted.windows(2).all(|w| w[0].0 != w[1].0),
        "duplicate key in canonical object"
    );

    buf.push('{');
    for (i, (key, value)) in sorted.into_iter().enumerate() {
        if i > 0 {
            buf.push(',');
        }
        encode_text(buf, key);
        buf.push(':');
        encode_value_to(buf, value);
    }
    buf.push('}');
}
