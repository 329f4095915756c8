//! Cell encoding for field values.
//!
//! Cells are plain text. Strings that contain a space or the separator are
//! wrapped in double quotes; embedded quote characters are written as-is,
//! so a string containing `"` together with the separator cannot be read
//! back unambiguously.

use std::borrow::Cow;

use dl_common::FieldValue;

/// Number of fractional digits written for floating point cells.
pub const FLOAT_PRECISION: usize = 6;

/// What to do with values that have no cell representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodeMode {
    /// Write an empty cell and carry on. The value is lost.
    #[default]
    DropUnsupported,
    /// Refuse the whole record.
    Reject,
}

/// Encodes field values into cells for a given separator.
#[derive(Debug, Clone, Copy)]
pub struct ValueEncoder {
    separator: char,
}

impl ValueEncoder {
    pub fn new(separator: char) -> Self {
        Self { separator }
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    /// Encode a value, returning `None` for unsupported values.
    pub fn encode(&self, value: &FieldValue) -> Option<String> {
        let cell = match value {
            FieldValue::Int(v) => v.to_string(),
            FieldValue::UInt(v) => v.to_string(),
            FieldValue::Float(v) => format!("{:.*}", FLOAT_PRECISION, v),
            FieldValue::Bool(true) => "TRUE".to_string(),
            FieldValue::Bool(false) => "FALSE".to_string(),
            FieldValue::Text(s) => self.quote(s).into_owned(),
            FieldValue::Unsupported(_) => return None,
        };
        Some(cell)
    }

    /// Encode a value, writing an empty cell for unsupported values.
    pub fn encode_cell(&self, value: &FieldValue) -> String {
        self.encode(value).unwrap_or_default()
    }

    /// Quote `s` if it contains a space or the separator.
    pub fn quote<'a>(&self, s: &'a str) -> Cow<'a, str> {
        if s.contains(' ') || s.contains(self.separator) {
            Cow::Owned(format!("\"{}\"", s))
        } else {
            Cow::Borrowed(s)
        }
    }
}

/// Split a row back into cells, honouring double-quoted cells.
///
/// Quotes only group; they are removed from the returned cells.
pub fn split_cells(line: &str, separator: char) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in line.chars() {
        if ch == '"' {
            in_quotes = !in_quotes;
        } else if ch == separator && !in_quotes {
            cells.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    cells.push(current);
    cells
}
