mod element;
mod manifest;
mod resources;

pub use element::{Attribute, Document, Element};
pub use manifest::{Manifest, ManifestParser};
pub use resources::StringResources;

use serde::Serialize;
use thiserror::Error;

/// Namespace of the `android:` attributes
pub const ANDROID_URI: &str = "http://schemas.android.com/apk/res/android";

/// Namespace of the `tools:` attributes and elements
pub const TOOLS_URI: &str = "http://schemas.android.com/tools";

/// Errors raised while building an element tree
#[derive(Debug, Error)]
pub enum XmlError {
    #[error("malformed XML at line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("document has no root element")]
    MissingRoot,

    #[error("invalid value for attribute {name} at line {line}: {message}")]
    InvalidAttribute {
        name: String,
        line: usize,
        message: String,
    },
}

/// A position in a source file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    /// 1-based line
    pub line: usize,

    /// 1-based column, counted in characters
    pub column: usize,

    /// Byte offset
    pub offset: usize,
}

/// A range in a source file, end exclusive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// Maps byte offsets to line/column positions
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { line_starts }
    }

    pub fn position(&self, source: &str, offset: usize) -> Position {
        let offset = offset.min(source.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(index) => index,
            Err(index) => index - 1,
        };
        let line_start = self.line_starts[line];
        let column = source
            .get(line_start..offset)
            .map(|text| text.chars().count())
            .unwrap_or(offset - line_start);
        Position {
            line: line + 1,
            column: column + 1,
            offset,
        }
    }

    /// Text of a 1-based line, without its terminator
    pub fn line_text<'a>(&self, source: &'a str, line: usize) -> Option<&'a str> {
        let start = *self.line_starts.get(line.checked_sub(1)?)?;
        let end = self
            .line_starts
            .get(line)
            .map(|next| next - 1)
            .unwrap_or(source.len());
        source.get(start..end).map(|text| text.trim_end_matches('\r'))
    }
}
