//! The host's text document: line access, range text, and word ranges.
//!
//! Positions are zero-based `(line, character)` pairs where `character`
//! counts Unicode scalar values, not bytes.

use std::path::Path;

use regex::Regex;

use crate::error::Error;

/// Language id answered by the resolution service.
pub const STEP_LANGUAGE_ID: &str = "step";

/// File extensions opened as STEP documents.
pub const STEP_EXTENSIONS: [&str; 4] = ["ifc", "stp", "step", "p21"];

/// A cursor location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    /// Zero-based character offset within the line.
    pub character: usize,
    /// Zero-based line number.
    pub line: usize,
}

impl Position {
    /// Construct from zero-based line and character.
    pub const fn new(line: usize, character: usize) -> Self {
        return Self { character, line };
    }
}

/// A half-open span between two positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    /// Exclusive end.
    pub end: Position,
    /// Inclusive start.
    pub start: Position,
}

/// One line as seen by the core.
#[derive(Debug, Clone, Copy)]
pub struct TextLine<'a> {
    /// Byte index of the first non-whitespace character (line length if blank).
    pub first_non_whitespace: usize,
    /// Line text without the line terminator.
    pub text: &'a str,
}

impl<'a> TextLine<'a> {
    /// Build a line view, computing the leading-whitespace boundary.
    pub fn new(text: &'a str) -> Self {
        let first_non_whitespace = text
            .char_indices()
            .find(|(_, c)| return !c.is_whitespace())
            .map_or(text.len(), |(i, _)| return i);
        return Self { first_non_whitespace, text };
    }
}

/// A read-only text document owned by the host editor.
///
/// `line_at` panics on an out-of-range index; callers bound-check with
/// `line_count`.
pub trait Document {
    /// Language identifier assigned by the host.
    fn language_id(&self) -> &str;

    /// Number of lines in the document.
    fn line_count(&self) -> usize;

    /// The line at `index`.
    fn line_at(&self, index: usize) -> TextLine<'_>;

    /// Stable identifier of the document.
    fn uri(&self) -> &str;

    /// Revision counter; changes on every edit.
    fn version(&self) -> u64;

    /// Text covered by `range`, lines joined with `\n`.
    fn text_in_range(&self, range: Range) -> String {
        let last = range.end.line.min(self.line_count().saturating_sub(1));
        let mut out = String::new();
        for index in range.start.line..=last {
            if index >= self.line_count() {
                break;
            }
            let text = self.line_at(index).text;
            let from = if index == range.start.line { range.start.character } else { 0 };
            let to = if index == range.end.line { range.end.character } else { usize::MAX };
            out.push_str(&char_slice(text, from, to));
            if index != last {
                out.push('\n');
            }
        }
        return out;
    }

    /// The range of the `pattern` match on the cursor's line that contains the
    /// cursor, touching either end included. `None` when no match covers it.
    fn word_range_at_position(&self, position: Position, pattern: &Regex) -> Option<Range> {
        if position.line >= self.line_count() {
            return None;
        }
        let text = self.line_at(position.line).text;
        let cursor = byte_offset(text, position.character)?;
        let found = pattern
            .find_iter(text)
            .find(|m| return m.start() <= cursor && cursor <= m.end())?;
        return Some(Range {
            end: Position::new(position.line, char_offset(text, found.end())),
            start: Position::new(position.line, char_offset(text, found.start())),
        });
    }
}

/// In-memory document used by the command-line host and tests.
#[derive(Debug, Clone)]
pub struct TextDocument {
    /// Language id derived from the file extension.
    language_id: String,
    /// Lines with terminators stripped.
    lines: Vec<String>,
    /// Document identifier (path or synthetic uri).
    uri: String,
    /// Bumped by `replace_text`.
    version: u64,
}

impl TextDocument {
    /// A STEP document from raw text.
    pub fn new(uri: &str, text: &str) -> Self {
        return Self {
            language_id: STEP_LANGUAGE_ID.to_string(),
            lines: split_lines(text),
            uri: uri.to_string(),
            version: 0,
        };
    }

    /// Read a document from disk. The language id is `step` for STEP
    /// extensions and `plaintext` otherwise.
    ///
    /// # Errors
    ///
    /// Returns `Error::FileNotFound` if the file is missing, `Error::Io` otherwise.
    pub fn open(path: &Path) -> Result<Self, Error> {
        let text = match std::fs::read_to_string(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::FileNotFound { path: path.to_path_buf() });
            },
            Err(e) => return Err(Error::Io(e)),
            Ok(t) => t,
        };
        let mut doc = Self::new(&path.display().to_string(), &text);
        if !is_step_path(path) {
            doc.language_id = "plaintext".to_string();
        }
        return Ok(doc);
    }

    /// Replace the whole content and bump the version.
    pub fn replace_text(&mut self, text: &str) {
        self.lines = split_lines(text);
        self.version = self.version.saturating_add(1);
    }
}

impl Document for TextDocument {
    fn language_id(&self) -> &str {
        return &self.language_id;
    }

    fn line_count(&self) -> usize {
        return self.lines.len();
    }

    #[allow(clippy::indexing_slicing, reason = "out-of-range line index is a caller bug")]
    fn line_at(&self, index: usize) -> TextLine<'_> {
        return TextLine::new(&self.lines[index]);
    }

    fn uri(&self) -> &str {
        return &self.uri;
    }

    fn version(&self) -> u64 {
        return self.version;
    }
}

/// Whether a path carries one of the STEP extensions (case-insensitive).
pub fn is_step_path(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|e| return e.to_str()) else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();
    return STEP_EXTENSIONS.contains(&ext.as_str());
}

/// Split on `\n`, dropping a trailing `\r` per line. A trailing newline does
/// not produce an extra empty line; empty text is one empty line.
fn split_lines(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = text
        .split('\n')
        .map(|l| return l.strip_suffix('\r').unwrap_or(l).to_string())
        .collect();
    if lines.len() > 1 && lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    return lines;
}

/// Byte index of the `character`-th char, allowing one past the end.
fn byte_offset(text: &str, character: usize) -> Option<usize> {
    if character == text.chars().count() {
        return Some(text.len());
    }
    return text.char_indices().nth(character).map(|(i, _)| return i);
}

/// Character index of a byte offset that lies on a char boundary.
fn char_offset(text: &str, byte: usize) -> usize {
    return text.get(..byte).map_or(0, |prefix| return prefix.chars().count());
}

/// Characters `from..to` of `text`, clamped to the line.
fn char_slice(text: &str, from: usize, to: usize) -> String {
    return text
        .chars()
        .skip(from)
        .take(to.saturating_sub(from))
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crlf_lines_are_stripped() {
        let doc = TextDocument::new("a.ifc", "ISO-10303-21;\r\nHEADER;\r\n");
        assert_eq!(doc.line_count(), 2);
        assert_eq!(doc.line_at(1).text, "HEADER;");
    }

    #[test]
    fn first_non_whitespace_skips_indent() {
        let line = TextLine::new("   #10=IFCWALL();");
        assert_eq!(line.first_non_whitespace, 3);
        assert_eq!(TextLine::new("    ").first_non_whitespace, 4);
    }

    #[test]
    fn word_range_contains_cursor_at_either_end() {
        let doc = TextDocument::new("a.ifc", "#5=IFCX(#10,#20);");
        let pattern = Regex::new(r"#[0-9]+").unwrap();
        let range = doc.word_range_at_position(Position::new(0, 9), &pattern).unwrap();
        assert_eq!(doc.text_in_range(range), "#10");
        let range = doc.word_range_at_position(Position::new(0, 11), &pattern).unwrap();
        assert_eq!(doc.text_in_range(range), "#10");
        assert!(doc.word_range_at_position(Position::new(0, 5), &pattern).is_none());
    }

    #[test]
    fn text_in_range_spans_lines() {
        let doc = TextDocument::new("a.ifc", "ab\ncd\nef");
        let range = Range { start: Position::new(0, 1), end: Position::new(2, 1) };
        assert_eq!(doc.text_in_range(range), "b\ncd\ne");
    }

    #[test]
    fn step_extensions_are_case_insensitive() {
        assert!(is_step_path(Path::new("model.IFC")));
        assert!(is_step_path(Path::new("part.stp")));
        assert!(!is_step_path(Path::new("notes.txt")));
    }
}
