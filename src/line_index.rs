//! Read-only line view shared by the parsers.

use crate::document::{Document, Position, Range, TextLine};

/// Adapter over a document's lines. Never mutates the document.
pub struct LineIndex<'a> {
    /// The wrapped document.
    doc: &'a dyn Document,
}

impl<'a> LineIndex<'a> {
    /// Wrap a document.
    pub fn new(doc: &'a dyn Document) -> Self {
        return Self { doc };
    }

    /// Iterate `(line number, line)` from the top of the document.
    pub fn lines(&self) -> impl Iterator<Item = (usize, TextLine<'a>)> + '_ {
        return (0..self.line_count()).map(|i| return (i, self.line_at(i)));
    }

    /// The line at `index`. Out-of-range indices panic in the host document.
    pub fn line_at(&self, index: usize) -> TextLine<'a> {
        return self.doc.line_at(index);
    }

    /// Number of lines.
    pub fn line_count(&self) -> usize {
        return self.doc.line_count();
    }

    /// Text from the document start through the end of line `last`.
    pub fn text_through_line(&self, last: usize) -> String {
        let end_character = self.line_at(last).text.chars().count();
        return self.doc.text_in_range(Range {
            end: Position::new(last, end_character),
            start: Position::new(0, 0),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TextDocument;

    #[test]
    fn text_through_line_includes_whole_last_line() {
        let doc = TextDocument::new("a.ifc", "HEADER;\nFILE_NAME('x');\nENDSEC;");
        let index = LineIndex::new(&doc);
        assert_eq!(index.text_through_line(1), "HEADER;\nFILE_NAME('x');");
    }

    #[test]
    fn lines_enumerates_in_order() {
        let doc = TextDocument::new("a.ifc", "a\n  b");
        let index = LineIndex::new(&doc);
        let collected: Vec<(usize, usize)> =
            index.lines().map(|(i, l)| return (i, l.first_non_whitespace)).collect();
        assert_eq!(collected, vec![(0, 0), (1, 2)]);
    }
}
