//! Instance references (`#123`) and the data-section lines that define them.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::document::{Document, Position};
use crate::line_index::LineIndex;
use crate::types::{DefinitionLine, InstanceReference};

/// `#` followed by one or more digits.
static REFERENCE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used, reason = "literal pattern")]
    return Regex::new(r"#[0-9]+").unwrap();
});

/// The instance reference under the cursor, if any.
pub fn extract_reference_at(doc: &dyn Document, position: Position) -> Option<InstanceReference> {
    let range = doc.word_range_at_position(position, &REFERENCE_TOKEN)?;
    let text = doc.text_in_range(range);
    if text.len() <= 1 || !text.starts_with('#') {
        return None;
    }
    return InstanceReference::parse(&text);
}

/// Scan top to bottom for the first line defining `reference`.
///
/// A line defines `reference` when, after leading whitespace, it starts with
/// the reference verbatim and the next character exists and is not a digit.
/// So `#1` never matches `#12=...`, and a bare `#1` at end of line is rejected.
pub fn find_definition(doc: &dyn Document, reference: &InstanceReference) -> Option<DefinitionLine> {
    let index = LineIndex::new(doc);
    return index
        .lines()
        .find(|(_, line)| {
            return line_defines(line.text, line.first_non_whitespace, reference.as_str());
        })
        .map(|(number, line)| return DefinitionLine { line: number, text: line.text.to_string() });
}

/// Whether the text at `start` begins with `reference` followed by a non-digit.
fn line_defines(text: &str, start: usize, reference: &str) -> bool {
    let Some(rest) = text.get(start..).and_then(|t| return t.strip_prefix(reference)) else {
        return false;
    };
    return rest.chars().next().is_some_and(|c| return !c.is_ascii_digit());
}

/// The `#N` token a line defines, under the same rule as `find_definition`.
fn defining_token(text: &str, start: usize) -> Option<&str> {
    let rest = text.get(start..)?;
    let digits = rest.strip_prefix('#')?;
    let run = digits.bytes().take_while(u8::is_ascii_digit).count();
    if run == 0 {
        return None;
    }
    let token_len = run.checked_add(1)?;
    // The maximal digit run already guarantees the next char is a non-digit;
    // it must exist.
    if rest.len() <= token_len {
        return None;
    }
    return rest.get(..token_len);
}

/// Reference token to defining line, built in one pass over the document.
///
/// Equivalent to calling `find_definition` for every reference: the first
/// defining line wins when numbering is duplicated.
#[derive(Debug, Clone, Default)]
pub struct DefinitionIndex {
    /// Token text (`#N`) to zero-based line number.
    lines: HashMap<String, usize>,
}

impl DefinitionIndex {
    /// Index every defining line of `doc`.
    pub fn build(doc: &dyn Document) -> Self {
        let index = LineIndex::new(doc);
        let mut lines = HashMap::new();
        for (number, line) in index.lines() {
            if let Some(token) = defining_token(line.text, line.first_non_whitespace) {
                lines.entry(token.to_string()).or_insert(number);
            }
        }
        tracing::debug!(uri = doc.uri(), definitions = lines.len(), "built definition index");
        return Self { lines };
    }

    /// Number of distinct defined references.
    pub fn len(&self) -> usize {
        return self.lines.len();
    }

    /// Whether no line defines anything.
    pub fn is_empty(&self) -> bool {
        return self.lines.is_empty();
    }

    /// Look up the defining line of `reference` in `doc`.
    ///
    /// `doc` must be the revision the index was built from.
    pub fn lookup(&self, doc: &dyn Document, reference: &InstanceReference) -> Option<DefinitionLine> {
        let &line = self.lines.get(reference.as_str())?;
        if line >= doc.line_count() {
            return None;
        }
        return Some(DefinitionLine { line, text: doc.line_at(line).text.to_string() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TextDocument;

    const DATA: &str = "DATA;\n#1=IFCPERSON($,$,'A',$,$,$,$,$);\n#12=IFCORGANIZATION($,'B',$,$,$);\n  #20 = IFCPERSONANDORGANIZATION(#1,#12,$);\nENDSEC;";

    fn reference(text: &str) -> InstanceReference {
        return InstanceReference::parse(text).unwrap();
    }

    #[test]
    fn extracts_reference_under_cursor() {
        let doc = TextDocument::new("a.ifc", DATA);
        let found = extract_reference_at(&doc, Position::new(3, 34)).unwrap();
        assert_eq!(found.as_str(), "#1");
        let found = extract_reference_at(&doc, Position::new(3, 37)).unwrap();
        assert_eq!(found.as_str(), "#12");
    }

    #[test]
    fn no_reference_on_type_name() {
        let doc = TextDocument::new("a.ifc", DATA);
        assert!(extract_reference_at(&doc, Position::new(1, 6)).is_none());
    }

    #[test]
    fn prefix_does_not_match_longer_number() {
        let doc = TextDocument::new("a.ifc", DATA);
        let found = find_definition(&doc, &reference("#1")).unwrap();
        assert_eq!(found.line, 1);
        let found = find_definition(&doc, &reference("#12")).unwrap();
        assert_eq!(found.line, 2);
    }

    #[test]
    fn indented_definition_found() {
        let doc = TextDocument::new("a.ifc", DATA);
        let found = find_definition(&doc, &reference("#20")).unwrap();
        assert_eq!(found.text, "  #20 = IFCPERSONANDORGANIZATION(#1,#12,$);");
    }

    #[test]
    fn undefined_reference_not_found() {
        let doc = TextDocument::new("a.ifc", DATA);
        assert!(find_definition(&doc, &reference("#2")).is_none());
    }

    #[test]
    fn bare_reference_at_end_of_line_rejected() {
        let doc = TextDocument::new("a.ifc", "#7\n#7=IFCWALL();");
        let found = find_definition(&doc, &reference("#7")).unwrap();
        assert_eq!(found.line, 1);
    }

    #[test]
    fn first_duplicate_definition_wins() {
        let doc = TextDocument::new("a.ifc", "#3=IFCA();\n#3=IFCB();");
        assert_eq!(find_definition(&doc, &reference("#3")).unwrap().line, 0);
        let index = DefinitionIndex::build(&doc);
        assert_eq!(index.lookup(&doc, &reference("#3")).unwrap().line, 0);
    }

    #[test]
    fn index_agrees_with_linear_scan() {
        let doc = TextDocument::new("a.ifc", DATA);
        let index = DefinitionIndex::build(&doc);
        assert_eq!(index.len(), 3);
        for token in ["#1", "#12", "#20", "#2", "#120"] {
            let r = reference(token);
            assert_eq!(index.lookup(&doc, &r), find_definition(&doc, &r), "{token}");
        }
    }
}
