//! Header-section schema detection and the closed set of known IFC schemas.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::document::Document;
use crate::line_index::LineIndex;

/// Terminates the header section (and every other section).
const END_OF_SECTION: &str = "ENDSEC;";

/// Statement keyword carrying the schema list.
const FILE_SCHEMA: &str = "FILE_SCHEMA";

/// `(( 'NAME' ))` with optional whitespace around each parenthesis.
static SCHEMA_NAME: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used, reason = "literal pattern")]
    return Regex::new(r"(\s*\(\s*){2}'(.*)'(\s*\)\s*){2}").unwrap();
});

/// Known IFC schema generations. Each carries its documentation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaVersion {
    /// IFC2x3 family, including revision suffixes such as `IFC2X3_TC1`.
    Ifc2x3,
    /// IFC4.
    Ifc4,
    /// IFC4x1, the newest generation known to the catalog.
    Ifc4x1,
}

impl SchemaVersion {
    /// Every known schema, oldest first.
    pub const ALL: [Self; 3] = [Self::Ifc2x3, Self::Ifc4, Self::Ifc4x1];

    /// The generation used for unknown or undetected schemas.
    pub const NEWEST: Self = Self::Ifc4x1;

    /// Classify a detected schema identifier. `None` for unknown identifiers.
    pub fn parse(identifier: &str) -> Option<Self> {
        let upper = identifier.trim().to_ascii_uppercase();
        if upper.starts_with("IFC2X3") {
            return Some(Self::Ifc2x3);
        }
        return match upper.as_str() {
            "IFC4" => Some(Self::Ifc4),
            "IFC4X1" => Some(Self::Ifc4x1),
            _ => None,
        };
    }

    /// Classify, falling back to the newest generation.
    pub fn resolve(identifier: &str) -> Self {
        return Self::parse(identifier).unwrap_or(Self::NEWEST);
    }

    /// Canonical identifier as written in `FILE_SCHEMA`.
    pub const fn identifier(self) -> &'static str {
        return match self {
            Self::Ifc2x3 => "IFC2X3",
            Self::Ifc4 => "IFC4",
            Self::Ifc4x1 => "IFC4X1",
        };
    }

    /// Whether documentation pages of this generation carry an
    /// "Attribute inheritance" table worth extracting.
    pub const fn has_attribute_tables(self) -> bool {
        return matches!(self, Self::Ifc4x1);
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(self.identifier());
    }
}

/// Read the schema name declared in the header section.
///
/// Returns an empty string when there is no `ENDSEC;` line, no `FILE_SCHEMA`
/// statement before it, or the statement does not have the `(('NAME'))` shape.
/// The result depends only on document content.
pub fn detect(doc: &dyn Document) -> String {
    let index = LineIndex::new(doc);
    let Some((header_end, _)) = index
        .lines()
        .find(|(_, line)| return line.text.contains(END_OF_SECTION))
    else {
        tracing::debug!(uri = doc.uri(), "no ENDSEC; line, schema undetected");
        return String::new();
    };
    // ENDSEC; on the very first line leaves no header text to search.
    let Some(last_header_line) = header_end.checked_sub(1) else {
        return String::new();
    };

    let header = index.text_through_line(last_header_line);
    for statement in header.split(';') {
        if !statement.contains(FILE_SCHEMA) {
            continue;
        }
        let joined = statement.replace("\r\n", "").replace('\n', "");
        return schema_name_in_statement(&joined).unwrap_or_default();
    }

    return String::new();
}

/// Extract `NAME` from a `FILE_SCHEMA (('NAME'))` statement.
fn schema_name_in_statement(statement: &str) -> Option<String> {
    let captures = SCHEMA_NAME.captures(statement)?;
    if captures.len() != 4 {
        return None;
    }
    return captures.get(2).map(|m| return m.as_str().to_string());
}
