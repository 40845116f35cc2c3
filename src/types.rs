/// Core domain types for stepref references, type names, and resolution results.
use std::fmt;

use serde::Serialize;
use url::Url;

/// A `#` followed by one or more digits, identifying one STEP entity instance.
/// Constructed only through `parse`, so the shape is guaranteed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct InstanceReference(
    /// The full token including the leading `#`.
    String,
);

impl InstanceReference {
    /// Accept `#` plus a non-empty run of ASCII digits and nothing else.
    pub fn parse(text: &str) -> Option<Self> {
        let digits = text.strip_prefix('#')?;
        if digits.is_empty() || !digits.bytes().all(|b| return b.is_ascii_digit()) {
            return None;
        }
        return Some(Self(text.to_string()));
    }

    /// The token text, e.g. `#123`.
    pub fn as_str(&self) -> &str {
        return &self.0;
    }
}

impl fmt::Display for InstanceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(&self.0);
    }
}

/// An identifier that appeared directly before `(`, e.g. `IFCWALL`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeName(
    /// The identifier without whitespace or parenthesis.
    String,
);

impl TypeName {
    /// Wrap an identifier. Names of one character or less are rejected.
    pub fn new(name: &str) -> Option<Self> {
        if name.chars().count() <= 1 {
            return None;
        }
        return Some(Self(name.to_string()));
    }

    /// The identifier as written in the document.
    pub fn as_str(&self) -> &str {
        return &self.0;
    }

    /// The file name a documentation page for this type ends with.
    pub fn page_suffix(&self) -> String {
        return format!("{}.htm", self.0.to_lowercase());
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(&self.0);
    }
}

/// The data-section line that defines an instance reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefinitionLine {
    /// Zero-based line number in the document.
    pub line: usize,
    /// Full text of the line.
    pub text: String,
}

/// One row of an "Attribute inheritance" table, in page order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttributeRow {
    /// Attribute with no positional index.
    Dangling {
        /// Attribute name.
        attribute: String,
        /// Declared attribute type.
        #[serde(rename = "type")]
        ty: String,
    },
    /// Attribute of the most recent type header, with its position.
    Indexed {
        /// Attribute name.
        attribute: String,
        /// Positional index as printed on the page.
        index: String,
        /// Declared attribute type.
        #[serde(rename = "type")]
        ty: String,
    },
    /// Start of the attributes contributed by one ancestor type.
    TypeHeader {
        /// Name of the ancestor type, e.g. `IfcRoot`.
        name: String,
    },
}

/// Outcome of one query. Built per query and never retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ResolutionResult {
    /// The cursor was on an instance reference defined in this document.
    DefinitionFound {
        /// Zero-based line number of the definition.
        line: usize,
        /// Full text of the definition line.
        text: String,
    },
    /// The cursor was on a type name with a table-structured documentation page.
    DocumentationFound {
        /// Rendered hover markdown.
        markdown: String,
        /// Canonical documentation url.
        url: Url,
    },
    /// The cursor was on a type name; only a link is available.
    LinkOnly {
        /// Canonical documentation url.
        url: Url,
    },
    /// Nothing to show.
    NotFound,
}

impl ResolutionResult {
    /// Whether the result carries anything for the host to show.
    pub const fn is_found(&self) -> bool {
        return !matches!(self, Self::NotFound);
    }

    /// Markdown for a hover popup; `None` when there is nothing to show.
    pub fn hover_markdown(&self) -> Option<String> {
        return match self {
            Self::DefinitionFound { text, .. } => Some(format!("```step\n{}\n```", text.trim())),
            Self::DocumentationFound { markdown, .. } => Some(markdown.clone()),
            Self::LinkOnly { url } => Some(format!("<{url}>")),
            Self::NotFound => None,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_requires_digits() {
        assert!(InstanceReference::parse("#123").is_some());
        assert!(InstanceReference::parse("#").is_none());
        assert!(InstanceReference::parse("#12a").is_none());
        assert!(InstanceReference::parse("123").is_none());
    }

    #[test]
    fn single_character_type_name_rejected() {
        assert!(TypeName::new("X").is_none());
        assert_eq!(TypeName::new("IFCWALL").unwrap().page_suffix(), "ifcwall.htm");
    }

    #[test]
    fn result_serializes_with_tag() {
        let json = serde_json::to_value(ResolutionResult::NotFound).unwrap();
        assert_eq!(json["result"], "not_found");
    }

    #[test]
    fn definition_hover_is_fenced() {
        let result = ResolutionResult::DefinitionFound { line: 4, text: "  #10=IFCWALL();".to_string() };
        assert_eq!(result.hover_markdown().unwrap(), "```step\n#10=IFCWALL();\n```");
        assert!(ResolutionResult::NotFound.hover_markdown().is_none());
    }
}
