//! Constructor-call identifiers such as `IFCWALL(`.

use std::sync::LazyLock;

use regex::Regex;

use crate::document::{Document, Position};
use crate::types::TypeName;

/// Identifier, optional whitespace, opening parenthesis.
static CALLABLE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used, reason = "literal pattern")]
    return Regex::new(r"[0-9a-zA-Z_]+\s*\(").unwrap();
});

/// The type name under the cursor, without trailing whitespace or `(`.
pub fn extract_type_name_at(doc: &dyn Document, position: Position) -> Option<TypeName> {
    let range = doc.word_range_at_position(position, &CALLABLE_TOKEN)?;
    let text = doc.text_in_range(range);
    let name = text.trim_end_matches('(').trim_end();
    return TypeName::new(name);
}
