//! "Attribute inheritance" tables from type documentation pages.
//!
//! Extraction is best effort: any missing structure yields an empty list and
//! the caller still shows the page link.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::Error;
use crate::http::{self, HttpClient, RequestHeaders};
use crate::types::{AttributeRow, TypeName};

/// Text of the element directly before an inheritance table.
const INHERITANCE_CAPTION: &str = "Attribute inheritance";

/// Header row an inheritance table must have before its body is trusted.
const EXPECTED_HEADER: [&str; 3] = ["#", "Attribute", "Type"];

/// Prefix of the `#` cell on rows that introduce an ancestor type.
const TYPE_HEADER_PREFIX: &str = "Ifc";

/// `<table class="attributes">`.
static ATTRIBUTE_TABLE: LazyLock<Selector> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used, reason = "literal selector")]
    return Selector::parse("table.attributes").unwrap();
});

/// Table rows.
static ROW: LazyLock<Selector> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used, reason = "literal selector")]
    return Selector::parse("tr").unwrap();
});

/// Header and data cells.
static CELL: LazyLock<Selector> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used, reason = "literal selector")]
    return Selector::parse("th, td").unwrap();
});

/// Fetches documentation pages and pulls out their inheritance table.
pub struct AttributeTableExtractor {
    /// Transport.
    client: Arc<dyn HttpClient>,
    /// Headers sent with each page fetch.
    headers: RequestHeaders,
    /// Bound on each page fetch.
    timeout: Duration,
}

impl AttributeTableExtractor {
    /// Build an extractor over a transport.
    pub fn new(client: Arc<dyn HttpClient>, headers: RequestHeaders, timeout: Duration) -> Self {
        return Self { client, headers, timeout };
    }

    /// Rows of the page's inheritance table, or an empty list if the page
    /// cannot be fetched or has no usable table.
    pub async fn extract_inherited_attributes(&self, page_url: &Url) -> Vec<AttributeRow> {
        let html = match http::fetch_text(self.client.as_ref(), page_url, &self.headers, self.timeout).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(url = %page_url, error = %e, "documentation page unavailable");
                return Vec::new();
            },
        };
        return parse_inherited_attributes(&html);
    }
}

/// Rows of the first captioned inheritance table whose header matches.
pub fn parse_inherited_attributes(html: &str) -> Vec<AttributeRow> {
    let document = Html::parse_document(html);
    for table in document.select(&ATTRIBUTE_TABLE) {
        if preceding_caption(table).as_deref() != Some(INHERITANCE_CAPTION) {
            continue;
        }
        match table_rows(table) {
            Ok(rows) => return rows,
            Err(e) => tracing::debug!(error = %e, "skipping attribute table"),
        }
    }
    return Vec::new();
}

/// Text of the nearest preceding sibling, ignoring blank text and comments.
fn preceding_caption(table: ElementRef<'_>) -> Option<String> {
    for node in table.prev_siblings() {
        if let Some(text) = node.value().as_text() {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                continue;
            }
            return Some(trimmed.to_string());
        }
        if let Some(element) = ElementRef::wrap(node) {
            return Some(collapse_whitespace(&element.text().collect::<String>()));
        }
    }
    return None;
}

/// Convert a table into rows after checking its header shape.
///
/// # Errors
///
/// Returns `Error::TableShapeMismatch` when the first row is not `#`, `Attribute`, `Type`.
fn table_rows(table: ElementRef<'_>) -> Result<Vec<AttributeRow>, Error> {
    let mut rows = table.select(&ROW).map(row_cells);
    let header = rows.next().unwrap_or_default();
    if header != EXPECTED_HEADER {
        return Err(Error::TableShapeMismatch { header });
    }
    return Ok(rows.filter_map(|cells| return classify_row(&cells)).collect());
}

/// Trimmed text of every cell in a row.
fn row_cells(row: ElementRef<'_>) -> Vec<String> {
    return row
        .select(&CELL)
        .map(|cell| return collapse_whitespace(&cell.text().collect::<String>()))
        .collect();
}

/// Classify one body row by its `#` cell. Rows without cells are dropped.
fn classify_row(cells: &[String]) -> Option<AttributeRow> {
    let (index, rest) = cells.split_first()?;
    let attribute = rest.first().cloned().unwrap_or_default();
    let ty = rest.get(1).cloned().unwrap_or_default();

    if index.starts_with(TYPE_HEADER_PREFIX) {
        return Some(AttributeRow::TypeHeader { name: index.clone() });
    }
    if index.is_empty() {
        return Some(AttributeRow::Dangling { attribute, ty });
    }
    return Some(AttributeRow::Indexed { attribute, index: index.clone(), ty });
}

/// Join whitespace runs into single spaces and trim.
fn collapse_whitespace(text: &str) -> String {
    return text.split_whitespace().collect::<Vec<_>>().join(" ");
}

/// Hover markdown: the page link, then one line per row in page order.
pub fn render_markdown(type_name: &TypeName, url: &Url, rows: &[AttributeRow]) -> String {
    let mut out = format!("[{type_name}]({url})");
    if rows.is_empty() {
        return out;
    }
    out.push_str("\n\n");
    let lines: Vec<String> = rows.iter().map(render_row).collect();
    // Two trailing spaces force a markdown line break.
    out.push_str(&lines.join("  \n"));
    return out;
}

/// One row as a markdown line.
fn render_row(row: &AttributeRow) -> String {
    return match row {
        AttributeRow::Dangling { attribute, ty } => format!("*{attribute}* `{ty}`"),
        AttributeRow::Indexed { attribute, index, ty } => format!("{index}.{attribute} : {ty}"),
        AttributeRow::TypeHeader { name } => format!("**{name}**"),
    };
}
