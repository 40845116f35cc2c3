//! Find the documentation page of a type by searching index-page anchors.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use futures::StreamExt as _;
use futures::stream::FuturesOrdered;
use scraper::{Html, Selector};
use url::Url;

use crate::catalog::SchemaCatalog;
use crate::error::Error;
use crate::http::{self, HttpClient, RequestHeaders};
use crate::types::TypeName;

/// Every anchor carrying an `href`.
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used, reason = "literal selector")]
    return Selector::parse("a[href]").unwrap();
});

/// Resolves type names to documentation page urls.
pub struct DocLinkResolver {
    /// Candidate index pages per schema.
    catalog: SchemaCatalog,
    /// Transport.
    client: Arc<dyn HttpClient>,
    /// Headers sent with each index fetch.
    headers: RequestHeaders,
    /// Bound on each index fetch.
    timeout: Duration,
}

impl DocLinkResolver {
    /// Build a resolver over a catalog and transport.
    pub fn new(
        client: Arc<dyn HttpClient>,
        catalog: SchemaCatalog,
        headers: RequestHeaders,
        timeout: Duration,
    ) -> Self {
        return Self { catalog, client, headers, timeout };
    }

    /// Find the documentation page of `type_name` for a detected schema identifier.
    ///
    /// # Errors
    ///
    /// Returns `Error::Lookup` when no index page has a matching anchor, or the
    /// first transport error when no index page could be fetched at all.
    pub async fn resolve(&self, type_name: &TypeName, schema: &str) -> Result<Url, Error> {
        let candidates = self.catalog.urls_for(schema);
        return self.resolve_in(type_name, candidates).await;
    }

    /// Search the given index pages in order; first match wins.
    ///
    /// All pages are requested at once, but results are consumed in catalog
    /// order so the answer is deterministic. Requests still in flight when a
    /// match is found are dropped.
    ///
    /// # Errors
    ///
    /// Same as `resolve`.
    pub async fn resolve_in(&self, type_name: &TypeName, candidates: &[Url]) -> Result<Url, Error> {
        let suffix = type_name.page_suffix();
        let mut pending: FuturesOrdered<_> = candidates
            .iter()
            .map(|url| {
                return async move {
                    let body = http::fetch_text(self.client.as_ref(), url, &self.headers, self.timeout).await;
                    return (url, body);
                };
            })
            .collect();

        let mut fetched_any = false;
        let mut first_error = None;
        while let Some((url, body)) = pending.next().await {
            match body {
                Err(e) => {
                    tracing::warn!(%url, error = %e, "index page unavailable");
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                },
                Ok(html) => {
                    fetched_any = true;
                    if let Some(found) = find_anchor(&html, url, &suffix) {
                        tracing::debug!(%type_name, %found, "documentation page found");
                        return Ok(found);
                    }
                },
            }
        }

        if !fetched_any && let Some(e) = first_error {
            return Err(e);
        }
        return Err(Error::Lookup {
            searched: candidates.to_vec(),
            type_name: type_name.to_string(),
        });
    }
}

/// The first anchor in `html` whose href ends with `suffix`, made absolute
/// against `page_url`.
pub fn find_anchor(html: &str, page_url: &Url, suffix: &str) -> Option<Url> {
    let document = Html::parse_document(html);
    for anchor in document.select(&ANCHOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !href.ends_with(suffix) {
            continue;
        }
        match page_url.join(href) {
            Ok(url) => return Some(url),
            Err(e) => tracing::debug!(href, error = %e, "skipping unjoinable href"),
        }
    }
    return None;
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOC: &str = r#"<html><body>
        <a href="schema/ifcsharedbldgelements/lexical/ifcwallstandardcase.htm">IfcWallStandardCase</a>
        <a href="schema/ifcsharedbldgelements/lexical/ifcwall.htm">IfcWall</a>
        <a href="schema/ifcsharedbldgelements/lexical/ifcwall.htm">IfcWall again</a>
        <a name="no-href">anchor</a>
    </body></html>"#;

    #[test]
    fn relative_href_resolved_against_page() {
        let page = Url::parse("http://docs.example/ifc/IFC4x1/final/html/toc.htm").unwrap();
        let found = find_anchor(TOC, &page, "ifcwall.htm").unwrap();
        assert_eq!(
            found.as_str(),
            "http://docs.example/ifc/IFC4x1/final/html/schema/ifcsharedbldgelements/lexical/ifcwall.htm"
        );
    }

    #[test]
    fn absent_type_has_no_anchor() {
        let page = Url::parse("http://docs.example/toc.htm").unwrap();
        assert!(find_anchor(TOC, &page, "ifcbeam.htm").is_none());
    }

    #[test]
    fn absolute_href_kept() {
        let page = Url::parse("http://docs.example/toc.htm").unwrap();
        let html = r#"<a href="https://mirror.example/lexical/ifcslab.htm">IfcSlab</a>"#;
        let found = find_anchor(html, &page, "ifcslab.htm").unwrap();
        assert_eq!(found.host_str(), Some("mirror.example"));
    }
}
