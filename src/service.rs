//! Query orchestration: reference first, then type documentation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::attributes::{self, AttributeTableExtractor};
use crate::catalog::SchemaCatalog;
use crate::config::Config;
use crate::doclink::DocLinkResolver;
use crate::document::{Document, Position, STEP_LANGUAGE_ID};
use crate::error::Error;
use crate::http::{HttpClient, RequestHeaders};
use crate::reference::{self, DefinitionIndex};
use crate::schema::{self, SchemaVersion};
use crate::type_name;
use crate::types::{DefinitionLine, InstanceReference, ResolutionResult, TypeName};

/// Status text shown when a document declares no recognizable schema.
const UNDETECTED_STATUS: &str = "STEP";

/// Per-document derived state, valid for one document version.
#[derive(Debug)]
struct CachedDocument {
    /// Lazily built reference index.
    definitions: Option<DefinitionIndex>,
    /// Lazily detected schema identifier (empty when undetected).
    schema: Option<String>,
    /// Document version the entry was derived from.
    version: u64,
}

impl CachedDocument {
    /// An empty entry for `version`.
    const fn empty(version: u64) -> Self {
        return Self { definitions: None, schema: None, version };
    }
}

/// Derived state for every document the host has queried, keyed by uri.
///
/// Entries are rebuilt when the document version changes. Passed explicitly
/// into each query so several open documents never share a schema.
#[derive(Debug, Default)]
pub struct DocumentCache {
    /// Entries by document uri.
    entries: HashMap<String, CachedDocument>,
}

impl DocumentCache {
    /// An empty cache.
    pub fn new() -> Self {
        return Self::default();
    }

    /// The entry for `doc`, reset if the document changed since it was built.
    fn entry(&mut self, doc: &dyn Document) -> &mut CachedDocument {
        let version = doc.version();
        let entry = self
            .entries
            .entry(doc.uri().to_string())
            .or_insert_with(|| return CachedDocument::empty(version));
        if entry.version != version {
            tracing::debug!(uri = doc.uri(), version, "document changed, dropping cached state");
            *entry = CachedDocument::empty(version);
        }
        return entry;
    }

    /// The schema identifier declared by `doc`, detected once per version.
    pub fn schema(&mut self, doc: &dyn Document) -> &str {
        let entry = self.entry(doc);
        return entry.schema.get_or_insert_with(|| return schema::detect(doc));
    }

    /// The reference index of `doc`, built once per version.
    pub fn definitions(&mut self, doc: &dyn Document) -> &DefinitionIndex {
        let entry = self.entry(doc);
        return entry.definitions.get_or_insert_with(|| return DefinitionIndex::build(doc));
    }

    /// Text for the host's status indicator.
    pub fn status_text(&mut self, doc: &dyn Document) -> String {
        let schema = self.schema(doc);
        if schema.is_empty() {
            return UNDETECTED_STATUS.to_string();
        }
        return schema.to_string();
    }

    /// Forget everything about a document, e.g. when it is closed.
    pub fn invalidate(&mut self, uri: &str) {
        self.entries.remove(uri);
    }
}

/// Answers hover and go-to-definition queries.
pub struct ResolutionService {
    /// Attribute table extraction for table-structured schemas.
    attributes: AttributeTableExtractor,
    /// Type name to documentation page.
    doc_links: DocLinkResolver,
}

impl ResolutionService {
    /// Build a service over a transport and catalog.
    pub fn new(
        client: Arc<dyn HttpClient>,
        catalog: SchemaCatalog,
        headers: RequestHeaders,
        timeout: Duration,
    ) -> Self {
        return Self {
            attributes: AttributeTableExtractor::new(Arc::clone(&client), headers.clone(), timeout),
            doc_links: DocLinkResolver::new(client, catalog, headers, timeout),
        };
    }

    /// Build a service from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigInvalid` or `Error::InvalidUrl` for bad catalog overrides.
    pub fn from_config(client: Arc<dyn HttpClient>, config: &Config) -> Result<Self, Error> {
        let catalog = SchemaCatalog::with_overrides(&config.catalog)?;
        return Ok(Self::new(client, catalog, config.request_headers(), config.timeout()));
    }

    /// Resolve the query at `position`. Never fails: every miss or error is `NotFound`.
    pub async fn resolve(
        &self,
        doc: &dyn Document,
        position: Position,
        cache: &mut DocumentCache,
    ) -> ResolutionResult {
        if doc.language_id() != STEP_LANGUAGE_ID {
            return ResolutionResult::NotFound;
        }

        if let Some(reference) = reference::extract_reference_at(doc, position) {
            return match defining_line(doc, &reference, cache) {
                Some(found) => ResolutionResult::DefinitionFound { line: found.line, text: found.text },
                None => ResolutionResult::NotFound,
            };
        }

        let Some(type_name) = type_name::extract_type_name_at(doc, position) else {
            return ResolutionResult::NotFound;
        };
        let schema = cache.schema(doc).to_string();
        return self.documentation(&type_name, &schema).await;
    }

    /// `resolve`, abandoned as soon as `cancel` fires. `None` means cancelled;
    /// nothing partial is returned.
    pub async fn resolve_cancellable(
        &self,
        doc: &dyn Document,
        position: Position,
        cache: &mut DocumentCache,
        cancel: &CancellationToken,
    ) -> Option<ResolutionResult> {
        return tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!("query cancelled");
                None
            },
            result = self.resolve(doc, position, cache) => Some(result),
        };
    }

    /// Go-to-definition: the line defining the reference under the cursor.
    pub fn definition(
        &self,
        doc: &dyn Document,
        position: Position,
        cache: &mut DocumentCache,
    ) -> Option<DefinitionLine> {
        let reference = reference::extract_reference_at(doc, position)?;
        return defining_line(doc, &reference, cache);
    }

    /// Documentation for a type under a detected schema identifier.
    ///
    /// Newest-generation schemas get the rendered attribute table; older ones
    /// only a link. Lookup and network failures are `NotFound`.
    pub async fn documentation(&self, type_name: &TypeName, schema: &str) -> ResolutionResult {
        return match self.lookup_documentation(type_name, schema).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(%type_name, schema, error = %e, "documentation lookup failed");
                ResolutionResult::NotFound
            },
        };
    }

    /// `documentation` without the degradation, for callers that report errors.
    ///
    /// # Errors
    ///
    /// Returns `Error::Lookup` when no index page mentions the type, or the
    /// transport error when no index page could be fetched.
    pub async fn lookup_documentation(
        &self,
        type_name: &TypeName,
        schema: &str,
    ) -> Result<ResolutionResult, Error> {
        let url = self.doc_links.resolve(type_name, schema).await?;

        if !SchemaVersion::resolve(schema).has_attribute_tables() {
            return Ok(ResolutionResult::LinkOnly { url });
        }

        let rows = self.attributes.extract_inherited_attributes(&url).await;
        let markdown = attributes::render_markdown(type_name, &url, &rows);
        return Ok(ResolutionResult::DocumentationFound { markdown, url });
    }
}

/// The line defining `reference`, from the cached index of `doc`.
fn defining_line(
    doc: &dyn Document,
    reference: &InstanceReference,
    cache: &mut DocumentCache,
) -> Option<DefinitionLine> {
    let found = cache.definitions(doc).lookup(doc, reference);
    if found.is_none() {
        let e = Error::ReferenceNotDefined { reference: reference.to_string() };
        tracing::debug!(uri = doc.uri(), error = %e, "no definition in this document");
    }
    return found;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TextDocument;

    /// Fails every request; queries here must stay offline.
    struct Offline;

    #[async_trait::async_trait]
    impl HttpClient for Offline {
        async fn get(
            &self,
            url: &url::Url,
            _headers: &RequestHeaders,
        ) -> Result<crate::http::HttpResponse, Error> {
            return Err(Error::Network { reason: "offline".to_string(), url: url.clone() });
        }
    }

    fn service() -> ResolutionService {
        return ResolutionService::new(
            Arc::new(Offline),
            SchemaCatalog::builtin(),
            RequestHeaders::default(),
            Duration::from_secs(1),
        );
    }

    #[test]
    fn schema_cached_until_version_changes() {
        let mut doc = TextDocument::new("a.ifc", "HEADER;\nFILE_SCHEMA(('IFC4'));\nENDSEC;");
        let mut cache = DocumentCache::new();
        assert_eq!(cache.schema(&doc), "IFC4");
        doc.replace_text("HEADER;\nFILE_SCHEMA(('IFC2X3'));\nENDSEC;");
        assert_eq!(cache.schema(&doc), "IFC2X3");
    }

    #[test]
    fn documents_do_not_share_schema() {
        let a = TextDocument::new("a.ifc", "HEADER;\nFILE_SCHEMA(('IFC4'));\nENDSEC;");
        let b = TextDocument::new("b.ifc", "HEADER;\nFILE_SCHEMA(('IFC2X3'));\nENDSEC;");
        let mut cache = DocumentCache::new();
        assert_eq!(cache.status_text(&a), "IFC4");
        assert_eq!(cache.status_text(&b), "IFC2X3");
        let plain = TextDocument::new("c.ifc", "DATA;\n");
        assert_eq!(cache.status_text(&plain), "STEP");
    }

    #[tokio::test]
    async fn reference_without_definition_is_not_found() {
        let doc = TextDocument::new("a.ifc", "DATA;\n#1=IFCWALL(#99);\nENDSEC;");
        let mut cache = DocumentCache::new();
        let result = service().resolve(&doc, Position::new(1, 12), &mut cache).await;
        assert_eq!(result, ResolutionResult::NotFound);
    }

    #[tokio::test]
    async fn network_failure_degrades_to_not_found() {
        let doc = TextDocument::new("a.ifc", "DATA;\n#1=IFCWALL(#99);\nENDSEC;");
        let mut cache = DocumentCache::new();
        let result = service().resolve(&doc, Position::new(1, 5), &mut cache).await;
        assert_eq!(result, ResolutionResult::NotFound);
    }

    #[tokio::test]
    async fn cancelled_query_returns_nothing() {
        let doc = TextDocument::new("a.ifc", "DATA;\n#1=IFCWALL(#1);\nENDSEC;");
        let mut cache = DocumentCache::new();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = service()
            .resolve_cancellable(&doc, Position::new(1, 12), &mut cache, &cancel)
            .await;
        assert!(result.is_none());
    }

    /// Never answers.
    struct Silent;

    #[async_trait::async_trait]
    impl HttpClient for Silent {
        async fn get(
            &self,
            _url: &url::Url,
            _headers: &RequestHeaders,
        ) -> Result<crate::http::HttpResponse, Error> {
            return std::future::pending().await;
        }
    }

    #[tokio::test]
    async fn cancelling_abandons_fetch_in_flight() {
        let service = ResolutionService::new(
            Arc::new(Silent),
            SchemaCatalog::builtin(),
            RequestHeaders::default(),
            Duration::from_secs(30),
        );
        let doc = TextDocument::new("a.ifc", "DATA;\n#1=IFCWALL(#1);\nENDSEC;");
        let mut cache = DocumentCache::new();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let result = service
            .resolve_cancellable(&doc, Position::new(1, 5), &mut cache, &cancel)
            .await;

        assert!(result.is_none());
        assert!(started.elapsed() < Duration::from_secs(5), "took {:?}", started.elapsed());
    }

    #[tokio::test]
    async fn resolve_and_definition_agree_on_references() {
        let doc = TextDocument::new("a.ifc", "DATA;\n#1=IFCWALL(#2);\n#2=IFCLOCALPLACEMENT($,$);\nENDSEC;");
        let mut cache = DocumentCache::new();
        let service = service();
        let at = Position::new(1, 12);

        let found = service.definition(&doc, at, &mut cache).unwrap();
        let result = service.resolve(&doc, at, &mut cache).await;

        assert_eq!(found.line, 2);
        assert_eq!(result, ResolutionResult::DefinitionFound { line: found.line, text: found.text });
    }

    #[test]
    fn invalidate_forgets_document() {
        let mut doc = TextDocument::new("a.ifc", "HEADER;\nFILE_SCHEMA(('IFC4'));\nENDSEC;");
        let mut cache = DocumentCache::new();
        assert_eq!(cache.schema(&doc), "IFC4");
        assert_eq!(cache.entries.len(), 1);

        cache.invalidate("a.ifc");
        assert!(cache.entries.is_empty());

        // Same version, new content: only a dropped entry sees the change.
        doc = TextDocument::new("a.ifc", "HEADER;\nFILE_SCHEMA(('IFC2X3'));\nENDSEC;");
        assert_eq!(cache.schema(&doc), "IFC2X3");
    }

    #[tokio::test]
    async fn other_languages_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "#1=IFCWALL();\n#1\n").unwrap();
        let doc = TextDocument::open(&path).unwrap();
        let mut cache = DocumentCache::new();
        let result = service().resolve(&doc, Position::new(1, 1), &mut cache).await;
        assert_eq!(result, ResolutionResult::NotFound);
    }
}
