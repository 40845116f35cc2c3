//! Schema version to documentation index pages.

use std::collections::HashMap;

use url::Url;

use crate::error::Error;
use crate::schema::SchemaVersion;

/// IFC2x3 splits its alphabetical index by kind: select, enum, defined, entity.
const IFC2X3_INDEX_PAGES: [&str; 4] = [
    "http://www.buildingsmart-tech.org/ifc/IFC2x3/TC1/html/alphabeticalorder_selecttype.htm",
    "http://www.buildingsmart-tech.org/ifc/IFC2x3/TC1/html/alphabeticalorder_enumtype.htm",
    "http://www.buildingsmart-tech.org/ifc/IFC2x3/TC1/html/alphabeticalorder_definedtype.htm",
    "http://www.buildingsmart-tech.org/ifc/IFC2x3/TC1/html/alphabeticalorder_entities.htm",
];

/// IFC4 publishes a single consolidated table of contents.
const IFC4_INDEX_PAGES: [&str; 1] = ["http://www.buildingsmart-tech.org/ifc/IFC4/final/html/toc.htm"];

/// IFC4x1 publishes a single consolidated table of contents.
const IFC4X1_INDEX_PAGES: [&str; 1] =
    ["http://www.buildingsmart-tech.org/ifc/IFC4x1/final/html/toc.htm"];

/// Ordered candidate index pages per schema, most specific first.
#[derive(Debug, Clone)]
pub struct SchemaCatalog {
    /// Index pages keyed by schema generation.
    entries: HashMap<SchemaVersion, Vec<Url>>,
}

impl SchemaCatalog {
    /// The published buildingSMART index pages.
    ///
    /// # Panics
    ///
    /// Never in practice: the built-in urls are literals that parse.
    #[allow(clippy::expect_used, reason = "built-in literals are valid urls")]
    pub fn builtin() -> Self {
        let mut entries = HashMap::new();
        for version in SchemaVersion::ALL {
            let urls = builtin_pages(version)
                .iter()
                .map(|raw| return Url::parse(raw).expect("built-in index url"))
                .collect();
            entries.insert(version, urls);
        }
        return Self { entries };
    }

    /// The built-in catalog with some schemas' pages replaced.
    ///
    /// Keys are schema identifiers (`IFC2X3`, `IFC4`, `IFC4X1`).
    ///
    /// # Errors
    ///
    /// Returns `Error::ConfigInvalid` for an unknown key or an empty list,
    /// and `Error::InvalidUrl` for an unparsable url.
    pub fn with_overrides(overrides: &HashMap<String, Vec<String>>) -> Result<Self, Error> {
        let mut catalog = Self::builtin();
        for (key, raw_urls) in overrides {
            let Some(version) = SchemaVersion::parse(key) else {
                return Err(Error::ConfigInvalid {
                    reason: format!("unknown schema `{key}` in [catalog]"),
                });
            };
            if raw_urls.is_empty() {
                return Err(Error::ConfigInvalid {
                    reason: format!("[catalog] {key} has no urls"),
                });
            }
            let urls = raw_urls
                .iter()
                .map(|raw| return Url::parse(raw))
                .collect::<Result<Vec<_>, _>>()?;
            catalog.entries.insert(version, urls);
        }
        return Ok(catalog);
    }

    /// Candidate index pages for a detected schema identifier. Unknown or
    /// empty identifiers get the newest generation's pages.
    pub fn urls_for(&self, schema: &str) -> &[Url] {
        return self.urls_for_version(SchemaVersion::resolve(schema));
    }

    /// Candidate index pages for a known schema generation.
    pub fn urls_for_version(&self, version: SchemaVersion) -> &[Url] {
        return self.entries.get(&version).map(Vec::as_slice).unwrap_or_default();
    }
}

impl Default for SchemaCatalog {
    fn default() -> Self {
        return Self::builtin();
    }
}

/// Built-in page list for one generation.
const fn builtin_pages(version: SchemaVersion) -> &'static [&'static str] {
    return match version {
        SchemaVersion::Ifc2x3 => &IFC2X3_INDEX_PAGES,
        SchemaVersion::Ifc4 => &IFC4_INDEX_PAGES,
        SchemaVersion::Ifc4x1 => &IFC4X1_INDEX_PAGES,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_known_schema_has_pages() {
        let catalog = SchemaCatalog::builtin();
        for version in SchemaVersion::ALL {
            assert!(!catalog.urls_for(version.identifier()).is_empty(), "{version}");
        }
    }

    #[test]
    fn ifc2x3_family_maps_to_category_pages() {
        let catalog = SchemaCatalog::builtin();
        let urls = catalog.urls_for("IFC2X3_TC1");
        assert_eq!(urls.len(), 4);
        assert!(urls[3].as_str().ends_with("alphabeticalorder_entities.htm"));
    }

    #[test]
    fn unknown_schema_falls_back_to_newest() {
        let catalog = SchemaCatalog::builtin();
        assert_eq!(catalog.urls_for("AP214"), catalog.urls_for("IFC4X1"));
        assert_eq!(catalog.urls_for(""), catalog.urls_for("IFC4X1"));
    }

    #[test]
    fn overrides_replace_one_schema() {
        let mut overrides = HashMap::new();
        overrides.insert("ifc4".to_string(), vec!["https://docs.example/ifc4/toc.htm".to_string()]);
        let catalog = SchemaCatalog::with_overrides(&overrides).unwrap();
        assert_eq!(catalog.urls_for("IFC4")[0].host_str(), Some("docs.example"));
        assert_eq!(catalog.urls_for("IFC2X3").len(), 4);
    }

    #[test]
    fn unknown_override_key_rejected() {
        let mut overrides = HashMap::new();
        overrides.insert("IFC9".to_string(), vec!["https://x.example/".to_string()]);
        assert!(matches!(
            SchemaCatalog::with_overrides(&overrides),
            Err(Error::ConfigInvalid { .. })
        ));
    }
}
