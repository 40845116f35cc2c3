/// Crate-level error types for stepref diagnostics.
use std::path::PathBuf;

use url::Url;

/// All errors in stepref carry enough context to produce a useful diagnostic
/// without a debugger. Each variant names the file, url, type, or reason for failure.
///
/// None of these reach an editor host: `ResolutionService` turns every one of
/// them into a degraded `ResolutionResult`. The CLI renders them for humans.
#[allow(clippy::error_impl_error, reason = "crate-level error type shared by lib and binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configuration file is well-formed TOML but has unusable values.
    #[error("invalid config: {reason}")]
    ConfigInvalid {
        /// Description of the offending value.
        reason: String,
    },

    /// A file named on the command line does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// A documentation or index url could not be parsed or joined.
    #[error("invalid url: {0}")]
    InvalidUrl(
        /// The wrapped url parse error.
        #[from]
        url::ParseError,
    ),

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON serialization of a result failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped serde_json error.
        #[from]
        serde_json::Error,
    ),

    /// No candidate index page contains an anchor for the type name.
    #[error("no documentation found for `{type_name}` ({} index pages searched)", searched.len())]
    Lookup {
        /// Index pages that were fetched and searched.
        searched: Vec<Url>,
        /// Type name that was looked up.
        type_name: String,
    },

    /// Transport failure or non-success HTTP status while fetching a page.
    #[error("network: {url}: {reason}")]
    Network {
        /// Description of the transport failure.
        reason: String,
        /// The url that was being fetched.
        url: Url,
    },

    /// The header section or its `FILE_SCHEMA` statement is absent or malformed.
    #[error("not a recognized STEP file: {}", path.display())]
    NotRecognizedFormat {
        /// File whose header could not be read.
        path: PathBuf,
    },

    /// The instance reference has no defining line in the document.
    #[error("reference not defined: `{reference}`")]
    ReferenceNotDefined {
        /// The `#N` token that was looked up.
        reference: String,
    },

    /// An attribute table was found but its header row is not `#`, `Attribute`, `Type`.
    #[error("attribute table header mismatch: [{}]", header.join(", "))]
    TableShapeMismatch {
        /// Header cells as they appear on the page.
        header: Vec<String>,
    },

    /// A fetch exceeded the configured bound.
    #[error("timed out after {seconds}s: {url}")]
    Timeout {
        /// The configured timeout in seconds.
        seconds: u64,
        /// The url that was being fetched.
        url: Url,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),
}
