//! CLI commands for stepref: schema, definition, hover, doc.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use stepref::config::Config;
use stepref::document::{self, Position, TextDocument};
use stepref::error::Error;
use stepref::http::ReqwestClient;
use stepref::schema::{self, SchemaVersion};
use stepref::service::{DocumentCache, ResolutionService};
use stepref::types::{ResolutionResult, TypeName};
use walkdir::WalkDir;

use crate::diagnostics;

/// Exit code when the query found nothing.
const NOTHING_FOUND: u8 = 1;

/// A position given on the command line, 1-based.
pub struct CliPosition {
    /// 1-based column (character).
    pub column: usize,
    /// 1-based line.
    pub line: usize,
}

impl CliPosition {
    /// Zero-based editor position. Zero on the command line is read as 1.
    const fn to_position(&self) -> Position {
        return Position::new(self.line.saturating_sub(1), self.column.saturating_sub(1));
    }
}

/// Go-to-definition: print `FILE:LINE: text` for the reference under the cursor.
///
/// # Errors
///
/// Returns errors from config loading or file reading.
pub fn definition(config_path: &Path, file: &Path, at: &CliPosition) -> Result<ExitCode, Error> {
    let service = build_service(config_path)?;
    let doc = TextDocument::open(file)?;
    let mut cache = DocumentCache::new();

    let Some(found) = service.definition(&doc, at.to_position(), &mut cache) else {
        eprintln!("no defining line for the reference at {}:{}:{}", file.display(), at.line, at.column);
        return Ok(ExitCode::from(NOTHING_FOUND));
    };
    let line = found.line.saturating_add(1);
    println!("{}:{line}: {}", file.display(), found.text);
    return Ok(ExitCode::SUCCESS);
}

/// Look up documentation for a type name without a document.
///
/// # Errors
///
/// Returns lookup and network errors, or an I/O error if the browser cannot be opened.
pub async fn doc(
    config_path: &Path,
    type_name: &str,
    schema: Option<&str>,
    json: bool,
    open: bool,
) -> Result<ExitCode, Error> {
    let Some(name) = TypeName::new(type_name) else {
        eprintln!("type name `{type_name}` is too short");
        return Ok(ExitCode::from(NOTHING_FOUND));
    };
    let schema = schema.unwrap_or(SchemaVersion::NEWEST.identifier());
    let service = build_service(config_path)?;

    let result = service.lookup_documentation(&name, schema).await?;
    print_result(&result, json)?;

    if open && let ResolutionResult::DocumentationFound { url, .. } | ResolutionResult::LinkOnly { url } = &result {
        webbrowser::open(url.as_str())?;
    }
    return Ok(ExitCode::SUCCESS);
}

/// Full hover resolution at a position.
///
/// # Errors
///
/// Returns errors from config loading, file reading, or JSON output.
pub async fn hover(config_path: &Path, file: &Path, at: &CliPosition, json: bool) -> Result<ExitCode, Error> {
    let service = build_service(config_path)?;
    let doc = TextDocument::open(file)?;
    let mut cache = DocumentCache::new();

    tracing::info!(file = %file.display(), schema = %cache.status_text(&doc), "resolving");
    let result = service.resolve(&doc, at.to_position(), &mut cache).await;
    if !result.is_found() && !json {
        eprintln!("nothing to show at {}:{}:{}", file.display(), at.line, at.column);
        return Ok(ExitCode::from(NOTHING_FOUND));
    }
    print_result(&result, json)?;
    return Ok(if result.is_found() { ExitCode::SUCCESS } else { ExitCode::from(NOTHING_FOUND) });
}

/// Print the detected schema of each STEP file. Directories are walked.
///
/// # Errors
///
/// Returns `Error::FileNotFound` for a missing path or `Error::Io` on read failure.
pub fn schema(paths: &[PathBuf]) -> Result<ExitCode, Error> {
    let mut undetected = 0_u32;

    for path in paths {
        for file in step_files_under(path)? {
            let doc = TextDocument::open(&file)?;
            let detected = schema::detect(&doc);
            if detected.is_empty() {
                undetected = undetected.saturating_add(1);
                diagnostics::print_error(&Error::NotRecognizedFormat { path: file });
                continue;
            }
            let generation = SchemaVersion::parse(&detected)
                .map_or_else(|| return format!("unknown, using {}", SchemaVersion::NEWEST), |v| return v.to_string());
            println!("{detected:<12} ({generation})  {}", file.display());
        }
    }

    if undetected > 0 {
        return Ok(ExitCode::from(NOTHING_FOUND));
    }
    return Ok(ExitCode::SUCCESS);
}

/// Load config and build a service over the real network.
///
/// # Errors
///
/// Returns config loading errors or client setup failures.
fn build_service(config_path: &Path) -> Result<ResolutionService, Error> {
    let config = Config::load_file(config_path)?;
    let client = ReqwestClient::new(config.timeout())?;
    return ResolutionService::from_config(Arc::new(client), &config);
}

/// Print a result as hover markdown or JSON.
///
/// # Errors
///
/// Returns `Error::Json` if serialization fails.
fn print_result(result: &ResolutionResult, json: bool) -> Result<(), Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }
    if let Some(markdown) = result.hover_markdown() {
        println!("{markdown}");
    }
    return Ok(());
}

/// A file itself, or every STEP file below a directory in sorted order.
///
/// # Errors
///
/// Returns `Error::FileNotFound` if the path does not exist.
fn step_files_under(path: &Path) -> Result<Vec<PathBuf>, Error> {
    if !path.exists() {
        return Err(Error::FileNotFound { path: path.to_path_buf() });
    }
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| return e.file_type().is_file() && document::is_step_path(e.path()))
        .map(walkdir::DirEntry::into_path)
        .collect();
    files.sort();
    return Ok(files);
}
