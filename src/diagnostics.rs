use std::fmt::Write as _;

use url::Url;

use stepref::config::CONFIG_FILE;
use stepref::error::Error;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where there is
/// something to do about it, how to fix it.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::Lookup { type_name, searched } => render_lookup(type_name, searched),
        Error::Network { url, reason } => render_network(url, reason),
        Error::Timeout { url, seconds } => render_timeout(url, *seconds),
        Error::NotRecognizedFormat { path } => render_not_recognized(&path.display().to_string()),
        Error::ConfigInvalid { reason } => render_config_invalid(reason),
        _ => render_generic(e),
    };
}

fn render_generic(e: &Error) -> String {
    return match e {
        Error::FileNotFound { path } => format!("\
# Error: File Not Found

`{}` does not exist.
", path.display()),

        Error::ReferenceNotDefined { reference } => format!("\
# Error: Reference Not Defined

No line in this file defines `{reference}`. It may be defined in another file.
"),

        Error::TableShapeMismatch { header } => format!("\
# Error: Unexpected Attribute Table

Header was [{}], expected [#, Attribute, Type].
", header.join(", ")),

        Error::InvalidUrl(e) => format!("\
# Error: Invalid URL

{e}
"),
        Error::Io(e) => format!("\
# Error: I/O

{e}
"),
        Error::Json(e) => format!("\
# Error: JSON

{e}
"),
        Error::TomlDe(e) => format!("\
# Error: Invalid TOML

{e}

## Fix

Check `{CONFIG_FILE}`.
"),
        // Already handled in render_error, but need exhaustive match.
        _ => format!("\
# Error

{e}
"),
    };
}

fn render_lookup(type_name: &str, searched: &[Url]) -> String {
    let mut out = format!("\
# Error: No Documentation

`{type_name}` has no anchor on any index page for this schema.
");
    if !searched.is_empty() {
        out.push_str("\n## Searched\n\n");
        for url in searched {
            let _ = writeln!(out, "- {url}");
        }
    }
    out.push_str("\
\n## Fix

Check the schema with `stepref schema <file>`, or pass `--schema` explicitly.
");
    return out;
}

fn render_network(url: &Url, reason: &str) -> String {
    return format!("\
# Error: Network

Fetching {url} failed: {reason}

## Fix

Check connectivity, or point `[catalog]` in `{CONFIG_FILE}` at a mirror.
");
}

fn render_timeout(url: &Url, seconds: u64) -> String {
    return format!("\
# Error: Timed Out

No response from {url} within {seconds}s.

## Fix

Raise `timeout_secs` in `{CONFIG_FILE}`.
");
}

fn render_not_recognized(path: &str) -> String {
    return format!("\
# Error: Not A Recognized STEP File

`{path}` has no header section ending in `ENDSEC;` with a `FILE_SCHEMA(('...'))` statement.
");
}

fn render_config_invalid(reason: &str) -> String {
    return format!("\
# Error: Invalid Config

{reason}

## Fix

Edit `{CONFIG_FILE}`. Known schemas: `IFC2X3`, `IFC4`, `IFC4X1`.
");
}
