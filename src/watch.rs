//! Status indicator: prints the file's schema on startup, then again on every change.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use notify::{RecursiveMode, Watcher as _};
use stepref::document::{Document as _, TextDocument};
use stepref::error::Error;
use stepref::service::DocumentCache;

/// Debounce delay between filesystem events and re-detection.
const DEBOUNCE_MS: u64 = 100;

/// Create a filesystem watcher that signals on changes to `file`.
///
/// # Errors
///
/// Returns `Error::Io` if the watcher cannot be created.
fn create_watcher(
    file: PathBuf,
    tx: crossbeam_channel::Sender<()>,
) -> Result<notify::RecommendedWatcher, Error> {
    let file_name = file.file_name().map(std::ffi::OsStr::to_os_string);
    return notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
        if let Ok(event) = res
            && matches!(
                event.kind,
                notify::EventKind::Create(_)
                    | notify::EventKind::Modify(_)
                    | notify::EventKind::Remove(_)
            )
            && event.paths.iter().any(|p| return p.file_name() == file_name.as_deref())
        {
            let _ = tx.send(());
        }
    })
    .map_err(|e| return Error::Io(std::io::Error::other(format!("watcher setup failed: {e}"))));
}

/// Entry point for the watch command.
///
/// Prints the status line, then watches the file's directory and re-derives
/// the schema whenever the file changes.
///
/// # Errors
///
/// Returns errors from the initial file read or watcher setup.
pub fn run(file: &Path) -> Result<ExitCode, Error> {
    let mut doc = TextDocument::open(file)?;
    let mut cache = DocumentCache::new();
    let mut last_status = cache.status_text(&doc);
    println!("{last_status}  {}", file.display());

    let (tx, rx) = crossbeam_channel::unbounded();
    let mut watcher = create_watcher(file.to_path_buf(), tx)?;
    let dir = file.parent().filter(|p| return !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    watcher
        .watch(dir, RecursiveMode::NonRecursive)
        .map_err(|e| return Error::Io(std::io::Error::other(e.to_string())))?;
    eprintln!("watch: monitoring {}, press Ctrl+C to stop", file.display());

    while rx.recv().is_ok() {
        let debounce = Duration::from_millis(DEBOUNCE_MS);
        while rx.recv_timeout(debounce).is_ok() {}

        let Ok(text) = std::fs::read_to_string(file) else {
            eprintln!("watch: {} is gone", file.display());
            cache.invalidate(doc.uri());
            continue;
        };
        doc.replace_text(&text);
        let status = cache.status_text(&doc);
        if status != last_status {
            println!("{status}  {}", file.display());
            last_status = status;
        }
    }

    return Ok(ExitCode::SUCCESS);
}
