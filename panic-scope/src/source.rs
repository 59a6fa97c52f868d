//! Source locator and line-numbered snippet builder
//!
//! Loading the triggering file is best-effort: the file is frequently absent
//! (dependency frames compiled elsewhere, binaries deployed without their
//! sources), and none of that may turn into a second failure on the fault
//! path.

use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::DiagnosticError;
use crate::fault_log::FaultLog;

/// Files above this size are not loaded into the diagnostic page.
pub const MAX_SOURCE_BYTES: u64 = 1024 * 1024;

/// The triggering file rendered for the source pane.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSnippet {
    pub raw: String,
    /// One entry per line: `"{n} {line}\n"`, `n` starting at 1.
    pub formatted: Vec<String>,
    /// Concatenation of `formatted`.
    pub highlight: String,
    pub skipped: bool,
}

impl SourceSnippet {
    /// Snippet for a file that could not be shown.
    #[must_use]
    pub fn skipped() -> Self {
        Self { skipped: true, ..Self::default() }
    }

    /// Number every line of `raw`.
    #[must_use]
    pub fn from_source(raw: String) -> Self {
        let formatted: Vec<String> =
            raw.lines().enumerate().map(|(idx, line)| format!("{} {line}\n", idx + 1)).collect();
        let highlight = formatted.concat();
        Self { raw, formatted, highlight, skipped: false }
    }
}

/// Resolves and loads source files for the diagnostic page.
pub struct SourceLocator<'a> {
    root: &'a Path,
    log: &'a dyn FaultLog,
}

impl<'a> SourceLocator<'a> {
    pub fn new(root: &'a Path, log: &'a dyn FaultLog) -> Self {
        Self { root, log }
    }

    /// Load `file`, or return a skipped snippet.
    ///
    /// A missing file is skipped silently. A failed read after the file was
    /// found is reported through the fault log, then skipped as well.
    #[must_use]
    pub fn locate(&self, file: &str) -> SourceSnippet {
        let Some(path) = self.resolve(file) else {
            debug!("Source file {file:?} not found, skipping source pane");
            return SourceSnippet::skipped();
        };

        match read_source(&path) {
            Ok(raw) => SourceSnippet::from_source(raw),
            Err(err @ DiagnosticError::SourceTooLarge { .. }) => {
                debug!("{err}");
                SourceSnippet::skipped()
            }
            Err(err) => {
                self.log.error(&err.to_string());
                SourceSnippet::skipped()
            }
        }
    }

    /// The path as given, or joined onto the root when it is relative.
    fn resolve(&self, file: &str) -> Option<PathBuf> {
        if file.is_empty() {
            return None;
        }

        let path = Path::new(file);
        if path.exists() {
            return Some(path.to_path_buf());
        }
        if path.is_relative() {
            let rooted = self.root.join(path);
            if rooted.exists() {
                return Some(rooted);
            }
        }
        None
    }
}

fn read_source(path: &Path) -> Result<String, DiagnosticError> {
    let unreadable =
        |error| DiagnosticError::SourceUnreadable { path: path.display().to_string(), error };

    let size = fs::metadata(path).map_err(unreadable)?.len();
    if size > MAX_SOURCE_BYTES {
        return Err(DiagnosticError::SourceTooLarge {
            path: path.display().to_string(),
            size,
            limit: MAX_SOURCE_BYTES,
        });
    }

    let bytes = fs::read(path).map_err(unreadable)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
