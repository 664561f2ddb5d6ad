//! Load-time diagnostics
//!
//! Loading never fails because of one bad file. Every file that could not
//! be turned into a record is reported here and skipped.

use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;

/// A file skipped (or cleaned up) while loading a store
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadDiagnostic {
    pub path: PathBuf,
    pub reason: String,
}

impl fmt::Display for LoadDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.reason)
    }
}

/// Outcome of loading one store
#[derive(Clone, Debug, Default)]
pub struct LoadReport {
    /// Store name (kind directory or association name)
    pub store: String,
    /// Records that made it into memory
    pub loaded: usize,
    /// Files that did not
    pub diagnostics: Vec<LoadDiagnostic>,
}

impl LoadReport {
    pub fn new(store: impl Into<String>) -> Self {
        Self {
            store: store.into(),
            ..Default::default()
        }
    }

    /// Record a skipped file and log it
    pub fn skip(&mut self, path: impl AsRef<Path>, reason: impl Into<String>) {
        let diagnostic = LoadDiagnostic {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        };
        warn!("{}: skipping {}", self.store, diagnostic);
        self.diagnostics.push(diagnostic);
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Reports of every store of a catalog
#[derive(Clone, Debug, Default)]
pub struct CatalogLoadReport {
    pub stores: Vec<LoadReport>,
}

impl CatalogLoadReport {
    pub fn push(&mut self, report: LoadReport) {
        self.stores.push(report);
    }

    /// Total records loaded across stores
    #[must_use]
    pub fn loaded(&self) -> usize {
        self.stores.iter().map(|r| r.loaded).sum()
    }

    /// Every diagnostic, tagged with its store
    pub fn diagnostics(&self) -> impl Iterator<Item = (&str, &LoadDiagnostic)> {
        self.stores
            .iter()
            .flat_map(|r| r.diagnostics.iter().map(move |d| (r.store.as_str(), d)))
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.stores.iter().all(LoadReport::is_clean)
    }
}
