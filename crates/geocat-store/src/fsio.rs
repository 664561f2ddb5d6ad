//! File helpers shared by every store
//!
//! Writes go to `<file>.tmp` first and are renamed over the target, so a
//! reader (or a restart) sees either the old or the new content.

use crate::report::LoadReport;
use geocat_common::{Error, Result};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Suffix of in-flight writes
pub(crate) const TMP_SUFFIX: &str = ".tmp";

/// Path of the temporary sibling used while writing `path`
pub(crate) fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map_or_else(OsString::new, ToOwned::to_owned);
    name.push(TMP_SUFFIX);
    path.with_file_name(name)
}

/// Write `bytes` to `path` through a temporary file and a rename
pub(crate) fn write_atomic(path: &Path, bytes: &[u8], sync: bool) -> Result<()> {
    let tmp = tmp_path(path);
    let written = (|| -> std::io::Result<()> {
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        if sync {
            file.sync_all()?;
        }
        Ok(())
    })();

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(Error::io(&tmp, e));
    }

    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(Error::io(path, e));
    }
    Ok(())
}

/// Remove a file; a missing file is an error, not a no-op
pub(crate) fn remove(path: &Path) -> Result<()> {
    fs::remove_file(path).map_err(|e| Error::io(path, e))
}

/// Read a whole file
pub(crate) fn read(path: &Path) -> std::io::Result<Vec<u8>> {
    fs::read(path)
}

/// Create a directory (and parents) if absent
pub(crate) fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| Error::io(path, e))
}

/// Remove a directory and everything below it
pub(crate) fn remove_tree(path: &Path) -> Result<()> {
    fs::remove_dir_all(path).map_err(|e| Error::io(path, e))
}

/// Visible sub-directories of `dir`, sorted by name. A missing `dir` has
/// none.
pub(crate) fn subdirs(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::io(dir, e)),
    };

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if name.starts_with('.') || !entry.file_type().is_ok_and(|t| t.is_dir()) {
            continue;
        }
        found.push((name, entry.path()));
    }
    found.sort();
    Ok(found)
}

/// Stems of the visible `<stem>.<extension>` files of `dir`, sorted.
/// A missing `dir` has none.
pub(crate) fn stems(dir: &Path, extension: &str) -> Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::io(dir, e)),
    };
    let suffix = format!(".{extension}");

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        if let Some(stem) = name.strip_suffix(&suffix)
            && !stem.is_empty()
        {
            found.push(stem.to_string());
        }
    }
    found.sort();
    Ok(found)
}

/// A record file found while scanning a directory
#[derive(Debug)]
pub(crate) struct ScannedFile {
    pub path: PathBuf,
    pub stem: String,
}

/// List the `<stem>.<extension>` files of `dir`, sorted by name.
///
/// Hidden files are ignored. Interrupted writes (`*.tmp`) are removed and
/// reported; anything else that is not a record file is reported and
/// skipped. Only a failure to read the directory itself is an error.
pub(crate) fn scan(dir: &Path, extension: &str, report: &mut LoadReport) -> Result<Vec<ScannedFile>> {
    let entries = fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
    let suffix = format!(".{extension}");
    let mut files = Vec::new();

    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();

        let Some(name) = entry.file_name().to_str().map(ToOwned::to_owned) else {
            report.skip(&path, "file name is not valid UTF-8");
            continue;
        };
        if name.starts_with('.') {
            continue;
        }

        match entry.file_type() {
            Ok(t) if t.is_file() => {}
            Ok(_) => {
                debug!("ignoring non-file entry {:?}", path);
                continue;
            }
            Err(e) => {
                report.skip(&path, format!("cannot stat: {e}"));
                continue;
            }
        }

        if name.ends_with(TMP_SUFFIX) {
            let outcome = match fs::remove_file(&path) {
                Ok(()) => "removed leftover of an interrupted write".to_string(),
                Err(e) => format!("leftover of an interrupted write, cannot remove: {e}"),
            };
            report.skip(&path, outcome);
            continue;
        }

        match name.strip_suffix(&suffix) {
            Some(stem) if !stem.is_empty() => files.push(ScannedFile {
                stem: stem.to_string(),
                path,
            }),
            _ => report.skip(&path, format!("not a .{extension} record file")),
        }
    }

    files.sort_by(|a, b| a.stem.cmp(&b.stem));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("7.json");

        write_atomic(&path, b"first", false).unwrap();
        write_atomic(&path, b"second", true).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn test_write_atomic_missing_dir() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gone").join("1.json");

        let err = write_atomic(&path, b"x", false).unwrap_err();
        assert!(err.is_io());
    }

    #[test]
    fn test_remove_missing_is_error() {
        let dir = tempdir().unwrap();
        assert!(remove(&dir.path().join("1.json")).is_err());
    }

    #[test]
    fn test_subdirs() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("b")).unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        fs::create_dir(dir.path().join(".trash")).unwrap();
        fs::write(dir.path().join("c"), b"file").unwrap();

        let names: Vec<_> = subdirs(dir.path())
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(subdirs(&dir.path().join("missing")).unwrap().is_empty());
    }

    #[test]
    fn test_scan_filters_and_cleans() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("2.json"), b"{}").unwrap();
        fs::write(dir.path().join("10.json"), b"{}").unwrap();
        fs::write(dir.path().join(".sequence"), b"10").unwrap();
        fs::write(dir.path().join("3.json.tmp"), b"{").unwrap();
        fs::write(dir.path().join("notes.txt"), b"hello").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();

        let mut report = LoadReport::new("test");
        let files = scan(dir.path(), "json", &mut report).unwrap();

        let stems: Vec<_> = files.iter().map(|f| f.stem.as_str()).collect();
        assert_eq!(stems, vec!["10", "2"]);
        assert_eq!(report.diagnostics.len(), 2);
        assert!(!dir.path().join("3.json.tmp").exists());
    }
}
