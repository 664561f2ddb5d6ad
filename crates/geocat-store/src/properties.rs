//! `config.properties`: flat key/value settings at the catalog root
//!
//! Format: one `key=value` per line, `#` or `!` starts a comment line,
//! blank lines are ignored and whitespace around keys and values is
//! trimmed. A line without `=` is a key with an empty value. The file is
//! rewritten sorted by key on every change; comments are not preserved.

use crate::fsio;
use geocat_common::{Error, Result};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Key/value property file
pub struct PropertyFile {
    path: PathBuf,
    sync_writes: bool,
    values: RwLock<BTreeMap<String, String>>,
    writer: Mutex<()>,
}

impl PropertyFile {
    /// Read `path`; a missing file is an empty property set
    pub fn open(path: impl AsRef<Path>, sync_writes: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = match fsio::read(&path) {
            Ok(bytes) => parse(&String::from_utf8_lossy(&bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(Error::io(&path, e)),
        };
        debug!("{:?}: {} properties", path, values.len());
        Ok(Self {
            path,
            sync_writes,
            values: RwLock::new(values),
            writer: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// All properties, sorted by key
    pub fn entries(&self) -> Vec<(String, String)> {
        self.values
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Set a property and rewrite the file
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() || key.starts_with(['#', '!']) || key.contains(['=', '\n']) {
            return Err(Error::configuration(format!("invalid property key {key:?}")));
        }
        if value.contains('\n') {
            return Err(Error::configuration(format!(
                "property {key} has a multi-line value"
            )));
        }

        let _writer = self.writer.lock();
        let mut next = self.values.read().clone();
        next.insert(key.to_string(), value.trim().to_string());
        self.persist(next)
    }

    /// Remove a property. Returns `false` when it was not set.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let _writer = self.writer.lock();
        let mut next = self.values.read().clone();
        if next.remove(key).is_none() {
            return Ok(false);
        }
        self.persist(next)?;
        Ok(true)
    }

    fn persist(&self, values: BTreeMap<String, String>) -> Result<()> {
        let mut out = String::new();
        for (k, v) in &values {
            out.push_str(k);
            out.push('=');
            out.push_str(v);
            out.push('\n');
        }
        fsio::write_atomic(&self.path, out.as_bytes(), self.sync_writes)?;
        *self.values.write() = values;
        Ok(())
    }
}

fn parse(text: &str) -> BTreeMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with(['#', '!']))
        .map(|l| match l.split_once('=') {
            Some((k, v)) => (k.trim().to_string(), v.trim().to_string()),
            None => (l.to_string(), String::new()),
        })
        .filter(|(k, _)| !k.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_format() {
        let parsed = parse("# header\n! other comment\n\n a.b = 1 \nflag\nurl=http://x/?q=1\n=orphan\n");
        assert_eq!(parsed.get("a.b").map(String::as_str), Some("1"));
        assert_eq!(parsed.get("flag").map(String::as_str), Some(""));
        assert_eq!(parsed.get("url").map(String::as_str), Some("http://x/?q=1"));
        assert_eq!(parsed.len(), 3);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let props = PropertyFile::open(dir.path().join("config.properties"), false).unwrap();
        assert!(props.entries().is_empty());
        assert_eq!(props.get_or("services.url", "none"), "none");
    }

    #[test]
    fn test_set_remove_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.properties");
        {
            let props = PropertyFile::open(&path, false).unwrap();
            props.set("services.url", "http://localhost/geocat").unwrap();
            props.set("admin.email", "ops@example.org").unwrap();
            assert!(props.remove("admin.email").unwrap());
            assert!(!props.remove("admin.email").unwrap());
        }

        let props = PropertyFile::open(&path, false).unwrap();
        assert_eq!(
            props.entries(),
            vec![("services.url".to_string(), "http://localhost/geocat".to_string())]
        );
    }

    #[test]
    fn test_invalid_keys() {
        let dir = tempdir().unwrap();
        let props = PropertyFile::open(dir.path().join("config.properties"), false).unwrap();
        assert!(props.set("", "x").is_err());
        assert!(props.set("a=b", "x").is_err());
        assert!(props.set("#a", "x").is_err());
        assert!(props.set("a", "multi\nline").is_err());
        assert!(props.entries().is_empty());
    }
}
