//! Association files
//!
//! A link table stores a one-to-many or many-to-many relation that belongs
//! to neither side's record: one file per owner, holding the ordered list
//! of member ids. `sensor_x_data/<dataId>.json` lists the sensors linked
//! to one data record.
//!
//! Member ids are not checked against the member kind; a deleted sensor
//! stays listed until someone unlinks it.
//!
//! The table owns its directory exclusively. `link` and `unlink` rebuild
//! the owner's list from memory and rewrite the file; they do not read it
//! back first, so a change made to the files by another process is only
//! seen after [`LinkTable::load`].

use crate::codec::{JsonCodec, RecordCodec};
use crate::fsio;
use crate::report::LoadReport;
use crate::resolver::PathResolver;
use geocat_common::{RecordKey, Result};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Owner → members association persisted as one file per owner
pub struct LinkTable<O: RecordKey, M: RecordKey, C: RecordCodec = JsonCodec> {
    name: String,
    dir: PathBuf,
    codec: C,
    sync_writes: bool,
    links: RwLock<BTreeMap<O, Vec<M>>>,
    writer: Mutex<()>,
}

impl<O: RecordKey, M: RecordKey, C: RecordCodec> LinkTable<O, M, C> {
    /// Create an empty, unloaded table over `dir`
    pub fn new(dir: impl AsRef<Path>, codec: C, sync_writes: bool) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let name = dir
            .file_name()
            .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
        Self {
            name,
            dir,
            codec,
            sync_writes,
            links: RwLock::new(BTreeMap::new()),
            writer: Mutex::new(()),
        }
    }

    /// Resolve the association directory `name` and load it
    pub fn open(
        resolver: &dyn PathResolver,
        name: &str,
        codec: C,
        sync_writes: bool,
    ) -> Result<(Self, LoadReport)> {
        let dir = resolver.directory_for(name)?;
        let table = Self::new(dir, codec, sync_writes);
        let report = table.load()?;
        Ok((table, report))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn file_path(&self, owner: &O) -> PathBuf {
        self.dir.join(format!("{owner}.{}", self.codec.extension()))
    }

    /// Rebuild the in-memory map from the association directory
    pub fn load(&self) -> Result<LoadReport> {
        let _writer = self.writer.lock();
        let mut report = LoadReport::new(self.name.clone());
        let mut links = BTreeMap::new();

        for file in fsio::scan(&self.dir, self.codec.extension(), &mut report)? {
            let Some(owner) = O::parse_key(&file.stem) else {
                report.skip(&file.path, "file name is not an owner id");
                continue;
            };
            let raw: Vec<String> = match fsio::read(&file.path)
                .map_err(|e| format!("cannot read: {e}"))
                .and_then(|bytes| {
                    self.codec
                        .decode::<Vec<String>>(&bytes)
                        .map_err(|e| e.to_string())
                })
            {
                Ok(raw) => raw,
                Err(reason) => {
                    report.skip(&file.path, reason);
                    continue;
                }
            };

            let mut members: Vec<M> = Vec::with_capacity(raw.len());
            let mut bad = Vec::new();
            for id in &raw {
                match M::parse_key(id) {
                    Some(m) if !members.contains(&m) => members.push(m),
                    Some(_) => {}
                    None => bad.push(id.as_str()),
                }
            }
            if !bad.is_empty() {
                // Keep the owner with the members that did parse
                report.skip(&file.path, format!("unparsable member ids {bad:?}"));
            }
            links.insert(owner, members);
        }

        report.loaded = links.len();
        *self.links.write() = links;
        info!(
            "{}: loaded {} owners ({} diagnostics)",
            self.name,
            report.loaded,
            report.diagnostics.len()
        );
        Ok(report)
    }

    // ---- Reads ----

    /// Members of `owner`, in link order
    pub fn members_of(&self, owner: &O) -> Vec<M> {
        self.links.read().get(owner).cloned().unwrap_or_default()
    }

    /// Owners listing `member`, ordered by owner.
    ///
    /// Computed from the owner map on every call; there is no reverse index.
    pub fn owners_of(&self, member: &M) -> Vec<O> {
        self.links
            .read()
            .iter()
            .filter(|(_, members)| members.contains(member))
            .map(|(owner, _)| owner.clone())
            .collect()
    }

    pub fn is_linked(&self, owner: &O, member: &M) -> bool {
        self.links
            .read()
            .get(owner)
            .is_some_and(|members| members.contains(member))
    }

    /// Every owner with a link file
    pub fn owners(&self) -> Vec<O> {
        self.links.read().keys().cloned().collect()
    }

    /// Every (owner, members) pair, ordered by owner
    pub fn entries(&self) -> Vec<(O, Vec<M>)> {
        self.links
            .read()
            .iter()
            .map(|(o, m)| (o.clone(), m.clone()))
            .collect()
    }

    // ---- Writes ----

    /// Append `member` to `owner`'s list. Returns `false` when already linked.
    pub fn link(&self, owner: &O, member: &M) -> Result<bool> {
        let _writer = self.writer.lock();
        let mut members = self.members_of(owner);
        if members.contains(member) {
            return Ok(false);
        }
        members.push(member.clone());
        self.persist(owner, members)?;
        debug!("{}: linked {} -> {}", self.name, owner, member);
        Ok(true)
    }

    /// Remove `member` from `owner`'s list, rewriting the file even when
    /// the list becomes empty. Returns `false` when it was not a member.
    pub fn unlink(&self, owner: &O, member: &M) -> Result<bool> {
        let _writer = self.writer.lock();
        let mut members = self.members_of(owner);
        let Some(pos) = members.iter().position(|m| m == member) else {
            return Ok(false);
        };
        members.remove(pos);
        self.persist(owner, members)?;
        debug!("{}: unlinked {} -> {}", self.name, owner, member);
        Ok(true)
    }

    /// Replace `owner`'s whole list; duplicates are dropped, order kept
    pub fn set_members(&self, owner: &O, members: impl IntoIterator<Item = M>) -> Result<()> {
        let _writer = self.writer.lock();
        let mut unique: Vec<M> = Vec::new();
        for m in members {
            if !unique.contains(&m) {
                unique.push(m);
            }
        }
        self.persist(owner, unique)
    }

    /// Delete `owner`'s file. Returns `false` when it had none.
    pub fn remove_owner(&self, owner: &O) -> Result<bool> {
        let _writer = self.writer.lock();
        if !self.links.read().contains_key(owner) {
            return Ok(false);
        }
        fsio::remove(&self.file_path(owner))?;
        self.links.write().remove(owner);
        debug!("{}: removed owner {}", self.name, owner);
        Ok(true)
    }

    fn persist(&self, owner: &O, members: Vec<M>) -> Result<()> {
        let raw: Vec<String> = members.iter().map(ToString::to_string).collect();
        let bytes = self.codec.encode(&raw)?;
        fsio::write_atomic(&self.file_path(owner), &bytes, self.sync_writes)?;
        self.links.write().insert(owner.clone(), members);
        Ok(())
    }
}
