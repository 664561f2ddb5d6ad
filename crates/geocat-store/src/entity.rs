//! Generic per-kind record store
//!
//! One [`EntityStore`] owns one kind directory. Files are the source of
//! truth; the primary index and the secondary indices are derived from
//! them at load and kept in step by every mutation.
//!
//! # Write path
//! 1. Take the mutation lock (serializes writers, owns the id counter)
//! 2. Check key and unique-index collisions against current state
//! 3. Write the record file (temp + rename)
//! 4. Take the state write lock and apply remove-then-insert on indices
//!
//! A failure in step 3 returns before step 4, so memory never holds a
//! record that is not on disk. Readers only wait for step 4.

use crate::allocator::{self, IdAllocator};
use crate::codec::{JsonCodec, RecordCodec};
use crate::fsio;
use crate::index::{IndexKey, Indexes};
use crate::record::Record;
use crate::report::LoadReport;
use crate::resolver::PathResolver;
use geocat_common::{CatalogConfig, DuplicatePolicy, Error, RecordKey, Result, is_file_stem};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Write behavior shared by every store of a catalog
#[derive(Clone, Copy, Debug)]
pub struct StoreOptions {
    pub duplicate_policy: DuplicatePolicy,
    pub sync_writes: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::Reject,
            sync_writes: true,
        }
    }
}

impl From<&CatalogConfig> for StoreOptions {
    fn from(config: &CatalogConfig) -> Self {
        Self {
            duplicate_policy: config.duplicate_policy,
            sync_writes: config.sync_writes,
        }
    }
}

struct State<R: Record> {
    records: BTreeMap<R::Key, R>,
    indexes: Indexes<R, R::Key>,
}

impl<R: Record> State<R> {
    fn empty() -> Self {
        Self {
            records: BTreeMap::new(),
            indexes: Indexes::new(R::indexes()),
        }
    }

    fn put(&mut self, key: R::Key, record: R) {
        if let Some(old) = self.records.remove(&key) {
            self.indexes.remove(&key, &old);
        }
        self.indexes.insert(&key, &record);
        self.records.insert(key, record);
    }

    fn take(&mut self, key: &R::Key) -> Option<R> {
        let old = self.records.remove(key)?;
        self.indexes.remove(key, &old);
        Some(old)
    }
}

/// Indexed store of one record kind
pub struct EntityStore<R: Record, C: RecordCodec = JsonCodec> {
    dir: PathBuf,
    codec: C,
    options: StoreOptions,
    state: RwLock<State<R>>,
    writer: Mutex<IdAllocator>,
}

impl<R: Record, C: RecordCodec> EntityStore<R, C> {
    /// Create an empty, unloaded store over `dir`
    pub fn new(dir: impl AsRef<Path>, codec: C, options: StoreOptions) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            codec,
            options,
            state: RwLock::new(State::empty()),
            writer: Mutex::new(IdAllocator::new()),
        }
    }

    /// Resolve the kind directory and load it
    pub fn open(
        resolver: &dyn PathResolver,
        codec: C,
        options: StoreOptions,
    ) -> Result<(Self, LoadReport)> {
        let dir = resolver.kind_directory(R::KIND)?;
        let store = Self::new(dir, codec, options);
        let report = store.load()?;
        Ok((store, report))
    }

    /// Kind directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File a record with `key` is stored in
    pub fn file_path(&self, key: &R::Key) -> PathBuf {
        self.dir.join(format!("{key}.{}", self.codec.extension()))
    }

    /// Scan the kind directory and rebuild every index from it.
    ///
    /// Files that cannot be read or decoded are reported and skipped. The
    /// id counter is moved past the highest id seen and the persisted
    /// high-water mark; a reload never moves it back.
    pub fn load(&self) -> Result<LoadReport> {
        let mut alloc = self.writer.lock();
        let mut report = LoadReport::new(R::KIND.dir_name());
        let mut state = State::<R>::empty();
        let mut max_seen = 0u64;

        for file in fsio::scan(&self.dir, self.codec.extension(), &mut report)? {
            let bytes = match fsio::read(&file.path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    report.skip(&file.path, format!("cannot read: {e}"));
                    continue;
                }
            };
            let record: R = match self.codec.decode(&bytes) {
                Ok(record) => record,
                Err(e) => {
                    report.skip(&file.path, e.to_string());
                    continue;
                }
            };

            let key = record.key();
            if key.to_string() != file.stem {
                report.skip(
                    &file.path,
                    format!("file name does not match record key {key}"),
                );
                continue;
            }

            for collision in state.indexes.collisions(&key, &record) {
                warn!(
                    "{}: {} and {} share {} in unique index '{}'",
                    R::KIND,
                    collision.holder,
                    key,
                    collision.key,
                    collision.index
                );
            }

            if let Some(seq) = key.sequence() {
                max_seen = max_seen.max(seq);
            }
            state.put(key, record);
        }

        if let Some(high_water) = allocator::read_high_water(&self.dir, &mut report) {
            max_seen = max_seen.max(high_water);
        }
        alloc.seed(max_seen);
        if alloc.is_exhausted() {
            report.skip(&self.dir, "id space exhausted, creates will fail");
        }

        report.loaded = state.records.len();
        *self.state.write() = state;

        info!(
            "{}: loaded {} records ({} skipped), next id {:?}",
            R::KIND,
            report.loaded,
            report.diagnostics.len(),
            alloc.peek()
        );
        Ok(report)
    }

    // ---- Reads ----

    pub fn find_by_id(&self, key: &R::Key) -> Option<R> {
        self.state.read().records.get(key).cloned()
    }

    pub fn exists_by_id(&self, key: &R::Key) -> bool {
        self.state.read().records.contains_key(key)
    }

    /// First record under `key` in index `index`; meant for unique indices
    pub fn find_one(&self, index: &str, key: &IndexKey) -> Option<R> {
        let state = self.state.read();
        state
            .indexes
            .lookup(index, key)
            .first()
            .and_then(|pk| state.records.get(pk).cloned())
    }

    /// Every record under `key` in index `index`, ordered by primary key
    pub fn find_many(&self, index: &str, key: &IndexKey) -> Vec<R> {
        let state = self.state.read();
        state
            .indexes
            .lookup(index, key)
            .iter()
            .filter_map(|pk| state.records.get(pk).cloned())
            .collect()
    }

    /// Primary keys under `key` in index `index`
    pub fn keys_of(&self, index: &str, key: &IndexKey) -> Vec<R::Key> {
        self.state.read().indexes.lookup(index, key)
    }

    /// Distinct values currently present in index `index`
    pub fn index_keys(&self, index: &str) -> Vec<IndexKey> {
        self.state.read().indexes.keys(index)
    }

    /// Names of this kind's secondary indices
    pub fn index_names(&self) -> Vec<&'static str> {
        self.state.read().indexes.names().collect()
    }

    /// Whether any secondary index still refers to `key`
    pub fn is_indexed(&self, key: &R::Key) -> bool {
        self.state.read().indexes.references(key)
    }

    /// All records, ordered by primary key
    pub fn find_all(&self) -> Vec<R> {
        self.state.read().records.values().cloned().collect()
    }

    /// Records matching a predicate, ordered by primary key
    pub fn filter(&self, pred: impl Fn(&R) -> bool) -> Vec<R> {
        self.state
            .read()
            .records
            .values()
            .filter(|r| pred(r))
            .cloned()
            .collect()
    }

    pub fn ids(&self) -> Vec<R::Key> {
        self.state.read().records.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Id the next `create` of a numeric kind will assign, `None` once the
    /// id space is exhausted
    pub fn next_id(&self) -> Option<u64> {
        self.writer.lock().peek()
    }

    // ---- Writes ----

    /// Persist a new record and index it. Numeric kinds get a fresh id
    /// (any id already set on the record is replaced); caller-keyed kinds
    /// are stored under the record's own key.
    pub fn create(&self, record: R) -> Result<R::Key> {
        let mut alloc = self.writer.lock();
        self.create_locked(&mut alloc, record)
    }

    /// Rewrite an existing record. Returns `false` when the key is absent.
    pub fn update(&self, record: R) -> Result<bool> {
        let _writer = self.writer.lock();
        self.update_locked(record)
    }

    /// Update when the key exists, create otherwise
    pub fn upsert(&self, record: R) -> Result<R::Key> {
        let mut alloc = self.writer.lock();
        let key = record.key();
        if self.exists_by_id(&key) {
            self.update_locked(record)?;
            Ok(key)
        } else {
            self.create_locked(&mut alloc, record)
        }
    }

    /// Remove a record's file and every index entry. Returns `false` when
    /// the key is absent. If the file cannot be removed, memory is left
    /// untouched.
    pub fn delete(&self, key: &R::Key) -> Result<bool> {
        let _writer = self.writer.lock();
        self.delete_locked(key)
    }

    /// Delete every record under `key` in index `index`.
    ///
    /// Stops at the first failure; records deleted before it stay deleted.
    pub fn delete_where(&self, index: &str, key: &IndexKey) -> Result<usize> {
        let _writer = self.writer.lock();
        let keys = self.keys_of(index, key);
        let mut deleted = 0;
        for pk in &keys {
            if self.delete_locked(pk)? {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    fn create_locked(&self, alloc: &mut IdAllocator, mut record: R) -> Result<R::Key> {
        let generated = alloc.peek().and_then(R::Key::from_sequence);
        let key = match &generated {
            Some(key) => key.clone(),
            None => {
                let key = record.key();
                if key.sequence().is_some() {
                    return Err(Error::IdExhausted { kind: R::KIND });
                }
                if !is_file_stem(&key.to_string()) {
                    return Err(Error::InvalidKey {
                        kind: R::KIND,
                        key: key.to_string(),
                    });
                }
                key
            }
        };

        {
            let state = self.state.read();
            if state.records.contains_key(&key) {
                match self.options.duplicate_policy {
                    DuplicatePolicy::Reject => {
                        return Err(Error::DuplicateKey {
                            kind: R::KIND,
                            key: key.to_string(),
                        });
                    }
                    DuplicatePolicy::Overwrite => {
                        warn!("{}: create overwrites existing {}", R::KIND, key);
                    }
                }
            }
            self.check_collisions(&state, &key, &record)?;
        }

        if generated.is_some() {
            let id = alloc
                .next_id()
                .ok_or(Error::IdExhausted { kind: R::KIND })?;
            allocator::write_high_water(&self.dir, id, self.options.sync_writes)?;
            record.set_key(key.clone());
        }

        self.write_record(&key, &record)?;
        self.state.write().put(key.clone(), record);
        debug!("{}: created {}", R::KIND, key);
        Ok(key)
    }

    fn update_locked(&self, record: R) -> Result<bool> {
        let key = record.key();
        {
            let state = self.state.read();
            if !state.records.contains_key(&key) {
                debug!("{}: update of absent {} ignored", R::KIND, key);
                return Ok(false);
            }
            self.check_collisions(&state, &key, &record)?;
        }

        self.write_record(&key, &record)?;
        self.state.write().put(key.clone(), record);
        debug!("{}: updated {}", R::KIND, key);
        Ok(true)
    }

    fn delete_locked(&self, key: &R::Key) -> Result<bool> {
        if !self.exists_by_id(key) {
            return Ok(false);
        }
        fsio::remove(&self.file_path(key))?;
        self.state.write().take(key);
        debug!("{}: deleted {}", R::KIND, key);
        Ok(true)
    }

    fn check_collisions(&self, state: &State<R>, key: &R::Key, record: &R) -> Result<()> {
        let collisions = state.indexes.collisions(key, record);
        let Some(first) = collisions.first() else {
            return Ok(());
        };
        match self.options.duplicate_policy {
            DuplicatePolicy::Reject => Err(Error::UniqueViolation {
                kind: R::KIND,
                index: first.index,
                key: first.key.to_string(),
            }),
            DuplicatePolicy::Overwrite => {
                for c in &collisions {
                    warn!(
                        "{}: {} now shares {} in unique index '{}' with {}",
                        R::KIND,
                        key,
                        c.key,
                        c.index,
                        c.holder
                    );
                }
                Ok(())
            }
        }
    }

    fn write_record(&self, key: &R::Key, record: &R) -> Result<()> {
        let bytes = self.codec.encode(record)?;
        fsio::write_atomic(&self.file_path(key), &bytes, self.options.sync_writes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::BincodeCodec;
    use crate::index::IndexSpec;
    use geocat_common::Kind;
    use serde::{Deserialize, Serialize};
    use tempfile::tempdir;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Probe {
        id: u64,
        name: String,
        group: Option<u64>,
    }

    impl Record for Probe {
        type Key = u64;
        const KIND: Kind = Kind::Sensors;

        fn key(&self) -> u64 {
            self.id
        }

        fn set_key(&mut self, key: u64) {
            self.id = key;
        }

        fn indexes() -> Vec<IndexSpec<Self>> {
            vec![
                IndexSpec::unique("name", |p: &Self| vec![IndexKey::from(p.name.as_str())]),
                IndexSpec::multi("group", |p: &Self| {
                    p.group.map(IndexKey::from).into_iter().collect()
                }),
            ]
        }
    }

    fn probe(name: &str, group: Option<u64>) -> Probe {
        Probe {
            id: 0,
            name: name.into(),
            group,
        }
    }

    fn store(dir: &Path) -> EntityStore<Probe> {
        let store = EntityStore::new(dir, JsonCodec, StoreOptions::default());
        store.load().unwrap();
        store
    }

    #[test]
    fn test_create_assigns_sequential_ids() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        assert_eq!(store.create(probe("a", None)).unwrap(), 1);
        assert_eq!(store.create(probe("b", None)).unwrap(), 2);

        let found = store.find_by_id(&2).unwrap();
        assert_eq!(found.id, 2);
        assert_eq!(found.name, "b");
        assert!(dir.path().join("2.json").exists());
    }

    #[test]
    fn test_create_replaces_caller_id() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        let mut p = probe("a", None);
        p.id = 99;
        assert_eq!(store.create(p).unwrap(), 1);
        assert!(!store.exists_by_id(&99));
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        let a = store.create(probe("a", None)).unwrap();
        let b = store.create(probe("b", None)).unwrap();
        assert!(store.delete(&b).unwrap());
        assert!(store.delete(&a).unwrap());

        assert_eq!(store.create(probe("c", None)).unwrap(), 3);
    }

    #[test]
    fn test_high_water_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = store(dir.path());
            store.create(probe("a", None)).unwrap();
            let b = store.create(probe("b", None)).unwrap();
            store.delete(&b).unwrap();
        }

        let store = store(dir.path());
        assert_eq!(store.len(), 1);
        assert_eq!(store.create(probe("c", None)).unwrap(), 3);
    }

    #[test]
    fn test_update_moves_between_buckets() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let id = store.create(probe("a", Some(1))).unwrap();
        store.create(probe("b", Some(1))).unwrap();

        let mut p = store.find_by_id(&id).unwrap();
        p.group = Some(2);
        assert!(store.update(p).unwrap());

        let group1: Vec<u64> = store.keys_of("group", &1u64.into());
        assert_eq!(group1, vec![2]);
        assert_eq!(store.keys_of("group", &2u64.into()), vec![id]);

        // Same edit twice does not duplicate
        let p = store.find_by_id(&id).unwrap();
        assert!(store.update(p).unwrap());
        assert_eq!(store.keys_of("group", &2u64.into()), vec![id]);
    }

    #[test]
    fn test_update_absent_is_noop() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        let mut p = probe("ghost", None);
        p.id = 5;
        assert!(!store.update(p).unwrap());
        assert!(!dir.path().join("5.json").exists());
    }

    #[test]
    fn test_update_renames_unique_key() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let id = store.create(probe("old", None)).unwrap();

        let mut p = store.find_by_id(&id).unwrap();
        p.name = "new".into();
        store.update(p).unwrap();

        assert!(store.find_one("name", &"old".into()).is_none());
        assert_eq!(store.find_one("name", &"new".into()).unwrap().id, id);
    }

    #[test]
    fn test_unique_violation_rejected() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        store.create(probe("a", None)).unwrap();

        let err = store.create(probe("a", None)).unwrap_err();
        assert!(matches!(err, Error::UniqueViolation { index: "name", .. }));
        assert_eq!(store.len(), 1);
        // Rejected creates do not consume ids
        assert_eq!(store.next_id(), Some(2));
    }

    #[test]
    fn test_unique_overwrite_policy() {
        let dir = tempdir().unwrap();
        let store: EntityStore<Probe> = EntityStore::new(
            dir.path(),
            JsonCodec,
            StoreOptions {
                duplicate_policy: DuplicatePolicy::Overwrite,
                sync_writes: false,
            },
        );
        store.load().unwrap();

        let first = store.create(probe("a", None)).unwrap();
        let second = store.create(probe("a", None)).unwrap();

        assert_eq!(store.find_one("name", &"a".into()).unwrap().id, second);
        // Deleting the displaced record leaves the new holder indexed
        store.delete(&first).unwrap();
        assert_eq!(store.find_one("name", &"a".into()).unwrap().id, second);
    }

    #[test]
    fn test_overwritten_holder_regains_unique_key() {
        let dir = tempdir().unwrap();
        let options = StoreOptions {
            duplicate_policy: DuplicatePolicy::Overwrite,
            sync_writes: false,
        };
        let store: EntityStore<Probe> = EntityStore::new(dir.path(), JsonCodec, options);
        store.load().unwrap();

        let first = store.create(probe("a", None)).unwrap();
        let second = store.create(probe("a", None)).unwrap();
        assert!(store.delete(&second).unwrap());

        assert_eq!(store.find_one("name", &"a".into()).unwrap().id, first);
        assert!(store.is_indexed(&first));

        // Memory agrees with a fresh load of the same files
        let reloaded: EntityStore<Probe> = EntityStore::new(dir.path(), JsonCodec, options);
        reloaded.load().unwrap();
        assert_eq!(reloaded.find_one("name", &"a".into()).unwrap().id, first);
    }

    #[test]
    fn test_overwrite_holder_matches_reload() {
        let dir = tempdir().unwrap();
        let options = StoreOptions {
            duplicate_policy: DuplicatePolicy::Overwrite,
            sync_writes: false,
        };
        let store: EntityStore<Probe> = EntityStore::new(dir.path(), JsonCodec, options);
        store.load().unwrap();

        // Ten records so that file stem order ("10" < "9") differs from id order
        for i in 0..10 {
            store.create(probe(&format!("p{i}"), None)).unwrap();
        }
        let mut nine = store.find_by_id(&9).unwrap();
        nine.name = "shared".into();
        store.update(nine).unwrap();
        let mut ten = store.find_by_id(&10).unwrap();
        ten.name = "shared".into();
        store.update(ten).unwrap();
        let mut one = store.find_by_id(&1).unwrap();
        one.name = "shared".into();
        store.update(one).unwrap();

        let holder = store.find_one("name", &"shared".into()).unwrap().id;
        assert_eq!(holder, 10);

        let reloaded: EntityStore<Probe> = EntityStore::new(dir.path(), JsonCodec, options);
        reloaded.load().unwrap();
        assert_eq!(reloaded.find_one("name", &"shared".into()).unwrap().id, holder);
    }

    #[test]
    fn test_delete_completeness() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let id = store.create(probe("a", Some(7))).unwrap();

        assert!(store.delete(&id).unwrap());
        assert!(store.find_by_id(&id).is_none());
        assert!(!store.is_indexed(&id));
        assert!(!store.file_path(&id).exists());
        assert!(store.index_keys("group").is_empty());

        assert!(!store.delete(&id).unwrap());
    }

    #[test]
    fn test_delete_failure_keeps_memory() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let id = store.create(probe("a", Some(7))).unwrap();

        std::fs::remove_file(store.file_path(&id)).unwrap();

        let err = store.delete(&id).unwrap_err();
        assert!(err.is_io());
        assert!(store.exists_by_id(&id));
        assert_eq!(store.keys_of("group", &7u64.into()), vec![id]);
    }

    #[test]
    fn test_write_failure_leaves_no_index() {
        let dir = tempdir().unwrap();
        let kind_dir = dir.path().join("probes");
        std::fs::create_dir(&kind_dir).unwrap();
        let store = store(&kind_dir);

        std::fs::remove_dir_all(&kind_dir).unwrap();

        let err = store.create(probe("a", Some(1))).unwrap_err();
        assert!(err.is_io());
        assert!(store.is_empty());
        assert!(store.find_one("name", &"a".into()).is_none());
        assert!(store.index_keys("group").is_empty());
    }

    #[test]
    fn test_partial_load() {
        let dir = tempdir().unwrap();
        {
            let store = store(dir.path());
            for name in ["a", "b", "c"] {
                store.create(probe(name, None)).unwrap();
            }
        }
        std::fs::remove_file(dir.path().join(allocator::SEQUENCE_FILE)).unwrap();
        std::fs::write(dir.path().join("8.json"), b"{ truncated").unwrap();
        std::fs::write(dir.path().join("9.json"), b"[]").unwrap();

        let store: EntityStore<Probe> = EntityStore::new(dir.path(), JsonCodec, StoreOptions::default());
        let report = store.load().unwrap();

        assert_eq!(report.loaded, 3);
        assert_eq!(report.diagnostics.len(), 2);
        assert_eq!(store.next_id(), Some(4));
    }

    #[test]
    fn test_load_rejects_misnamed_file() {
        let dir = tempdir().unwrap();
        let bytes = JsonCodec.encode(&Probe {
            id: 3,
            name: "x".into(),
            group: None,
        });
        std::fs::write(dir.path().join("4.json"), bytes.unwrap()).unwrap();

        let store: EntityStore<Probe> = EntityStore::new(dir.path(), JsonCodec, StoreOptions::default());
        let report = store.load().unwrap();

        assert_eq!(report.loaded, 0);
        assert_eq!(report.diagnostics.len(), 1);
        assert!(store.find_by_id(&3).is_none());
    }

    #[test]
    fn test_reload_never_lowers_allocator() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        store.create(probe("a", None)).unwrap();
        let b = store.create(probe("b", None)).unwrap();
        store.delete(&b).unwrap();
        std::fs::remove_file(dir.path().join(allocator::SEQUENCE_FILE)).unwrap();

        store.load().unwrap();
        assert_eq!(store.next_id(), Some(3));
    }

    #[test]
    fn test_load_at_max_id_exhausts() {
        let dir = tempdir().unwrap();
        let last = Probe {
            id: u64::MAX,
            name: "last".into(),
            group: None,
        };
        std::fs::write(
            dir.path().join(format!("{}.json", u64::MAX)),
            JsonCodec.encode(&last).unwrap(),
        )
        .unwrap();

        let store: EntityStore<Probe> =
            EntityStore::new(dir.path(), JsonCodec, StoreOptions::default());
        let report = store.load().unwrap();

        assert_eq!(report.loaded, 1);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(store.next_id(), None);

        let err = store.create(probe("next", None)).unwrap_err();
        assert!(matches!(err, Error::IdExhausted { .. }));
        assert_eq!(store.len(), 1);
        assert_eq!(store.find_by_id(&u64::MAX).unwrap().name, "last");
    }

    #[test]
    fn test_high_water_at_max_exhausts() {
        let dir = tempdir().unwrap();
        allocator::write_high_water(dir.path(), u64::MAX, false).unwrap();

        let store = store(dir.path());
        assert_eq!(store.next_id(), None);
        assert!(store.create(probe("a", None)).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_delete_where() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        store.create(probe("a", Some(1))).unwrap();
        store.create(probe("b", Some(1))).unwrap();
        let keep = store.create(probe("c", Some(2))).unwrap();

        assert_eq!(store.delete_where("group", &1u64.into()).unwrap(), 2);
        assert_eq!(store.ids(), vec![keep]);
    }

    #[test]
    fn test_upsert() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        let id = store.upsert(probe("a", None)).unwrap();
        let mut p = store.find_by_id(&id).unwrap();
        p.group = Some(4);
        assert_eq!(store.upsert(p).unwrap(), id);
        assert_eq!(store.len(), 1);
        assert_eq!(store.find_by_id(&id).unwrap().group, Some(4));
    }

    #[test]
    fn test_bincode_store_roundtrip() {
        let dir = tempdir().unwrap();
        {
            let store: EntityStore<Probe, BincodeCodec> =
                EntityStore::new(dir.path(), BincodeCodec, StoreOptions::default());
            store.load().unwrap();
            store.create(probe("a", Some(3))).unwrap();
        }
        assert!(dir.path().join("1.bin").exists());

        let store: EntityStore<Probe, BincodeCodec> =
            EntityStore::new(dir.path(), BincodeCodec, StoreOptions::default());
        store.load().unwrap();
        assert_eq!(store.find_one("name", &"a".into()).unwrap().group, Some(3));
    }
}
