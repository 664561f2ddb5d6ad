//! Secondary indices
//!
//! An index maps a projection of a record to the primary key(s) of the
//! records that project to it. Indices hold keys, never records, and are
//! rebuilt from the primary index at load. Every mutation goes through a
//! remove-then-insert pair so an edited field never leaves a stale entry
//! behind.
//!
//! A unique bucket remembers every record projecting to its key, which can
//! be more than one after an overwriting write or a conflicting load. The
//! greatest primary key among them holds the key, so the holder depends on
//! the set of records only and never on the order they were written in.

use geocat_common::RecordKey;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Value a record is indexed under
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexKey {
    Id(u64),
    Text(String),
    Flag(bool),
    Composite(Vec<IndexKey>),
}

impl IndexKey {
    /// Index key of a record key (numeric keys index as `Id`)
    pub fn of<K: RecordKey>(key: &K) -> Self {
        key.sequence()
            .map_or_else(|| Self::Text(key.to_string()), Self::Id)
    }

    pub fn composite(parts: impl IntoIterator<Item = Self>) -> Self {
        Self::Composite(parts.into_iter().collect())
    }
}

impl From<u64> for IndexKey {
    fn from(v: u64) -> Self {
        Self::Id(v)
    }
}

impl From<&str> for IndexKey {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for IndexKey {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<bool> for IndexKey {
    fn from(v: bool) -> Self {
        Self::Flag(v)
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
            Self::Flag(v) => write!(f, "{v}"),
            Self::Composite(parts) => {
                f.write_str("(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{part}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Declaration of one secondary index of a record type.
///
/// The projection may return no key (the record stays out of the index)
/// or several (the record appears in each bucket).
pub struct IndexSpec<R> {
    pub name: &'static str,
    pub unique: bool,
    pub project: fn(&R) -> Vec<IndexKey>,
}

impl<R> IndexSpec<R> {
    /// Index mapping each key to at most one record
    pub const fn unique(name: &'static str, project: fn(&R) -> Vec<IndexKey>) -> Self {
        Self {
            name,
            unique: true,
            project,
        }
    }

    /// Index mapping each key to an ordered set of records
    pub const fn multi(name: &'static str, project: fn(&R) -> Vec<IndexKey>) -> Self {
        Self {
            name,
            unique: false,
            project,
        }
    }
}

impl<R> fmt::Debug for IndexSpec<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexSpec")
            .field("name", &self.name)
            .field("unique", &self.unique)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
enum Buckets<K> {
    Unique(BTreeMap<IndexKey, BTreeSet<K>>),
    Multi(BTreeMap<IndexKey, BTreeSet<K>>),
}

impl<K> Buckets<K> {
    fn map(&self) -> &BTreeMap<IndexKey, BTreeSet<K>> {
        match self {
            Self::Unique(map) | Self::Multi(map) => map,
        }
    }

    fn map_mut(&mut self) -> &mut BTreeMap<IndexKey, BTreeSet<K>> {
        match self {
            Self::Unique(map) | Self::Multi(map) => map,
        }
    }
}

/// A unique-index collision: `index` already maps `key` to `holder`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision<K> {
    pub index: &'static str,
    pub key: IndexKey,
    pub holder: K,
}

/// All secondary indices of one store
#[derive(Debug)]
pub struct Indexes<R, K> {
    specs: Vec<IndexSpec<R>>,
    buckets: Vec<Buckets<K>>,
}

impl<R, K: RecordKey> Indexes<R, K> {
    pub fn new(specs: Vec<IndexSpec<R>>) -> Self {
        let buckets = specs
            .iter()
            .map(|s| {
                if s.unique {
                    Buckets::Unique(BTreeMap::new())
                } else {
                    Buckets::Multi(BTreeMap::new())
                }
            })
            .collect();
        Self { specs, buckets }
    }

    /// Names of the declared indices
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.specs.iter().map(|s| s.name)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.specs.iter().position(|s| s.name == name)
    }

    /// Add every entry of `record`, stored under `pk`
    pub fn insert(&mut self, pk: &K, record: &R) {
        for (spec, buckets) in self.specs.iter().zip(self.buckets.iter_mut()) {
            let map = buckets.map_mut();
            for key in (spec.project)(record) {
                map.entry(key).or_default().insert(pk.clone());
            }
        }
    }

    /// Remove every entry `record` contributed under `pk`.
    ///
    /// A unique key shared with other records passes to the greatest of
    /// them.
    pub fn remove(&mut self, pk: &K, record: &R) {
        for (spec, buckets) in self.specs.iter().zip(self.buckets.iter_mut()) {
            let map = buckets.map_mut();
            for key in (spec.project)(record) {
                if let Some(set) = map.get_mut(&key) {
                    set.remove(pk);
                    if set.is_empty() {
                        map.remove(&key);
                    }
                }
            }
        }
    }

    /// Unique entries of `record` already held by a record other than `pk`
    pub fn collisions(&self, pk: &K, record: &R) -> Vec<Collision<K>> {
        let mut found = Vec::new();
        for (spec, buckets) in self.specs.iter().zip(self.buckets.iter()) {
            let Buckets::Unique(map) = buckets else {
                continue;
            };
            for key in (spec.project)(record) {
                if let Some(holder) = map
                    .get(&key)
                    .and_then(|set| set.iter().rev().find(|k| *k != pk))
                {
                    found.push(Collision {
                        index: spec.name,
                        key,
                        holder: holder.clone(),
                    });
                }
            }
        }
        found
    }

    /// Primary keys indexed under `key` in index `name`, ordered
    pub fn lookup(&self, name: &str, key: &IndexKey) -> Vec<K> {
        let Some(pos) = self.position(name) else {
            return Vec::new();
        };
        match &self.buckets[pos] {
            Buckets::Unique(map) => map
                .get(key)
                .and_then(|set| set.last())
                .cloned()
                .into_iter()
                .collect(),
            Buckets::Multi(map) => map
                .get(key)
                .map(|set| set.iter().cloned().collect())
                .unwrap_or_default(),
        }
    }

    /// Distinct keys present in index `name`
    pub fn keys(&self, name: &str) -> Vec<IndexKey> {
        let Some(pos) = self.position(name) else {
            return Vec::new();
        };
        self.buckets[pos].map().keys().cloned().collect()
    }

    /// Whether `pk` appears anywhere in any index
    pub fn references(&self, pk: &K) -> bool {
        self.buckets
            .iter()
            .any(|b| b.map().values().any(|set| set.contains(pk)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Item {
        name: String,
        group: Option<u64>,
        tags: Vec<String>,
    }

    fn specs() -> Vec<IndexSpec<Item>> {
        vec![
            IndexSpec::unique("name", |i: &Item| vec![IndexKey::from(i.name.as_str())]),
            IndexSpec::multi("group", |i: &Item| {
                i.group.map(IndexKey::from).into_iter().collect()
            }),
            IndexSpec::multi("tag", |i: &Item| {
                i.tags.iter().map(|t| IndexKey::from(t.as_str())).collect()
            }),
        ]
    }

    fn item(name: &str, group: Option<u64>, tags: &[&str]) -> Item {
        Item {
            name: name.into(),
            group,
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
        }
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut idx: Indexes<Item, u64> = Indexes::new(specs());
        idx.insert(&2, &item("b", Some(1), &["x"]));
        idx.insert(&1, &item("a", Some(1), &["x", "y"]));
        idx.insert(&3, &item("c", None, &[]));

        assert_eq!(idx.lookup("name", &"a".into()), vec![1]);
        assert_eq!(idx.lookup("group", &1u64.into()), vec![1, 2]);
        assert_eq!(idx.lookup("tag", &"y".into()), vec![1]);
        assert!(idx.lookup("group", &3u64.into()).is_empty());
        assert!(idx.lookup("missing", &"a".into()).is_empty());
        assert_eq!(idx.keys("group"), vec![IndexKey::Id(1)]);
    }

    #[test]
    fn test_remove_then_insert_moves_bucket() {
        let mut idx: Indexes<Item, u64> = Indexes::new(specs());
        let old = item("a", Some(1), &["x"]);
        idx.insert(&1, &old);

        let new = item("a", Some(2), &["x"]);
        idx.remove(&1, &old);
        idx.insert(&1, &new);

        assert!(idx.lookup("group", &1u64.into()).is_empty());
        assert_eq!(idx.lookup("group", &2u64.into()), vec![1]);
        assert_eq!(idx.lookup("tag", &"x".into()), vec![1]);
        assert_eq!(idx.keys("group").len(), 1);
    }

    #[test]
    fn test_remove_clears_references() {
        let mut idx: Indexes<Item, u64> = Indexes::new(specs());
        let rec = item("a", Some(1), &["x", "y"]);
        idx.insert(&1, &rec);
        assert!(idx.references(&1));

        idx.remove(&1, &rec);
        assert!(!idx.references(&1));
        assert!(idx.keys("tag").is_empty());
    }

    #[test]
    fn test_unique_remove_keeps_other_holder() {
        let mut idx: Indexes<Item, u64> = Indexes::new(specs());
        idx.insert(&1, &item("a", None, &[]));
        // Overwritten by another holder, then the first one goes away
        idx.insert(&2, &item("a", None, &[]));
        idx.remove(&1, &item("a", None, &[]));

        assert_eq!(idx.lookup("name", &"a".into()), vec![2]);
    }

    #[test]
    fn test_unique_key_passes_to_remaining_holder() {
        let mut idx: Indexes<Item, u64> = Indexes::new(specs());
        idx.insert(&1, &item("a", None, &[]));
        idx.insert(&2, &item("a", None, &[]));
        assert_eq!(idx.lookup("name", &"a".into()), vec![2]);

        idx.remove(&2, &item("a", None, &[]));
        assert_eq!(idx.lookup("name", &"a".into()), vec![1]);
        assert!(idx.references(&1));

        idx.remove(&1, &item("a", None, &[]));
        assert!(idx.keys("name").is_empty());
    }

    #[test]
    fn test_unique_holder_ignores_insert_order() {
        let mut forward: Indexes<Item, u64> = Indexes::new(specs());
        forward.insert(&1, &item("a", None, &[]));
        forward.insert(&2, &item("a", None, &[]));

        let mut backward: Indexes<Item, u64> = Indexes::new(specs());
        backward.insert(&2, &item("a", None, &[]));
        backward.insert(&1, &item("a", None, &[]));

        assert_eq!(forward.lookup("name", &"a".into()), vec![2]);
        assert_eq!(backward.lookup("name", &"a".into()), vec![2]);
    }

    #[test]
    fn test_collisions() {
        let mut idx: Indexes<Item, u64> = Indexes::new(specs());
        idx.insert(&1, &item("a", None, &[]));

        assert!(idx.collisions(&1, &item("a", Some(5), &[])).is_empty());
        let found = idx.collisions(&2, &item("a", None, &[]));
        assert_eq!(
            found,
            vec![Collision {
                index: "name",
                key: IndexKey::from("a"),
                holder: 1
            }]
        );
    }

    #[test]
    fn test_index_key_display() {
        let key = IndexKey::composite([IndexKey::Id(3), IndexKey::from("ns"), false.into()]);
        assert_eq!(key.to_string(), "(3, \"ns\", false)");
    }
}
