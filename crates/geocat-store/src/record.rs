//! The record contract every stored kind implements

use crate::index::IndexSpec;
use geocat_common::{Kind, RecordKey};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A typed, persisted entity of one kind
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Primary key type
    type Key: RecordKey;

    /// Kind (and thereby directory) the record belongs to
    const KIND: Kind;

    /// Current primary key. For allocator-driven kinds this is meaningless
    /// until the record has been created.
    fn key(&self) -> Self::Key;

    /// Store the key assigned at creation
    fn set_key(&mut self, key: Self::Key);

    /// Secondary indices maintained for this kind
    fn indexes() -> Vec<IndexSpec<Self>> {
        Vec::new()
    }
}
