//! Record definitions of every numeric and string-keyed kind
//!
//! Each module declares the record struct, the secondary indices kept for
//! it, and typed lookups on its [`EntityStore`](crate::EntityStore).

pub mod attachment;
pub mod data;
pub mod dataset;
pub mod layer;
pub mod metadata;
pub mod provider;
pub mod sensor;
pub mod style;
pub mod task;
pub mod task_parameter;
pub mod user;

pub use attachment::Attachment;
pub use data::Data;
pub use dataset::Dataset;
pub use layer::Layer;
pub use metadata::MetadataRecord;
pub use provider::Provider;
pub use sensor::Sensor;
pub use style::Style;
pub use task::{Task, TaskState};
pub use task_parameter::TaskParameter;
pub use user::User;

use crate::index::IndexKey;
use geocat_common::RecordKey;

/// Index keys of an optional reference: none when unset
pub(crate) fn opt_key<K: RecordKey>(key: Option<&K>) -> Vec<IndexKey> {
    key.map(IndexKey::of).into_iter().collect()
}

/// Index keys of an optional text field: none when unset or empty
pub(crate) fn opt_text(value: Option<&str>) -> Vec<IndexKey> {
    value
        .filter(|v| !v.is_empty())
        .map(IndexKey::from)
        .into_iter()
        .collect()
}
