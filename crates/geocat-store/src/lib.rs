//! Geocat Store - filesystem-backed indexed record store
//!
//! Every record kind of the catalog lives in its own directory, one file
//! per record. Stores load their directory once, keep the records and
//! their secondary indices in memory, and write through to disk on every
//! mutation.
//!
//! # Layout
//!
//! ```text
//! <root>/
//! ├── config.properties
//! ├── providers/<id>.json
//! ├── datas/<id>.json
//! ├── sensors/<id>.json        (+ .sequence high-water mark per kind)
//! ├── sensor_x_data/<dataId>.json
//! ├── tasks/<identifier>.json
//! └── wms/<identifier>/service.json, extras/, i18n/
//! ```

pub mod allocator;
pub mod catalog;
pub mod codec;
pub mod entity;
mod fsio;
pub mod index;
pub mod kinds;
pub mod link;
pub mod properties;
pub mod record;
pub mod report;
pub mod resolver;
pub mod service;

pub use allocator::IdAllocator;
pub use catalog::Catalog;
pub use codec::{AnyCodec, BincodeCodec, JsonCodec, RecordCodec};
pub use entity::{EntityStore, StoreOptions};
pub use index::{IndexKey, IndexSpec};
pub use kinds::{
    Attachment, Data, Dataset, Layer, MetadataRecord, Provider, Sensor, Style, Task, TaskParameter,
    TaskState, User,
};
pub use link::LinkTable;
pub use properties::PropertyFile;
pub use record::Record;
pub use report::{CatalogLoadReport, LoadDiagnostic, LoadReport};
pub use resolver::{FsPathResolver, PathResolver};
pub use service::{Service, ServiceDetails, ServiceStatus, ServiceStore};
