//! Core type definitions for Geocat
//!
//! This module defines the record kinds with their directory names and the
//! key types records are stored under.

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use uuid::Uuid;

/// Directory holding the sensor/data association files
pub const SENSOR_X_DATA: &str = "sensor_x_data";

/// Flat key/value property file at the catalog root
pub const PROPERTIES_FILE: &str = "config.properties";

/// Category of records, backed by one directory and one store
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Attachments,
    Providers,
    Datasets,
    Data,
    Sensors,
    Styles,
    Layers,
    Metadata,
    Users,
    Services,
    Tasks,
    TaskParameters,
}

impl Kind {
    /// Every kind, in catalog load order
    pub const ALL: [Self; 12] = [
        Self::Attachments,
        Self::Providers,
        Self::Datasets,
        Self::Data,
        Self::Sensors,
        Self::Styles,
        Self::Layers,
        Self::Metadata,
        Self::Users,
        Self::Services,
        Self::Tasks,
        Self::TaskParameters,
    ];

    /// Directory name of the kind under the catalog root.
    ///
    /// Services have no single directory: each service type owns a
    /// top-level folder (see [`ServiceType::dir_name`]).
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Attachments => "attachments",
            Self::Providers => "providers",
            Self::Datasets => "datasets",
            Self::Data => "datas",
            Self::Sensors => "sensors",
            Self::Styles => "styles",
            Self::Layers => "layers",
            Self::Metadata => "metadatas",
            Self::Users => "users",
            Self::Services => "services",
            Self::Tasks => "tasks",
            Self::TaskParameters => "task_params",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// OGC service flavours a catalog can hold configuration for
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Wms,
    Wmts,
    Wfs,
    Wcs,
    Wps,
    Sos,
    Sts,
    Csw,
    Thw,
}

impl ServiceType {
    pub const ALL: [Self; 9] = [
        Self::Wms,
        Self::Wmts,
        Self::Wfs,
        Self::Wcs,
        Self::Wps,
        Self::Sos,
        Self::Sts,
        Self::Csw,
        Self::Thw,
    ];

    /// Top-level folder holding every service of this type
    #[must_use]
    pub const fn dir_name(self) -> &'static str {
        match self {
            Self::Wms => "wms",
            Self::Wmts => "wmts",
            Self::Wfs => "wfs",
            Self::Wcs => "wcs",
            Self::Wps => "wps",
            Self::Sos => "sos",
            Self::Sts => "sts",
            Self::Csw => "csw",
            Self::Thw => "thw",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for ServiceType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.dir_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown service type: {s}"))
    }
}

/// Identity of a service: its type plus its identifier within that type
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display)]
#[display("{service_type}:{identifier}")]
pub struct ServiceKey {
    pub service_type: ServiceType,
    pub identifier: String,
}

impl ServiceKey {
    #[must_use]
    pub fn new(service_type: ServiceType, identifier: impl Into<String>) -> Self {
        Self {
            service_type,
            identifier: identifier.into(),
        }
    }
}

/// Primary key of a stored record.
///
/// The `Display` form is the file stem the record is stored under, and
/// `parse_key` must accept exactly what `Display` produces.
pub trait RecordKey:
    Clone + Ord + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Parse a key from a file stem
    fn parse_key(s: &str) -> Option<Self>;

    /// Numeric value for allocator-driven keys
    fn sequence(&self) -> Option<u64>;

    /// Build a key from an allocated value, `None` for caller-assigned keys
    fn from_sequence(seq: u64) -> Option<Self>;
}

impl RecordKey for u64 {
    fn parse_key(s: &str) -> Option<Self> {
        s.parse().ok()
    }

    fn sequence(&self) -> Option<u64> {
        Some(*self)
    }

    fn from_sequence(seq: u64) -> Option<Self> {
        Some(seq)
    }
}

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
            Serialize, Deserialize, Display, From, Into,
        )]
        #[display("{_0}")]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl RecordKey for $name {
            fn parse_key(s: &str) -> Option<Self> {
                s.parse::<u64>().ok().map(Self)
            }

            fn sequence(&self) -> Option<u64> {
                Some(self.0)
            }

            fn from_sequence(seq: u64) -> Option<Self> {
                Some(Self(seq))
            }
        }
    };
}

numeric_id!(
    /// Identifier of an attachment record
    AttachmentId
);
numeric_id!(
    /// Identifier of a data provider
    ProviderId
);
numeric_id!(
    /// Identifier of a dataset
    DatasetId
);
numeric_id!(
    /// Identifier of a data record
    DataId
);
numeric_id!(
    /// Identifier of a sensor
    SensorId
);
numeric_id!(StyleId);
numeric_id!(LayerId);
numeric_id!(
    /// Identifier of a metadata record
    MetadataId
);
numeric_id!(UserId);
numeric_id!(TaskParameterId);

/// Caller-assigned identifier of a task
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display)]
#[display("{_0}")]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Wrap an identifier, rejecting values that cannot be used as a file name
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        is_file_stem(&id).then_some(Self(id))
    }

    /// Generate a fresh random identifier
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl RecordKey for TaskId {
    fn parse_key(s: &str) -> Option<Self> {
        Self::new(s)
    }

    fn sequence(&self) -> Option<u64> {
        None
    }

    fn from_sequence(_seq: u64) -> Option<Self> {
        None
    }
}

/// Whether `s` can be used verbatim as a file stem inside a kind directory
#[must_use]
pub fn is_file_stem(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('.')
        && !s.contains(['/', '\\', '\0'])
        && s.len() <= 200
}
