//! ISO/Dublin Core metadata documents attached to data, datasets or services

use super::opt_key;
use crate::codec::RecordCodec;
use crate::entity::EntityStore;
use crate::index::{IndexKey, IndexSpec};
use crate::record::Record;
use chrono::{DateTime, Utc};
use geocat_common::{DataId, DatasetId, Kind, MetadataId, ServiceKey, UserId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub id: MetadataId,
    /// File identifier of the document
    pub identifier: String,
    pub title: Option<String>,
    pub data: Option<DataId>,
    pub dataset: Option<DatasetId>,
    pub service: Option<ServiceKey>,
    pub hidden: bool,
    pub is_validated: bool,
    pub is_published: bool,
    /// `iso19139`, `dublin-core`, ...
    pub profile: Option<String>,
    /// Encoded document
    pub content: String,
    pub owner: Option<UserId>,
    pub date_stamp: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl MetadataRecord {
    pub const BY_IDENTIFIER: &'static str = "identifier";
    pub const BY_DATA: &'static str = "data";
    pub const BY_DATASET: &'static str = "dataset";
    pub const BY_SERVICE: &'static str = "service";
    pub const BY_HIDDEN: &'static str = "hidden";

    pub fn new(identifier: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: MetadataId::default(),
            identifier: identifier.into(),
            title: None,
            data: None,
            dataset: None,
            service: None,
            hidden: false,
            is_validated: false,
            is_published: false,
            profile: None,
            content: content.into(),
            owner: None,
            date_stamp: None,
            created_at: Utc::now(),
        }
    }
}

impl Record for MetadataRecord {
    type Key = MetadataId;
    const KIND: Kind = Kind::Metadata;

    fn key(&self) -> MetadataId {
        self.id
    }

    fn set_key(&mut self, key: MetadataId) {
        self.id = key;
    }

    fn indexes() -> Vec<IndexSpec<Self>> {
        vec![
            IndexSpec::unique(Self::BY_IDENTIFIER, |m: &Self| {
                vec![IndexKey::from(m.identifier.as_str())]
            }),
            IndexSpec::multi(Self::BY_DATA, |m: &Self| opt_key(m.data.as_ref())),
            IndexSpec::multi(Self::BY_DATASET, |m: &Self| opt_key(m.dataset.as_ref())),
            IndexSpec::multi(Self::BY_SERVICE, |m: &Self| {
                m.service
                    .iter()
                    .map(|s| IndexKey::from(s.to_string()))
                    .collect()
            }),
            IndexSpec::multi(Self::BY_HIDDEN, |m: &Self| vec![IndexKey::from(m.hidden)]),
        ]
    }
}

impl<C: RecordCodec> EntityStore<MetadataRecord, C> {
    pub fn find_by_identifier(&self, identifier: &str) -> Option<MetadataRecord> {
        self.find_one(MetadataRecord::BY_IDENTIFIER, &identifier.into())
    }

    pub fn find_by_data(&self, data: DataId) -> Vec<MetadataRecord> {
        self.find_many(MetadataRecord::BY_DATA, &IndexKey::of(&data))
    }

    pub fn find_by_dataset(&self, dataset: DatasetId) -> Vec<MetadataRecord> {
        self.find_many(MetadataRecord::BY_DATASET, &IndexKey::of(&dataset))
    }

    pub fn find_by_service(&self, service: &ServiceKey) -> Vec<MetadataRecord> {
        self.find_many(MetadataRecord::BY_SERVICE, &service.to_string().into())
    }

    pub fn find_visible(&self) -> Vec<MetadataRecord> {
        self.find_many(MetadataRecord::BY_HIDDEN, &false.into())
    }
}
