//! Datasets group data records under one identifier

use super::opt_key;
use crate::codec::RecordCodec;
use crate::entity::EntityStore;
use crate::index::{IndexKey, IndexSpec};
use crate::record::Record;
use chrono::{DateTime, Utc};
use geocat_common::{DatasetId, Kind, UserId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: DatasetId,
    pub identifier: String,
    pub dataset_type: Option<String>,
    pub owner: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Dataset {
    pub const BY_IDENTIFIER: &'static str = "identifier";
    pub const BY_OWNER: &'static str = "owner";

    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            id: DatasetId::default(),
            identifier: identifier.into(),
            dataset_type: None,
            owner: None,
            created_at: Utc::now(),
        }
    }
}

impl Record for Dataset {
    type Key = DatasetId;
    const KIND: Kind = Kind::Datasets;

    fn key(&self) -> DatasetId {
        self.id
    }

    fn set_key(&mut self, key: DatasetId) {
        self.id = key;
    }

    fn indexes() -> Vec<IndexSpec<Self>> {
        vec![
            IndexSpec::unique(Self::BY_IDENTIFIER, |d: &Self| {
                vec![IndexKey::from(d.identifier.as_str())]
            }),
            IndexSpec::multi(Self::BY_OWNER, |d: &Self| opt_key(d.owner.as_ref())),
        ]
    }
}

impl<C: RecordCodec> EntityStore<Dataset, C> {
    pub fn find_by_identifier(&self, identifier: &str) -> Option<Dataset> {
        self.find_one(Dataset::BY_IDENTIFIER, &identifier.into())
    }

    pub fn find_by_owner(&self, owner: UserId) -> Vec<Dataset> {
        self.find_many(Dataset::BY_OWNER, &IndexKey::of(&owner))
    }
}
