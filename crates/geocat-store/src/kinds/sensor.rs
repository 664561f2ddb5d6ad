//! Sensor descriptions (SensorML systems and components)

use super::{opt_key, opt_text};
use crate::codec::RecordCodec;
use crate::entity::EntityStore;
use crate::index::{IndexKey, IndexSpec};
use crate::record::Record;
use chrono::{DateTime, Utc};
use geocat_common::{Kind, ProviderId, SensorId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sensor {
    pub id: SensorId,
    pub identifier: String,
    /// `System`, `Component`, ...
    pub sensor_type: String,
    /// Identifier of the enclosing system
    pub parent: Option<String>,
    pub provider: Option<ProviderId>,
    pub profile: Option<String>,
    pub om_type: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub owner: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Sensor {
    pub const BY_IDENTIFIER: &'static str = "identifier";
    pub const BY_PARENT: &'static str = "parent";
    pub const BY_PROVIDER: &'static str = "provider";
    pub const BY_TYPE: &'static str = "type";

    pub fn new(identifier: impl Into<String>, sensor_type: impl Into<String>) -> Self {
        Self {
            id: SensorId::default(),
            identifier: identifier.into(),
            sensor_type: sensor_type.into(),
            parent: None,
            provider: None,
            profile: None,
            om_type: None,
            name: None,
            description: None,
            owner: None,
            created_at: Utc::now(),
        }
    }
}

impl Record for Sensor {
    type Key = SensorId;
    const KIND: Kind = Kind::Sensors;

    fn key(&self) -> SensorId {
        self.id
    }

    fn set_key(&mut self, key: SensorId) {
        self.id = key;
    }

    fn indexes() -> Vec<IndexSpec<Self>> {
        vec![
            IndexSpec::unique(Self::BY_IDENTIFIER, |s: &Self| {
                vec![IndexKey::from(s.identifier.as_str())]
            }),
            IndexSpec::multi(Self::BY_PARENT, |s: &Self| opt_text(s.parent.as_deref())),
            IndexSpec::multi(Self::BY_PROVIDER, |s: &Self| opt_key(s.provider.as_ref())),
            IndexSpec::multi(Self::BY_TYPE, |s: &Self| {
                vec![IndexKey::from(s.sensor_type.as_str())]
            }),
        ]
    }
}

impl<C: RecordCodec> EntityStore<Sensor, C> {
    pub fn find_by_identifier(&self, identifier: &str) -> Option<Sensor> {
        self.find_one(Sensor::BY_IDENTIFIER, &identifier.into())
    }

    /// Direct children of the system `identifier`
    pub fn children_of(&self, identifier: &str) -> Vec<Sensor> {
        self.find_many(Sensor::BY_PARENT, &identifier.into())
    }

    pub fn find_by_provider(&self, provider: ProviderId) -> Vec<Sensor> {
        self.find_many(Sensor::BY_PROVIDER, &IndexKey::of(&provider))
    }

    pub fn find_by_type(&self, sensor_type: &str) -> Vec<Sensor> {
        self.find_many(Sensor::BY_TYPE, &sensor_type.into())
    }
}
