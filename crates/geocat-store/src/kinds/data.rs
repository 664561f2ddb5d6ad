//! Data records: one layer-able resource exposed by a provider
//!
//! A data record is identified within its provider by `(namespace, name)`;
//! the triple `(provider, namespace, name)` is unique across the catalog.

use super::opt_key;
use crate::codec::RecordCodec;
use crate::entity::EntityStore;
use crate::index::{IndexKey, IndexSpec};
use crate::record::Record;
use chrono::{DateTime, Utc};
use geocat_common::{DataId, DatasetId, Kind, ProviderId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Data {
    pub id: DataId,
    pub name: String,
    /// Empty when the data has no namespace
    pub namespace: String,
    pub provider: ProviderId,
    pub dataset: Option<DatasetId>,
    /// `VECTOR`, `COVERAGE`, `SENSOR`, ...
    pub data_type: String,
    pub subtype: Option<String>,
    /// Hidden data are not listed to end users
    pub hidden: bool,
    /// Included data are part of the published catalog
    pub included: bool,
    pub sensorable: bool,
    pub rendered: Option<bool>,
    pub owner: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Data {
    pub const BY_QUALIFIED_NAME: &'static str = "qualified_name";
    pub const BY_NAME: &'static str = "name";
    pub const BY_PROVIDER: &'static str = "provider";
    pub const BY_DATASET: &'static str = "dataset";
    pub const BY_HIDDEN: &'static str = "hidden";
    pub const BY_INCLUDED: &'static str = "included";

    pub fn new(provider: ProviderId, name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            id: DataId::default(),
            name: name.into(),
            namespace: String::new(),
            provider,
            dataset: None,
            data_type: data_type.into(),
            subtype: None,
            hidden: false,
            included: true,
            sensorable: false,
            rendered: None,
            owner: None,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    #[must_use]
    pub fn with_dataset(mut self, dataset: DatasetId) -> Self {
        self.dataset = Some(dataset);
        self
    }

    /// Key of the `qualified_name` index
    pub fn qualified_name(provider: ProviderId, namespace: &str, name: &str) -> IndexKey {
        IndexKey::composite([
            IndexKey::of(&provider),
            IndexKey::from(namespace),
            IndexKey::from(name),
        ])
    }
}

impl Record for Data {
    type Key = DataId;
    const KIND: Kind = Kind::Data;

    fn key(&self) -> DataId {
        self.id
    }

    fn set_key(&mut self, key: DataId) {
        self.id = key;
    }

    fn indexes() -> Vec<IndexSpec<Self>> {
        vec![
            IndexSpec::unique(Self::BY_QUALIFIED_NAME, |d: &Self| {
                vec![Self::qualified_name(d.provider, &d.namespace, &d.name)]
            }),
            IndexSpec::multi(Self::BY_NAME, |d: &Self| vec![IndexKey::from(d.name.as_str())]),
            IndexSpec::multi(Self::BY_PROVIDER, |d: &Self| vec![IndexKey::of(&d.provider)]),
            IndexSpec::multi(Self::BY_DATASET, |d: &Self| opt_key(d.dataset.as_ref())),
            IndexSpec::multi(Self::BY_HIDDEN, |d: &Self| vec![IndexKey::from(d.hidden)]),
            IndexSpec::multi(Self::BY_INCLUDED, |d: &Self| vec![IndexKey::from(d.included)]),
        ]
    }
}

impl<C: RecordCodec> EntityStore<Data, C> {
    pub fn find_by_qualified_name(
        &self,
        provider: ProviderId,
        namespace: &str,
        name: &str,
    ) -> Option<Data> {
        self.find_one(
            Data::BY_QUALIFIED_NAME,
            &Data::qualified_name(provider, namespace, name),
        )
    }

    /// Every data called `name`, whatever its provider or namespace
    pub fn find_by_name(&self, name: &str) -> Vec<Data> {
        self.find_many(Data::BY_NAME, &name.into())
    }

    pub fn find_by_provider(&self, provider: ProviderId) -> Vec<Data> {
        self.find_many(Data::BY_PROVIDER, &IndexKey::of(&provider))
    }

    pub fn find_by_dataset(&self, dataset: DatasetId) -> Vec<Data> {
        self.find_many(Data::BY_DATASET, &IndexKey::of(&dataset))
    }

    /// Data that are neither hidden nor excluded
    pub fn find_visible(&self) -> Vec<Data> {
        self.find_many(Data::BY_HIDDEN, &false.into())
            .into_iter()
            .filter(|d| d.included)
            .collect()
    }

    pub fn ids_by_provider(&self, provider: ProviderId) -> Vec<DataId> {
        self.keys_of(Data::BY_PROVIDER, &IndexKey::of(&provider))
    }
}
