//! Layers publish one data record through one service

use crate::codec::RecordCodec;
use crate::entity::EntityStore;
use crate::index::{IndexKey, IndexSpec};
use crate::record::Record;
use chrono::{DateTime, Utc};
use geocat_common::{DataId, Kind, LayerId, ServiceKey, StyleId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub namespace: String,
    /// Alias the layer is published under, if not its name
    pub alias: Option<String>,
    pub service: ServiceKey,
    pub data: DataId,
    pub title: Option<String>,
    pub styles: Vec<StyleId>,
    pub owner: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Layer {
    pub const BY_QUALIFIED_NAME: &'static str = "qualified_name";
    pub const BY_SERVICE: &'static str = "service";
    pub const BY_DATA: &'static str = "data";

    pub fn new(service: ServiceKey, data: DataId, name: impl Into<String>) -> Self {
        Self {
            id: LayerId::default(),
            name: name.into(),
            namespace: String::new(),
            alias: None,
            service,
            data,
            title: None,
            styles: Vec::new(),
            owner: None,
            created_at: Utc::now(),
        }
    }

    fn service_key(service: &ServiceKey) -> IndexKey {
        IndexKey::from(service.to_string())
    }

    /// Key of the `qualified_name` index
    pub fn qualified_name(service: &ServiceKey, namespace: &str, name: &str) -> IndexKey {
        IndexKey::composite([
            Self::service_key(service),
            IndexKey::from(namespace),
            IndexKey::from(name),
        ])
    }
}

impl Record for Layer {
    type Key = LayerId;
    const KIND: Kind = Kind::Layers;

    fn key(&self) -> LayerId {
        self.id
    }

    fn set_key(&mut self, key: LayerId) {
        self.id = key;
    }

    fn indexes() -> Vec<IndexSpec<Self>> {
        vec![
            IndexSpec::unique(Self::BY_QUALIFIED_NAME, |l: &Self| {
                vec![Self::qualified_name(&l.service, &l.namespace, &l.name)]
            }),
            IndexSpec::multi(Self::BY_SERVICE, |l: &Self| vec![Self::service_key(&l.service)]),
            IndexSpec::multi(Self::BY_DATA, |l: &Self| vec![IndexKey::of(&l.data)]),
        ]
    }
}

impl<C: RecordCodec> EntityStore<Layer, C> {
    pub fn find_by_qualified_name(
        &self,
        service: &ServiceKey,
        namespace: &str,
        name: &str,
    ) -> Option<Layer> {
        self.find_one(
            Layer::BY_QUALIFIED_NAME,
            &Layer::qualified_name(service, namespace, name),
        )
    }

    pub fn find_by_service(&self, service: &ServiceKey) -> Vec<Layer> {
        self.find_many(Layer::BY_SERVICE, &Layer::service_key(service))
    }

    pub fn find_by_data(&self, data: DataId) -> Vec<Layer> {
        self.find_many(Layer::BY_DATA, &IndexKey::of(&data))
    }

    /// Delete every layer publishing `data`
    pub fn delete_by_data(&self, data: DataId) -> geocat_common::Result<usize> {
        self.delete_where(Layer::BY_DATA, &IndexKey::of(&data))
    }

    /// Delete every layer of `service`
    pub fn delete_by_service(&self, service: &ServiceKey) -> geocat_common::Result<usize> {
        self.delete_where(Layer::BY_SERVICE, &Layer::service_key(service))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::JsonCodec;
    use crate::entity::StoreOptions;
    use geocat_common::ServiceType;
    use tempfile::tempdir;

    #[test]
    fn test_layers_by_service_and_data() {
        let dir = tempdir().unwrap();
        let store: EntityStore<Layer> =
            EntityStore::new(dir.path(), JsonCodec, StoreOptions::default());
        store.load().unwrap();

        let wms = ServiceKey::new(ServiceType::Wms, "default");
        let wfs = ServiceKey::new(ServiceType::Wfs, "default");
        store.create(Layer::new(wms.clone(), DataId(1), "roads")).unwrap();
        store.create(Layer::new(wfs.clone(), DataId(1), "roads")).unwrap();
        store.create(Layer::new(wms.clone(), DataId(2), "rivers")).unwrap();

        assert_eq!(store.find_by_service(&wms).len(), 2);
        assert_eq!(store.find_by_data(DataId(1)).len(), 2);
        assert!(store.find_by_qualified_name(&wfs, "", "roads").is_some());
        assert!(store.find_by_qualified_name(&wfs, "", "rivers").is_none());

        assert_eq!(store.delete_by_data(DataId(1)).unwrap(), 2);
        assert_eq!(store.len(), 1);
        assert!(store.find_by_service(&wfs).is_empty());
    }
}
