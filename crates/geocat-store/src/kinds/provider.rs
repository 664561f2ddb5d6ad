//! Data providers: the configured sources data records are read from

use super::{opt_key, opt_text};
use crate::codec::RecordCodec;
use crate::entity::EntityStore;
use crate::index::{IndexKey, IndexSpec};
use crate::record::Record;
use chrono::{DateTime, Utc};
use geocat_common::{Kind, ProviderId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub id: ProviderId,
    /// Unique, human-chosen identifier
    pub identifier: String,
    /// Identifier of the parent provider, for aggregated sources
    pub parent: Option<String>,
    /// Implementation name of the provider factory
    pub impl_name: String,
    /// Provider category (`data`, `sensor`, `style`, ...)
    pub provider_type: String,
    /// Opaque provider configuration
    pub config: String,
    pub owner: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Provider {
    pub const BY_IDENTIFIER: &'static str = "identifier";
    pub const BY_PARENT: &'static str = "parent";
    pub const BY_OWNER: &'static str = "owner";
    pub const BY_IMPL: &'static str = "impl";

    pub fn new(identifier: impl Into<String>, impl_name: impl Into<String>) -> Self {
        Self {
            id: ProviderId::default(),
            identifier: identifier.into(),
            parent: None,
            impl_name: impl_name.into(),
            provider_type: "data".to_string(),
            config: String::new(),
            owner: None,
            created_at: Utc::now(),
        }
    }
}

impl Record for Provider {
    type Key = ProviderId;
    const KIND: Kind = Kind::Providers;

    fn key(&self) -> ProviderId {
        self.id
    }

    fn set_key(&mut self, key: ProviderId) {
        self.id = key;
    }

    fn indexes() -> Vec<IndexSpec<Self>> {
        vec![
            IndexSpec::unique(Self::BY_IDENTIFIER, |p: &Self| {
                vec![IndexKey::from(p.identifier.as_str())]
            }),
            IndexSpec::multi(Self::BY_PARENT, |p: &Self| opt_text(p.parent.as_deref())),
            IndexSpec::multi(Self::BY_OWNER, |p: &Self| opt_key(p.owner.as_ref())),
            IndexSpec::multi(Self::BY_IMPL, |p: &Self| {
                vec![IndexKey::from(p.impl_name.as_str())]
            }),
        ]
    }
}

impl<C: RecordCodec> EntityStore<Provider, C> {
    pub fn find_by_identifier(&self, identifier: &str) -> Option<Provider> {
        self.find_one(Provider::BY_IDENTIFIER, &identifier.into())
    }

    /// Providers whose parent is `identifier`
    pub fn children_of(&self, identifier: &str) -> Vec<Provider> {
        self.find_many(Provider::BY_PARENT, &identifier.into())
    }

    pub fn find_by_owner(&self, owner: UserId) -> Vec<Provider> {
        self.find_many(Provider::BY_OWNER, &IndexKey::of(&owner))
    }

    pub fn find_by_impl(&self, impl_name: &str) -> Vec<Provider> {
        self.find_many(Provider::BY_IMPL, &impl_name.into())
    }
}
