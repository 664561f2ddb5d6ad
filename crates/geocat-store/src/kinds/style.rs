//! Map styles, named within their style provider

use crate::codec::RecordCodec;
use crate::entity::EntityStore;
use crate::index::{IndexKey, IndexSpec};
use crate::record::Record;
use chrono::{DateTime, Utc};
use geocat_common::{Kind, ProviderId, StyleId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Style {
    pub id: StyleId,
    pub name: String,
    pub provider: ProviderId,
    /// `VECTOR` or `COVERAGE`
    pub style_type: String,
    /// Encoded style body (SLD/SE document)
    pub body: String,
    pub is_shared: bool,
    pub owner: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Style {
    pub const BY_NAME: &'static str = "name";
    pub const BY_PROVIDER: &'static str = "provider";
    pub const BY_TYPE: &'static str = "type";

    pub fn new(provider: ProviderId, name: impl Into<String>, style_type: impl Into<String>) -> Self {
        Self {
            id: StyleId::default(),
            name: name.into(),
            provider,
            style_type: style_type.into(),
            body: String::new(),
            is_shared: false,
            owner: None,
            created_at: Utc::now(),
        }
    }

    fn name_key(provider: ProviderId, name: &str) -> IndexKey {
        IndexKey::composite([IndexKey::of(&provider), IndexKey::from(name)])
    }
}

impl Record for Style {
    type Key = StyleId;
    const KIND: Kind = Kind::Styles;

    fn key(&self) -> StyleId {
        self.id
    }

    fn set_key(&mut self, key: StyleId) {
        self.id = key;
    }

    fn indexes() -> Vec<IndexSpec<Self>> {
        vec![
            IndexSpec::unique(Self::BY_NAME, |s: &Self| {
                vec![Self::name_key(s.provider, &s.name)]
            }),
            IndexSpec::multi(Self::BY_PROVIDER, |s: &Self| vec![IndexKey::of(&s.provider)]),
            IndexSpec::multi(Self::BY_TYPE, |s: &Self| {
                vec![IndexKey::from(s.style_type.as_str())]
            }),
        ]
    }
}

impl<C: RecordCodec> EntityStore<Style, C> {
    pub fn find_by_name(&self, provider: ProviderId, name: &str) -> Option<Style> {
        self.find_one(Style::BY_NAME, &Style::name_key(provider, name))
    }

    pub fn find_by_provider(&self, provider: ProviderId) -> Vec<Style> {
        self.find_many(Style::BY_PROVIDER, &IndexKey::of(&provider))
    }

    pub fn find_by_type(&self, style_type: &str) -> Vec<Style> {
        self.find_many(Style::BY_TYPE, &style_type.into())
    }
}
