//! Binary attachments (thumbnails, quicklooks) referenced by metadata

use super::{opt_key, opt_text};
use crate::codec::RecordCodec;
use crate::entity::EntityStore;
use crate::index::{IndexKey, IndexSpec};
use crate::record::Record;
use geocat_common::{AttachmentId, Kind, MetadataId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: AttachmentId,
    pub filename: Option<String>,
    /// Remote location when the content is not stored inline
    pub uri: Option<String>,
    pub content: Vec<u8>,
    pub metadata: Option<MetadataId>,
}

impl Attachment {
    pub const BY_FILENAME: &'static str = "filename";
    pub const BY_METADATA: &'static str = "metadata";

    pub fn new(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            id: AttachmentId::default(),
            filename: Some(filename.into()),
            uri: None,
            content,
            metadata: None,
        }
    }
}

impl Record for Attachment {
    type Key = AttachmentId;
    const KIND: Kind = Kind::Attachments;

    fn key(&self) -> AttachmentId {
        self.id
    }

    fn set_key(&mut self, key: AttachmentId) {
        self.id = key;
    }

    fn indexes() -> Vec<IndexSpec<Self>> {
        vec![
            IndexSpec::multi(Self::BY_FILENAME, |a: &Self| {
                opt_text(a.filename.as_deref())
            }),
            IndexSpec::multi(Self::BY_METADATA, |a: &Self| opt_key(a.metadata.as_ref())),
        ]
    }
}

impl<C: RecordCodec> EntityStore<Attachment, C> {
    pub fn find_by_filename(&self, filename: &str) -> Vec<Attachment> {
        self.find_many(Attachment::BY_FILENAME, &filename.into())
    }

    pub fn find_by_metadata(&self, metadata: MetadataId) -> Vec<Attachment> {
        self.find_many(Attachment::BY_METADATA, &IndexKey::of(&metadata))
    }
}
