//! Saved process parameters that task runs are started from

use super::opt_text;
use crate::codec::RecordCodec;
use crate::entity::EntityStore;
use crate::index::{IndexKey, IndexSpec};
use crate::record::Record;
use chrono::{DateTime, Utc};
use geocat_common::{Kind, TaskParameterId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskParameter {
    pub id: TaskParameterId,
    pub name: String,
    /// Process registry the process belongs to
    pub process_authority: String,
    pub process_code: String,
    /// Encoded process inputs
    pub inputs: String,
    /// `CRON`, `FOLDER`, `NONE`, ...
    pub trigger_type: Option<String>,
    pub trigger: Option<String>,
    pub owner: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl TaskParameter {
    pub const BY_PROCESS: &'static str = "process";
    pub const BY_NAME: &'static str = "name";
    pub const BY_TRIGGER_TYPE: &'static str = "trigger_type";

    pub fn new(
        name: impl Into<String>,
        process_authority: impl Into<String>,
        process_code: impl Into<String>,
    ) -> Self {
        Self {
            id: TaskParameterId::default(),
            name: name.into(),
            process_authority: process_authority.into(),
            process_code: process_code.into(),
            inputs: String::new(),
            trigger_type: None,
            trigger: None,
            owner: None,
            created_at: Utc::now(),
        }
    }

    fn process_key(authority: &str, code: &str) -> IndexKey {
        IndexKey::composite([IndexKey::from(authority), IndexKey::from(code)])
    }
}

impl Record for TaskParameter {
    type Key = TaskParameterId;
    const KIND: Kind = Kind::TaskParameters;

    fn key(&self) -> TaskParameterId {
        self.id
    }

    fn set_key(&mut self, key: TaskParameterId) {
        self.id = key;
    }

    fn indexes() -> Vec<IndexSpec<Self>> {
        vec![
            IndexSpec::multi(Self::BY_PROCESS, |p: &Self| {
                vec![Self::process_key(&p.process_authority, &p.process_code)]
            }),
            IndexSpec::multi(Self::BY_NAME, |p: &Self| vec![IndexKey::from(p.name.as_str())]),
            IndexSpec::multi(Self::BY_TRIGGER_TYPE, |p: &Self| {
                opt_text(p.trigger_type.as_deref())
            }),
        ]
    }
}

impl<C: RecordCodec> EntityStore<TaskParameter, C> {
    pub fn find_by_process(&self, authority: &str, code: &str) -> Vec<TaskParameter> {
        self.find_many(
            TaskParameter::BY_PROCESS,
            &TaskParameter::process_key(authority, code),
        )
    }

    pub fn find_by_name(&self, name: &str) -> Vec<TaskParameter> {
        self.find_many(TaskParameter::BY_NAME, &name.into())
    }

    pub fn find_by_trigger_type(&self, trigger_type: &str) -> Vec<TaskParameter> {
        self.find_many(TaskParameter::BY_TRIGGER_TYPE, &trigger_type.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::JsonCodec;
    use crate::entity::StoreOptions;
    use tempfile::tempdir;

    #[test]
    fn test_process_index() {
        let dir = tempdir().unwrap();
        let store: EntityStore<TaskParameter> =
            EntityStore::new(dir.path(), JsonCodec, StoreOptions::default());
        store.load().unwrap();

        let mut nightly = TaskParameter::new("nightly", "geotoolkit", "coverage:pyramid");
        nightly.trigger_type = Some("CRON".into());
        let nightly = store.create(nightly).unwrap();
        store
            .create(TaskParameter::new("manual", "geotoolkit", "coverage:pyramid"))
            .unwrap();
        store
            .create(TaskParameter::new("other", "geotoolkit", "vector:buffer"))
            .unwrap();

        assert_eq!(store.find_by_process("geotoolkit", "coverage:pyramid").len(), 2);
        assert!(store.find_by_process("other", "coverage:pyramid").is_empty());
        let cron: Vec<TaskParameterId> =
            store.find_by_trigger_type("CRON").iter().map(|p| p.id).collect();
        assert_eq!(cron, vec![nightly]);
    }
}
