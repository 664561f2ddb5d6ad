//! Catalog users and their roles

use crate::codec::RecordCodec;
use crate::entity::EntityStore;
use crate::index::{IndexKey, IndexSpec};
use crate::record::Record;
use chrono::{DateTime, Utc};
use geocat_common::{Kind, UserId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub login: String,
    pub email: String,
    /// Password hash; never the clear text
    pub password: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub active: bool,
    pub roles: Vec<String>,
    pub locale: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub const BY_LOGIN: &'static str = "login";
    pub const BY_EMAIL: &'static str = "email";
    pub const BY_ROLE: &'static str = "role";

    pub fn new(login: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: UserId::default(),
            login: login.into(),
            email: email.into(),
            password: String::new(),
            firstname: None,
            lastname: None,
            active: true,
            roles: Vec::new(),
            locale: "en".to_string(),
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

impl Record for User {
    type Key = UserId;
    const KIND: Kind = Kind::Users;

    fn key(&self) -> UserId {
        self.id
    }

    fn set_key(&mut self, key: UserId) {
        self.id = key;
    }

    fn indexes() -> Vec<IndexSpec<Self>> {
        vec![
            IndexSpec::unique(Self::BY_LOGIN, |u: &Self| vec![IndexKey::from(u.login.as_str())]),
            // Emails compare case-insensitively
            IndexSpec::unique(Self::BY_EMAIL, |u: &Self| {
                vec![IndexKey::from(u.email.to_lowercase())]
            }),
            IndexSpec::multi(Self::BY_ROLE, |u: &Self| {
                u.roles.iter().map(|r| IndexKey::from(r.as_str())).collect()
            }),
        ]
    }
}

impl<C: RecordCodec> EntityStore<User, C> {
    pub fn find_by_login(&self, login: &str) -> Option<User> {
        self.find_one(User::BY_LOGIN, &login.into())
    }

    pub fn find_by_email(&self, email: &str) -> Option<User> {
        self.find_one(User::BY_EMAIL, &email.to_lowercase().into())
    }

    pub fn find_by_role(&self, role: &str) -> Vec<User> {
        self.find_many(User::BY_ROLE, &role.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::JsonCodec;
    use crate::entity::StoreOptions;
    use geocat_common::Error;
    use tempfile::tempdir;

    fn store(dir: &std::path::Path) -> EntityStore<User> {
        let store = EntityStore::new(dir, JsonCodec, StoreOptions::default());
        store.load().unwrap();
        store
    }

    #[test]
    fn test_role_buckets() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        let admin = store
            .create(User::new("admin", "admin@example.org").with_roles(["admin", "publisher"]))
            .unwrap();
        let pub1 = store
            .create(User::new("ana", "ana@example.org").with_roles(["publisher"]))
            .unwrap();

        let publishers: Vec<UserId> = store.find_by_role("publisher").iter().map(|u| u.id).collect();
        assert_eq!(publishers, vec![admin, pub1]);

        let mut u = store.find_by_id(&admin).unwrap();
        u.roles = vec!["viewer".into()];
        store.update(u).unwrap();

        assert!(store.find_by_role("admin").is_empty());
        assert_eq!(store.find_by_role("publisher").len(), 1);
        assert!(store.find_by_id(&admin).unwrap().has_role("viewer"));
    }

    #[test]
    fn test_login_and_email_unique() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        store.create(User::new("ana", "Ana@Example.org")).unwrap();

        let err = store.create(User::new("ana", "other@example.org")).unwrap_err();
        assert!(matches!(err, Error::UniqueViolation { index: User::BY_LOGIN, .. }));

        let err = store.create(User::new("bob", "ana@example.ORG")).unwrap_err();
        assert!(matches!(err, Error::UniqueViolation { index: User::BY_EMAIL, .. }));

        assert_eq!(store.find_by_email("ANA@example.org").unwrap().login, "ana");
    }
}
