//! Service configurations
//!
//! Services do not live in a flat kind directory. Each service type owns a
//! top-level folder and each service instance a sub-folder of it:
//!
//! ```text
//! <root>/<type>/<identifier>/service.<ext>
//! <root>/<type>/<identifier>/extras/<name>.<ext>
//! <root>/<type>/<identifier>/i18n/<lang>.<ext>
//! ```
//!
//! Only `service.<ext>` is loaded and held in memory. Extra configuration
//! documents and localized details are read from disk on demand.

use crate::codec::{JsonCodec, RecordCodec};
use crate::entity::StoreOptions;
use crate::fsio;
use crate::report::LoadReport;
use crate::resolver::PathResolver;
use chrono::{DateTime, Utc};
use geocat_common::{
    DuplicatePolicy, Error, Kind, Result, ServiceKey, ServiceType, UserId, is_file_stem,
};
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

const SERVICE_FILE: &str = "service";
const EXTRAS_DIR: &str = "extras";
const I18N_DIR: &str = "i18n";

/// Run state of a service instance
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceStatus {
    Started,
    #[default]
    Stopped,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub service_type: ServiceType,
    pub identifier: String,
    pub status: ServiceStatus,
    /// Protocol versions served, e.g. `1.3.0`
    pub versions: Vec<String>,
    pub impl_name: Option<String>,
    /// Opaque service configuration document
    pub config: String,
    pub owner: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Service {
    pub fn new(service_type: ServiceType, identifier: impl Into<String>) -> Self {
        Self {
            service_type,
            identifier: identifier.into(),
            status: ServiceStatus::default(),
            versions: Vec::new(),
            impl_name: None,
            config: String::new(),
            owner: None,
            created_at: Utc::now(),
        }
    }

    pub fn key(&self) -> ServiceKey {
        ServiceKey::new(self.service_type, self.identifier.clone())
    }
}

/// Localized service description, one file per language
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDetails {
    pub title: String,
    pub description: Option<String>,
    pub keywords: Vec<String>,
    pub contact: Option<String>,
}

/// Store of every service instance of a catalog
pub struct ServiceStore<C: RecordCodec = JsonCodec> {
    resolver: Arc<dyn PathResolver>,
    codec: C,
    options: StoreOptions,
    services: RwLock<BTreeMap<ServiceKey, Service>>,
    writer: Mutex<()>,
}

impl<C: RecordCodec> ServiceStore<C> {
    /// Create an empty, unloaded store
    pub fn new(resolver: Arc<dyn PathResolver>, codec: C, options: StoreOptions) -> Self {
        Self {
            resolver,
            codec,
            options,
            services: RwLock::new(BTreeMap::new()),
            writer: Mutex::new(()),
        }
    }

    /// Create the store and load every service folder
    pub fn open(
        resolver: Arc<dyn PathResolver>,
        codec: C,
        options: StoreOptions,
    ) -> Result<(Self, LoadReport)> {
        let store = Self::new(resolver, codec, options);
        let report = store.load()?;
        Ok((store, report))
    }

    fn folder(&self, key: &ServiceKey) -> PathBuf {
        self.resolver
            .root()
            .join(key.service_type.dir_name())
            .join(&key.identifier)
    }

    fn service_file(&self, folder: &Path) -> PathBuf {
        folder.join(format!("{SERVICE_FILE}.{}", self.codec.extension()))
    }

    fn document_path(&self, key: &ServiceKey, sub: &str, name: &str) -> PathBuf {
        self.folder(key)
            .join(sub)
            .join(format!("{name}.{}", self.codec.extension()))
    }

    /// Scan every service type folder and rebuild the in-memory map.
    ///
    /// A folder without a decodable service file, or whose service file
    /// names another service, is reported and skipped.
    pub fn load(&self) -> Result<LoadReport> {
        let _writer = self.writer.lock();
        let mut report = LoadReport::new(Kind::Services.dir_name());
        let mut services = BTreeMap::new();

        for service_type in ServiceType::ALL {
            let type_dir = self.resolver.root().join(service_type.dir_name());
            for (identifier, folder) in fsio::subdirs(&type_dir)? {
                let file = self.service_file(&folder);
                let tmp = fsio::tmp_path(&file);
                if tmp.exists() {
                    let outcome = match std::fs::remove_file(&tmp) {
                        Ok(()) => "removed leftover of an interrupted write".to_string(),
                        Err(e) => format!("leftover of an interrupted write, cannot remove: {e}"),
                    };
                    report.skip(&tmp, outcome);
                }

                let bytes = match fsio::read(&file) {
                    Ok(bytes) => bytes,
                    Err(e) if e.kind() == ErrorKind::NotFound => {
                        report.skip(&folder, "service folder without a service file");
                        continue;
                    }
                    Err(e) => {
                        report.skip(&file, format!("cannot read: {e}"));
                        continue;
                    }
                };
                let service: Service = match self.codec.decode(&bytes) {
                    Ok(service) => service,
                    Err(e) => {
                        report.skip(&file, e.to_string());
                        continue;
                    }
                };

                if service.service_type != service_type || service.identifier != identifier {
                    report.skip(
                        &file,
                        format!("folder does not match service {}", service.key()),
                    );
                    continue;
                }
                services.insert(service.key(), service);
            }
        }

        report.loaded = services.len();
        *self.services.write() = services;
        info!(
            "{}: loaded {} services ({} skipped)",
            Kind::Services,
            report.loaded,
            report.diagnostics.len()
        );
        Ok(report)
    }

    // ---- Reads ----

    pub fn find(&self, service_type: ServiceType, identifier: &str) -> Option<Service> {
        self.get(&ServiceKey::new(service_type, identifier))
    }

    pub fn get(&self, key: &ServiceKey) -> Option<Service> {
        self.services.read().get(key).cloned()
    }

    /// Services of one type, ordered by identifier
    pub fn find_by_type(&self, service_type: ServiceType) -> Vec<Service> {
        self.services
            .read()
            .values()
            .filter(|s| s.service_type == service_type)
            .cloned()
            .collect()
    }

    /// All services, ordered by type then identifier
    pub fn find_all(&self) -> Vec<Service> {
        self.services.read().values().cloned().collect()
    }

    pub fn keys(&self) -> Vec<ServiceKey> {
        self.services.read().keys().cloned().collect()
    }

    pub fn exists(&self, key: &ServiceKey) -> bool {
        self.services.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.services.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ---- Writes ----

    /// Create the service folder and its service file
    pub fn create(&self, service: Service) -> Result<ServiceKey> {
        let _writer = self.writer.lock();
        let key = service.key();

        if self.exists(&key) {
            match self.options.duplicate_policy {
                DuplicatePolicy::Reject => {
                    return Err(Error::DuplicateKey {
                        kind: Kind::Services,
                        key: key.to_string(),
                    });
                }
                DuplicatePolicy::Overwrite => {
                    warn!("{}: create overwrites existing {}", Kind::Services, key);
                }
            }
        }

        let folder = self
            .resolver
            .service_directory(key.service_type, &key.identifier)?;
        self.write_service(&folder, &service)?;
        self.services.write().insert(key.clone(), service);
        debug!("{}: created {}", Kind::Services, key);
        Ok(key)
    }

    /// Rewrite a service file. Returns `false` when the service is absent.
    pub fn update(&self, service: Service) -> Result<bool> {
        let _writer = self.writer.lock();
        let key = service.key();
        if !self.exists(&key) {
            return Ok(false);
        }

        self.write_service(&self.folder(&key), &service)?;
        self.services.write().insert(key.clone(), service);
        debug!("{}: updated {}", Kind::Services, key);
        Ok(true)
    }

    /// Remove the whole service folder, extras and translations included
    pub fn delete(&self, key: &ServiceKey) -> Result<bool> {
        let _writer = self.writer.lock();
        if !self.exists(key) {
            return Ok(false);
        }

        fsio::remove_tree(&self.folder(key))?;
        self.services.write().remove(key);
        debug!("{}: deleted {}", Kind::Services, key);
        Ok(true)
    }

    fn write_service(&self, folder: &Path, service: &Service) -> Result<()> {
        let bytes = self.codec.encode(service)?;
        fsio::write_atomic(&self.service_file(folder), &bytes, self.options.sync_writes)
    }

    // ---- Extra documents and translations ----

    /// Store an extra configuration document. Returns `false` when the
    /// service is absent.
    pub fn put_extra(&self, key: &ServiceKey, name: &str, content: &str) -> Result<bool> {
        self.put_document(key, EXTRAS_DIR, name, content)
    }

    pub fn get_extra(&self, key: &ServiceKey, name: &str) -> Result<Option<String>> {
        self.get_document(key, EXTRAS_DIR, name)
    }

    pub fn remove_extra(&self, key: &ServiceKey, name: &str) -> Result<bool> {
        self.remove_document(key, EXTRAS_DIR, name)
    }

    /// Names of the extra documents of a service
    pub fn extras_of(&self, key: &ServiceKey) -> Result<Vec<String>> {
        self.document_names(key, EXTRAS_DIR)
    }

    /// Store the details of a service in one language. Returns `false`
    /// when the service is absent.
    pub fn put_details(&self, key: &ServiceKey, lang: &str, details: &ServiceDetails) -> Result<bool> {
        self.put_document(key, I18N_DIR, lang, details)
    }

    pub fn get_details(&self, key: &ServiceKey, lang: &str) -> Result<Option<ServiceDetails>> {
        self.get_document(key, I18N_DIR, lang)
    }

    pub fn remove_details(&self, key: &ServiceKey, lang: &str) -> Result<bool> {
        self.remove_document(key, I18N_DIR, lang)
    }

    /// Languages a service has details in
    pub fn languages_of(&self, key: &ServiceKey) -> Result<Vec<String>> {
        self.document_names(key, I18N_DIR)
    }

    fn check_name(name: &str) -> Result<()> {
        if is_file_stem(name) {
            Ok(())
        } else {
            Err(Error::InvalidKey {
                kind: Kind::Services,
                key: name.to_string(),
            })
        }
    }

    fn put_document<T: Serialize + ?Sized>(
        &self,
        key: &ServiceKey,
        sub: &str,
        name: &str,
        value: &T,
    ) -> Result<bool> {
        Self::check_name(name)?;
        let _writer = self.writer.lock();
        if !self.exists(key) {
            return Ok(false);
        }

        let path = self.document_path(key, sub, name);
        if let Some(parent) = path.parent() {
            fsio::ensure_dir(parent)?;
        }
        let bytes = self.codec.encode(value)?;
        fsio::write_atomic(&path, &bytes, self.options.sync_writes)?;
        debug!("{}: {} stored {}/{}", Kind::Services, key, sub, name);
        Ok(true)
    }

    fn get_document<T: DeserializeOwned>(
        &self,
        key: &ServiceKey,
        sub: &str,
        name: &str,
    ) -> Result<Option<T>> {
        Self::check_name(name)?;
        if !self.exists(key) {
            return Ok(None);
        }

        let path = self.document_path(key, sub, name);
        match fsio::read(&path) {
            Ok(bytes) => Ok(Some(self.codec.decode(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(&path, e)),
        }
    }

    fn remove_document(&self, key: &ServiceKey, sub: &str, name: &str) -> Result<bool> {
        Self::check_name(name)?;
        let _writer = self.writer.lock();
        let path = self.document_path(key, sub, name);
        if !self.exists(key) || !path.exists() {
            return Ok(false);
        }

        fsio::remove(&path)?;
        debug!("{}: {} removed {}/{}", Kind::Services, key, sub, name);
        Ok(true)
    }

    fn document_names(&self, key: &ServiceKey, sub: &str) -> Result<Vec<String>> {
        if !self.exists(key) {
            return Ok(Vec::new());
        }
        fsio::stems(&self.folder(key).join(sub), self.codec.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::FsPathResolver;
    use tempfile::tempdir;

    fn store(root: &Path) -> ServiceStore {
        let resolver: Arc<dyn PathResolver> = Arc::new(FsPathResolver::new(root));
        let (store, _) = ServiceStore::open(resolver, JsonCodec, StoreOptions::default()).unwrap();
        store
    }

    #[test]
    fn test_nested_layout() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        let mut wms = Service::new(ServiceType::Wms, "default");
        wms.versions = vec!["1.3.0".into()];
        let key = store.create(wms).unwrap();

        assert!(dir.path().join("wms/default/service.json").is_file());
        assert_eq!(store.get(&key).unwrap().versions, vec!["1.3.0"]);

        let err = store.create(Service::new(ServiceType::Wms, "default")).unwrap_err();
        assert!(matches!(err, Error::DuplicateKey { kind: Kind::Services, .. }));
    }

    #[test]
    fn test_find_by_type() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        store.create(Service::new(ServiceType::Wfs, "b")).unwrap();
        store.create(Service::new(ServiceType::Wms, "a")).unwrap();
        store.create(Service::new(ServiceType::Wfs, "a")).unwrap();

        let wfs: Vec<String> = store
            .find_by_type(ServiceType::Wfs)
            .into_iter()
            .map(|s| s.identifier)
            .collect();
        assert_eq!(wfs, vec!["a", "b"]);
        assert!(store.find_by_type(ServiceType::Csw).is_empty());
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_extras_and_details() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let key = store.create(Service::new(ServiceType::Csw, "default")).unwrap();

        assert!(store.put_extra(&key, "harvest", r#"{"interval": 60}"#).unwrap());
        assert!(store.put_extra(&key, "cache", "{}").unwrap());
        assert_eq!(store.extras_of(&key).unwrap(), vec!["cache", "harvest"]);
        assert_eq!(
            store.get_extra(&key, "harvest").unwrap().as_deref(),
            Some(r#"{"interval": 60}"#)
        );
        assert!(store.remove_extra(&key, "cache").unwrap());
        assert!(!store.remove_extra(&key, "cache").unwrap());
        assert!(store.get_extra(&key, "cache").unwrap().is_none());

        let details = ServiceDetails {
            title: "Catalogue".into(),
            keywords: vec!["metadata".into()],
            ..Default::default()
        };
        assert!(store.put_details(&key, "en", &details).unwrap());
        assert!(store.put_details(&key, "fr", &details).unwrap());
        assert_eq!(store.languages_of(&key).unwrap(), vec!["en", "fr"]);
        assert_eq!(store.get_details(&key, "en").unwrap(), Some(details));

        assert!(store.put_extra(&key, "../escape", "{}").is_err());
        let missing = ServiceKey::new(ServiceType::Csw, "other");
        assert!(!store.put_extra(&missing, "harvest", "{}").unwrap());
    }

    #[test]
    fn test_delete_removes_folder() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let key = store.create(Service::new(ServiceType::Sos, "default")).unwrap();
        store.put_extra(&key, "om", "{}").unwrap();

        assert!(store.delete(&key).unwrap());
        assert!(!dir.path().join("sos/default").exists());
        assert!(!store.exists(&key));
        assert!(!store.delete(&key).unwrap());
    }

    #[test]
    fn test_delete_failure_keeps_memory() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let key = store.create(Service::new(ServiceType::Wps, "default")).unwrap();

        std::fs::remove_dir_all(dir.path().join("wps/default")).unwrap();
        assert!(store.delete(&key).unwrap_err().is_io());
        assert!(store.exists(&key));
    }

    #[test]
    fn test_load_diagnostics() {
        let dir = tempdir().unwrap();
        {
            let store = store(dir.path());
            store.create(Service::new(ServiceType::Wms, "good")).unwrap();
            store.create(Service::new(ServiceType::Wms, "moved")).unwrap();
        }
        std::fs::create_dir_all(dir.path().join("wms/empty")).unwrap();
        std::fs::create_dir_all(dir.path().join("wfs/broken")).unwrap();
        std::fs::write(dir.path().join("wfs/broken/service.json"), b"{").unwrap();
        std::fs::rename(dir.path().join("wms/moved"), dir.path().join("wms/renamed")).unwrap();

        let resolver: Arc<dyn PathResolver> = Arc::new(FsPathResolver::new(dir.path()));
        let (store, report) =
            ServiceStore::open(resolver, JsonCodec, StoreOptions::default()).unwrap();

        assert_eq!(report.loaded, 1);
        assert_eq!(report.diagnostics.len(), 3);
        assert!(store.find(ServiceType::Wms, "good").is_some());
    }
}
