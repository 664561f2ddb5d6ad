//! The catalog: every store of one root directory
//!
//! [`Catalog`] owns one store per kind, the sensor/data association, the
//! service store and the property file. It adds a handful of lookups that
//! span two kinds; everything else goes through the store accessors.

use crate::codec::{AnyCodec, RecordCodec};
use crate::entity::{EntityStore, StoreOptions};
use crate::fsio;
use crate::kinds::{
    Attachment, Data, Dataset, Layer, MetadataRecord, Provider, Sensor, Style, Task,
    TaskParameter, User,
};
use crate::link::LinkTable;
use crate::properties::PropertyFile;
use crate::record::Record;
use crate::report::{CatalogLoadReport, LoadReport};
use crate::resolver::{FsPathResolver, PathResolver};
use crate::service::ServiceStore;
use geocat_common::{
    CatalogConfig, DataId, Kind, PROPERTIES_FILE, ProviderId, Result, SENSOR_X_DATA, SensorId,
    ServiceKey,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Every store of a catalog root
pub struct Catalog<C: RecordCodec = AnyCodec> {
    resolver: Arc<dyn PathResolver>,
    attachments: EntityStore<Attachment, C>,
    providers: EntityStore<Provider, C>,
    datasets: EntityStore<Dataset, C>,
    data: EntityStore<Data, C>,
    sensors: EntityStore<Sensor, C>,
    styles: EntityStore<Style, C>,
    layers: EntityStore<Layer, C>,
    metadata: EntityStore<MetadataRecord, C>,
    users: EntityStore<User, C>,
    tasks: EntityStore<Task, C>,
    task_parameters: EntityStore<TaskParameter, C>,
    sensor_links: LinkTable<DataId, SensorId, C>,
    services: ServiceStore<C>,
    properties: PropertyFile,
}

impl Catalog {
    /// Open the catalog described by `config`
    pub fn open(config: &CatalogConfig) -> Result<(Self, CatalogLoadReport)> {
        Self::open_with(
            &config.root_dir,
            AnyCodec::from(config.codec),
            StoreOptions::from(config),
        )
    }
}

impl<C: RecordCodec + Clone> Catalog<C> {
    /// Open every store under `root` with an explicit codec
    pub fn open_with(
        root: impl AsRef<Path>,
        codec: C,
        options: StoreOptions,
    ) -> Result<(Self, CatalogLoadReport)> {
        fn track<T>(report: &mut CatalogLoadReport, opened: (T, LoadReport)) -> T {
            report.push(opened.1);
            opened.0
        }

        let root = root.as_ref();
        fsio::ensure_dir(root)?;
        let resolver: Arc<dyn PathResolver> = Arc::new(FsPathResolver::new(root));
        let mut report = CatalogLoadReport::default();
        let r: &dyn PathResolver = &*resolver;

        let attachments: EntityStore<Attachment, C> =
            track(&mut report, EntityStore::open(r, codec.clone(), options)?);
        let providers: EntityStore<Provider, C> =
            track(&mut report, EntityStore::open(r, codec.clone(), options)?);
        let datasets: EntityStore<Dataset, C> =
            track(&mut report, EntityStore::open(r, codec.clone(), options)?);
        let data: EntityStore<Data, C> =
            track(&mut report, EntityStore::open(r, codec.clone(), options)?);
        let sensors: EntityStore<Sensor, C> =
            track(&mut report, EntityStore::open(r, codec.clone(), options)?);
        let styles: EntityStore<Style, C> =
            track(&mut report, EntityStore::open(r, codec.clone(), options)?);
        let layers: EntityStore<Layer, C> =
            track(&mut report, EntityStore::open(r, codec.clone(), options)?);
        let metadata: EntityStore<MetadataRecord, C> =
            track(&mut report, EntityStore::open(r, codec.clone(), options)?);
        let users: EntityStore<User, C> =
            track(&mut report, EntityStore::open(r, codec.clone(), options)?);
        let services = track(
            &mut report,
            ServiceStore::open(Arc::clone(&resolver), codec.clone(), options)?,
        );
        let tasks: EntityStore<Task, C> =
            track(&mut report, EntityStore::open(r, codec.clone(), options)?);
        let task_parameters: EntityStore<TaskParameter, C> =
            track(&mut report, EntityStore::open(r, codec.clone(), options)?);
        let sensor_links = track(
            &mut report,
            LinkTable::open(r, SENSOR_X_DATA, codec, options.sync_writes)?,
        );
        let properties = PropertyFile::open(root.join(PROPERTIES_FILE), options.sync_writes)?;

        info!(
            "catalog {:?}: {} records in {} stores ({} diagnostics)",
            root,
            report.loaded(),
            report.stores.len(),
            report.diagnostics().count()
        );

        let catalog = Self {
            resolver,
            attachments,
            providers,
            datasets,
            data,
            sensors,
            styles,
            layers,
            metadata,
            users,
            tasks,
            task_parameters,
            sensor_links,
            services,
            properties,
        };
        Ok((catalog, report))
    }

    pub fn root(&self) -> &Path {
        self.resolver.root()
    }

    pub const fn attachments(&self) -> &EntityStore<Attachment, C> {
        &self.attachments
    }

    pub const fn providers(&self) -> &EntityStore<Provider, C> {
        &self.providers
    }

    pub const fn datasets(&self) -> &EntityStore<Dataset, C> {
        &self.datasets
    }

    pub const fn data(&self) -> &EntityStore<Data, C> {
        &self.data
    }

    pub const fn sensors(&self) -> &EntityStore<Sensor, C> {
        &self.sensors
    }

    pub const fn styles(&self) -> &EntityStore<Style, C> {
        &self.styles
    }

    pub const fn layers(&self) -> &EntityStore<Layer, C> {
        &self.layers
    }

    pub const fn metadata(&self) -> &EntityStore<MetadataRecord, C> {
        &self.metadata
    }

    pub const fn users(&self) -> &EntityStore<User, C> {
        &self.users
    }

    pub const fn tasks(&self) -> &EntityStore<Task, C> {
        &self.tasks
    }

    pub const fn task_parameters(&self) -> &EntityStore<TaskParameter, C> {
        &self.task_parameters
    }

    /// Data id → sensor ids association
    pub const fn sensor_links(&self) -> &LinkTable<DataId, SensorId, C> {
        &self.sensor_links
    }

    pub const fn services(&self) -> &ServiceStore<C> {
        &self.services
    }

    pub const fn properties(&self) -> &PropertyFile {
        &self.properties
    }

    /// Number of records held per kind, in load order
    pub fn counts(&self) -> Vec<(Kind, usize)> {
        vec![
            (Attachment::KIND, self.attachments.len()),
            (Provider::KIND, self.providers.len()),
            (Dataset::KIND, self.datasets.len()),
            (Data::KIND, self.data.len()),
            (Sensor::KIND, self.sensors.len()),
            (Style::KIND, self.styles.len()),
            (Layer::KIND, self.layers.len()),
            (MetadataRecord::KIND, self.metadata.len()),
            (User::KIND, self.users.len()),
            (Kind::Services, self.services.len()),
            (Task::KIND, self.tasks.len()),
            (TaskParameter::KIND, self.task_parameters.len()),
        ]
    }

    // ---- Cross-kind lookups ----

    pub fn provider_of_data(&self, data: DataId) -> Option<Provider> {
        let data = self.data.find_by_id(&data)?;
        self.providers.find_by_id(&data.provider)
    }

    pub fn data_of_provider(&self, provider: ProviderId) -> Vec<Data> {
        self.data.find_by_provider(provider)
    }

    /// Sensors linked to `data`, in link order. Linked ids without a
    /// sensor record are left out.
    pub fn sensors_of_data(&self, data: DataId) -> Vec<Sensor> {
        self.sensor_links
            .members_of(&data)
            .iter()
            .filter_map(|id| self.sensors.find_by_id(id))
            .collect()
    }

    /// Data records `sensor` is linked to
    pub fn data_of_sensor(&self, sensor: SensorId) -> Vec<Data> {
        self.sensor_links
            .owners_of(&sensor)
            .iter()
            .filter_map(|id| self.data.find_by_id(id))
            .collect()
    }

    pub fn layers_of_service(&self, service: &ServiceKey) -> Vec<Layer> {
        self.layers.find_by_service(service)
    }

    /// Link entries naming a data or sensor record that does not exist
    pub fn dangling_sensor_links(&self) -> Vec<(DataId, SensorId)> {
        let mut dangling = Vec::new();
        for (data, members) in self.sensor_links.entries() {
            let data_exists = self.data.exists_by_id(&data);
            for sensor in members {
                if !data_exists || !self.sensors.exists_by_id(&sensor) {
                    dangling.push((data, sensor));
                }
            }
        }
        dangling
    }

    /// Delete a data record, its sensor link file and the layers
    /// publishing it. Returns `false` when the data is absent.
    ///
    /// Steps are not atomic together: a failure part way leaves the
    /// earlier steps applied.
    pub fn delete_data_cascade(&self, data: DataId) -> Result<bool> {
        if !self.data.delete(&data)? {
            return Ok(false);
        }
        self.sensor_links.remove_owner(&data)?;
        let layers = self.layers.delete_by_data(data)?;
        debug!("deleted data {} with {} layers", data, layers);
        Ok(true)
    }

    /// Delete a service folder and the layers it publishes
    pub fn delete_service_cascade(&self, service: &ServiceKey) -> Result<bool> {
        if !self.services.delete(service)? {
            return Ok(false);
        }
        let layers = self.layers.delete_by_service(service)?;
        debug!("deleted service {} with {} layers", service, layers);
        Ok(true)
    }
}
