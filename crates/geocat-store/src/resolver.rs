//! Storage location resolution
//!
//! The store only asks for directories by name; where the root lives is
//! decided by whoever builds the resolver.

use crate::fsio;
use geocat_common::{Error, Kind, Result, ServiceType, is_file_stem};
use std::path::{Path, PathBuf};

/// Maps store names to directories, creating them on first use
pub trait PathResolver: Send + Sync {
    /// Catalog root
    fn root(&self) -> &Path;

    /// Directory for `name` under the root, created if absent
    fn directory_for(&self, name: &str) -> Result<PathBuf>;

    /// Directory of a record kind
    fn kind_directory(&self, kind: Kind) -> Result<PathBuf> {
        self.directory_for(kind.dir_name())
    }

    /// Folder holding every service of one type
    fn service_type_directory(&self, service_type: ServiceType) -> Result<PathBuf> {
        self.directory_for(service_type.dir_name())
    }

    /// Folder of one service instance: `<type>/<identifier>`
    fn service_directory(&self, service_type: ServiceType, identifier: &str) -> Result<PathBuf> {
        if !is_file_stem(identifier) {
            return Err(Error::InvalidKey {
                kind: Kind::Services,
                key: identifier.to_string(),
            });
        }
        self.directory_for(&format!("{}/{identifier}", service_type.dir_name()))
    }
}

/// Resolver rooted at a plain filesystem directory
#[derive(Clone, Debug)]
pub struct FsPathResolver {
    root: PathBuf,
}

impl FsPathResolver {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl PathResolver for FsPathResolver {
    fn root(&self) -> &Path {
        &self.root
    }

    fn directory_for(&self, name: &str) -> Result<PathBuf> {
        let dir = self.root.join(name);
        fsio::ensure_dir(&dir)?;
        Ok(dir)
    }
}
