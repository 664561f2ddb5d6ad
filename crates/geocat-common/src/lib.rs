//! Geocat Common - Shared types and utilities
//!
//! This crate provides the error type, configuration, kind/directory
//! constants and record key types shared by the catalog store and its
//! tooling.

pub mod config;
pub mod error;
pub mod types;

pub use config::{CatalogConfig, CodecKind, DuplicatePolicy};
pub use error::{CodecError, Error, Result};
pub use types::*;
