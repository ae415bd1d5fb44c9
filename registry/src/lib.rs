//! Runtime registry, configuration, and manifests for schema partials.
//!
//! - [`ProviderRegistry`] tracks *modules* (groups of partial resources,
//!   typically one directory each) as they are added and removed, and
//!   publishes immutable [`Registry`](partial_schema_core::Registry)
//!   snapshots for aggregation.
//! - [`AggregatorConfig`] is the YAML description of an aggregation run.
//! - [`Manifest`] records which partials went into an output, with their
//!   digests, and compares runs.
//!
//! # Quick start
//!
//! ```no_run
//! use partial_schema_registry::{AggregatorConfig, Manifest, ProviderRegistry};
//!
//! let config = AggregatorConfig::load("aggregate.yml").unwrap();
//! let registry = ProviderRegistry::new();
//! config.register_modules(&registry).unwrap();
//!
//! let snapshot = registry.snapshot();
//! let manifest = Manifest::from_documents(
//!     env!("CARGO_PKG_VERSION").into(),
//!     config.selectors.clone(),
//!     snapshot.values().map(|doc| doc.as_ref()),
//! );
//! manifest.save("schema.manifest.json").unwrap();
//! ```

mod config;
mod error;
mod manifest;
mod provider;

pub use config::AggregatorConfig;
pub use error::{RegistryError, Result};
pub use manifest::{Manifest, PartialMetadata};
pub use provider::{ModuleId, ModuleInfo, ProviderRegistry};
