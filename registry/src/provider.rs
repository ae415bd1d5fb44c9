//! Runtime registry of partial providers.
//!
//! Partials are contributed by *modules*: named groups of resources such as
//! one directory on disk. Modules come and go at runtime, while aggregation
//! reads a stable view of everything registered so far.
//!
//! # Snapshots
//!
//! Every mutation builds a new immutable [`Registry`] and publishes it
//! atomically. [`ProviderRegistry::snapshot`] is a lock-free load of the last
//! published map, so a caller holding a snapshot never observes a module
//! being added or removed halfway through an aggregation. Writers are
//! serialized by a mutex.
//!
//! # Collisions
//!
//! The first module to register an identity owns it. Later providers of the
//! same identity are ignored with a warning and are not promoted when the
//! owner is removed.
//!
//! ```
//! use std::sync::Arc;
//!
//! use partial_schema_core::{MemorySource, PartialSource};
//! use partial_schema_registry::ProviderRegistry;
//!
//! let registry = ProviderRegistry::new();
//! let source: Arc<dyn PartialSource> = Arc::new(MemorySource::new("mem", "PARTIAL: users\n"));
//! let module = registry.add_module("users", [("users.txt".to_string(), source)]);
//! assert_eq!(registry.len(), 1);
//!
//! let snapshot = registry.snapshot();
//! registry.remove_module(module);
//! assert!(registry.is_empty());
//! assert_eq!(snapshot.len(), 1);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use partial_schema_core::{
    Document, FileSource, Identity, PartialSource, Registry, RegistryProvider,
};
use tracing::{debug, info, warn};

use crate::error::{RegistryError, Result};

/// Handle returned by [`ProviderRegistry::add_module`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleId(u64);

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A registered module and the partials it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    pub id: ModuleId,
    pub name: String,
    /// Identities this module registered, excluding ignored duplicates.
    pub partials: Vec<Identity>,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    modules: BTreeMap<ModuleId, ModuleInfo>,
    partials: Registry,
}

/// Registry of partials contributed by runtime modules.
#[derive(Debug)]
pub struct ProviderRegistry {
    published: ArcSwap<Registry>,
    state: Mutex<State>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            published: ArcSwap::from_pointee(Registry::new()),
            state: Mutex::new(State::default()),
        }
    }

    /// Registers a module from `(resource name, source)` entries.
    ///
    /// The identity of each entry comes from the last `/`-separated segment
    /// of its resource name. Resources that are not partial file names are
    /// skipped, as are partials that fail to parse; neither aborts the
    /// module.
    pub fn add_module<I>(&self, name: impl Into<String>, entries: I) -> ModuleId
    where
        I: IntoIterator<Item = (String, Arc<dyn PartialSource>)>,
    {
        let name = name.into();
        let documents = parse_entries(&name, entries);

        let mut state = self.state.lock();
        let id = ModuleId(state.next_id);
        state.next_id += 1;

        let mut owned = Vec::with_capacity(documents.len());
        for doc in documents {
            let identity = doc.identity().clone();
            if state.partials.contains_key(&identity) {
                warn!(
                    module = %name,
                    partial = %identity,
                    "Partial provider for partial {identity} already present"
                );
                continue;
            }
            state.partials.insert(identity.clone(), Arc::new(doc));
            owned.push(identity);
        }

        info!(module = %name, id = %id, partials = owned.len(), "Added partials module");
        state.modules.insert(
            id,
            ModuleInfo {
                id,
                name,
                partials: owned,
            },
        );
        self.publish(&state);
        id
    }

    /// Registers every partial file directly inside `dir`.
    ///
    /// Subdirectories are not descended into. The module is named after the
    /// directory path.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotADirectory`] if `dir` is not a directory,
    /// or [`RegistryError::IoError`] if it cannot be listed.
    pub fn add_module_dir(&self, dir: impl AsRef<Path>) -> Result<ModuleId> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(RegistryError::NotADirectory(dir.display().to_string()));
        }

        let mut entries: Vec<(String, Arc<dyn PartialSource>)> = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            // follows symlinks, so a linked partial counts as a file
            if !entry.path().is_file() {
                debug!(path = %entry.path().display(), "Skipping non-file module entry");
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().into_owned();
            let source: Arc<dyn PartialSource> = Arc::new(FileSource::new(entry.path()));
            entries.push((file_name, source));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(self.add_module(dir.display().to_string(), entries))
    }

    /// Drops every partial registered by module `id`.
    ///
    /// Returns `false` if no such module is registered.
    pub fn remove_module(&self, id: ModuleId) -> bool {
        let mut state = self.state.lock();
        let Some(module) = state.modules.remove(&id) else {
            debug!(id = %id, "Ignoring removal of unknown module");
            return false;
        };
        for identity in &module.partials {
            state.partials.remove(identity);
        }
        info!(
            module = %module.name,
            id = %id,
            partials = module.partials.len(),
            "Removed partials module"
        );
        self.publish(&state);
        true
    }

    /// The last published registry.
    pub fn snapshot(&self) -> Arc<Registry> {
        self.published.load_full()
    }

    /// Looks up a partial in the current snapshot.
    pub fn get(&self, identity: &Identity) -> Option<Arc<Document>> {
        self.published.load().get(identity).cloned()
    }

    /// Registered modules, oldest first.
    pub fn modules(&self) -> Vec<ModuleInfo> {
        self.state.lock().modules.values().cloned().collect()
    }

    /// Number of partials in the current snapshot.
    pub fn len(&self) -> usize {
        self.published.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn publish(&self, state: &State) {
        self.published.store(Arc::new(state.partials.clone()));
    }
}

impl RegistryProvider for ProviderRegistry {
    fn snapshot(&self) -> Arc<Registry> {
        ProviderRegistry::snapshot(self)
    }
}

fn parse_entries<I>(module: &str, entries: I) -> Vec<Document>
where
    I: IntoIterator<Item = (String, Arc<dyn PartialSource>)>,
{
    let mut documents = Vec::new();
    for (resource, source) in entries {
        let file_name = resource.rsplit('/').next().unwrap_or(&resource);
        let identity = Identity::from_file_name(file_name);
        if identity.is_empty() {
            debug!(module, resource = %resource, "Ignoring resource that is not a partial");
            continue;
        }
        match Document::parse(identity, source) {
            Ok(doc) => {
                debug!(module, partial = %doc, "Parsed partial");
                documents.push(doc);
            }
            Err(err) => {
                warn!(module, resource = %resource, error = %err, "Skipping unparsable partial");
            }
        }
    }
    documents
}
