//! The read-only view of available partials consumed by aggregation.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{Document, Identity};

/// A point-in-time mapping from identity to parsed partial.
pub type Registry = BTreeMap<Identity, Arc<Document>>;

/// Something that can hand out registry snapshots.
///
/// Each call returns an immutable snapshot; later changes to the provider
/// are not visible through a snapshot already taken.
pub trait RegistryProvider {
    fn snapshot(&self) -> Arc<Registry>;
}

impl RegistryProvider for Registry {
    fn snapshot(&self) -> Arc<Registry> {
        Arc::new(self.clone())
    }
}

impl RegistryProvider for Arc<Registry> {
    fn snapshot(&self) -> Arc<Registry> {
        Arc::clone(self)
    }
}
