//! Manifests of aggregated partials.
//!
//! A manifest records, for one aggregation run, which partials went into the
//! output and the digest of each. Comparing two manifests tells which
//! partials were added, dropped, or edited between runs.
//!
//! # Examples
//!
//! ```no_run
//! use partial_schema_registry::{Manifest, PartialMetadata};
//!
//! let mut manifest = Manifest::new("0.1.0".into(), vec!["users".into()]);
//! manifest.update_entry("users".into(), PartialMetadata {
//!     digest: "SHA-256: 1f2e...".into(),
//!     source: "schemas/users.txt".into(),
//!     requires: vec!["base.scalars".into()],
//! });
//!
//! manifest.save("schema.manifest.json").unwrap();
//! let loaded = Manifest::load("schema.manifest.json").unwrap();
//! assert!(loaded.contains("users"));
//! ```

use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::{DateTime, Utc};
use partial_schema_core::{DIGEST_ALGORITHM, Document};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Result;

/// What a manifest records about one partial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialMetadata {
    /// Content digest, `SHA-256: <hex>`.
    pub digest: String,
    /// Where the partial was read from.
    pub source: String,
    /// Identities listed in the partial's `REQUIRES` header.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,
}

impl From<&Document> for PartialMetadata {
    fn from(doc: &Document) -> Self {
        Self {
            digest: doc.digest().to_string(),
            source: doc.source(),
            requires: doc.requires().iter().map(ToString::to_string).collect(),
        }
    }
}

/// Record of one aggregation run.
///
/// Persisted as pretty-printed JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    /// Manifest format version (e.g., `"1.0"`).
    pub version: String,
    /// Version of the tool that produced this manifest.
    pub tool_version: String,
    /// Time of the last update.
    pub updated_at: DateTime<Utc>,
    /// Selectors the output was aggregated from.
    #[serde(default)]
    pub selectors: Vec<String>,
    /// Per-partial metadata keyed by identity.
    pub partials: BTreeMap<String, PartialMetadata>,
}

impl Manifest {
    /// Creates an empty manifest stamped with the current time.
    pub fn new(tool_version: String, selectors: Vec<String>) -> Self {
        Self {
            version: "1.0".to_string(),
            tool_version,
            updated_at: Utc::now(),
            selectors,
            partials: BTreeMap::new(),
        }
    }

    /// Creates a manifest describing `documents`.
    pub fn from_documents<'a>(
        tool_version: String,
        selectors: Vec<String>,
        documents: impl IntoIterator<Item = &'a Document>,
    ) -> Self {
        let mut manifest = Self::new(tool_version, selectors);
        manifest.partials = documents
            .into_iter()
            .map(|doc| (doc.identity().to_string(), PartialMetadata::from(doc)))
            .collect();
        manifest
    }

    /// Loads a manifest from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::RegistryError::IoError) if the file cannot
    /// be read, or [`JsonError`](crate::RegistryError::JsonError) if the
    /// content is not valid manifest JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let manifest = serde_json::from_reader(reader)?;
        Ok(manifest)
    }

    /// Saves the manifest as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::RegistryError::IoError) if the file cannot
    /// be written, or [`JsonError`](crate::RegistryError::JsonError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Inserts or updates the metadata for `identity` and refreshes `updated_at`.
    pub fn update_entry(&mut self, identity: String, metadata: PartialMetadata) {
        self.partials.insert(identity, metadata);
        self.updated_at = Utc::now();
    }

    /// Computes the digest of a file, in the same format as
    /// [`Document::digest`].
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::RegistryError::IoError) if the file cannot
    /// be read.
    pub fn calculate_digest(path: impl AsRef<Path>) -> Result<String> {
        let bytes = std::fs::read(path)?;
        let hash = Sha256::digest(&bytes);
        Ok(format!("{DIGEST_ALGORITHM}: {:x}", hash))
    }

    /// Returns the identities that differ between `self` and `other`, sorted.
    ///
    /// An identity differs if it is present in only one manifest or if its
    /// digest changed.
    ///
    /// # Examples
    ///
    /// ```
    /// use partial_schema_registry::{Manifest, PartialMetadata};
    ///
    /// let meta = |digest: &str| PartialMetadata {
    ///     digest: digest.into(),
    ///     source: "mem".into(),
    ///     requires: Vec::new(),
    /// };
    ///
    /// let mut old = Manifest::new("0.1.0".into(), Vec::new());
    /// old.update_entry("a".into(), meta("SHA-256: 01"));
    /// old.update_entry("b".into(), meta("SHA-256: 02"));
    ///
    /// let mut new = Manifest::new("0.1.0".into(), Vec::new());
    /// new.update_entry("a".into(), meta("SHA-256: 01"));
    /// new.update_entry("b".into(), meta("SHA-256: ff"));
    /// new.update_entry("c".into(), meta("SHA-256: 03"));
    ///
    /// assert_eq!(old.diff(&new), ["b", "c"]);
    /// ```
    pub fn diff(&self, other: &Manifest) -> Vec<String> {
        let mut changed: Vec<String> = self
            .partials
            .iter()
            .filter(|(identity, meta)| {
                other
                    .partials
                    .get(*identity)
                    .is_none_or(|other_meta| other_meta.digest != meta.digest)
            })
            .map(|(identity, _)| identity.clone())
            .collect();

        changed.extend(
            other
                .partials
                .keys()
                .filter(|identity| !self.partials.contains_key(*identity))
                .cloned(),
        );
        changed.sort();
        changed
    }

    /// Looks up metadata for a partial.
    pub fn get(&self, identity: &str) -> Option<&PartialMetadata> {
        self.partials.get(identity)
    }

    /// Returns `true` if the manifest contains an entry for `identity`.
    pub fn contains(&self, identity: &str) -> bool {
        self.partials.contains_key(identity)
    }
}
