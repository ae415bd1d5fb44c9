//! Aggregation configuration.
//!
//! Describes which module directories to load, which partials to select,
//! and where results go. Command-line flags override these values.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! modules:
//!   - schemas/base
//!   - schemas/users
//! selectors:
//!   - base.scalars
//!   - /users\..*/
//! output: build/schema.graphqls
//! tool_name: SchemaAggregator
//! manifest: build/schema.manifest.json
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::provider::{ModuleId, ProviderRegistry};

/// Top-level aggregation configuration.
///
/// # Examples
///
/// ```
/// use partial_schema_registry::AggregatorConfig;
///
/// let config: AggregatorConfig = serde_yaml::from_str(
///     "version: \"1.0\"\nmodules: [schemas]\nselectors: [users]\n",
/// )
/// .unwrap();
/// assert_eq!(config.selectors, ["users"]);
/// assert!(config.output.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Configuration format version (e.g., `"1.0"`).
    pub version: String,
    /// Module directories, each registered as one module.
    #[serde(default)]
    pub modules: Vec<PathBuf>,
    /// Selectors passed to the aggregator, in order.
    #[serde(default)]
    pub selectors: Vec<String>,
    /// Output file; standard output when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    /// Name used in the output's attribution comments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    /// Where to write a manifest of the aggregated partials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<PathBuf>,
}

impl AggregatorConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::RegistryError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::RegistryError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::RegistryError::IoError) if the file cannot
    /// be written, or [`YamlError`](crate::RegistryError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Registers every configured module directory with `registry`, in order.
    ///
    /// # Errors
    ///
    /// Stops at the first directory that cannot be listed.
    pub fn register_modules(&self, registry: &ProviderRegistry) -> Result<Vec<ModuleId>> {
        self.modules
            .iter()
            .map(|dir| registry.add_module_dir(dir))
            .collect()
    }
}
