//! Aggregation of schema partials into one schema text.
//!
//! An [`Aggregator`] takes a registry snapshot and an ordered list of
//! selectors, resolves them to documents together with everything they
//! require, and renders the sections of the selected documents in a fixed
//! layout:
//!
//! ```text
//! # Schema aggregated by SchemaAggregator
//! <PROLOGUE sections>
//! type Query {
//! <QUERY sections>
//! }
//! type Mutation {            (only if some document has a MUTATION section)
//! <MUTATION sections>
//! }
//! <TYPES sections>
//! # End of Schema aggregated from {a,b,c} by SchemaAggregator
//! ```
//!
//! Every contribution is preceded by a `# <tool>.source=<identity>` line.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use partial_schema_aggregator::Aggregator;
//! use partial_schema_core::{Document, Identity, MemorySource, Registry};
//!
//! let mut registry = Registry::new();
//! for (file, text) in [
//!     ("scalars.txt", "PARTIAL: scalars\nPROLOGUE:\nscalar Date\n"),
//!     ("users.txt", "PARTIAL: users\nREQUIRES: scalars\nQUERY:\n  user: User\nTYPES:\ntype User { born: Date }\n"),
//! ] {
//!     let identity = Identity::from_file_name(file);
//!     let doc = Document::parse(identity.clone(), Arc::new(MemorySource::new(file, text))).unwrap();
//!     registry.insert(identity, Arc::new(doc));
//! }
//!
//! let schema = Aggregator::default().aggregate(&registry, &["users"]).unwrap();
//! assert!(schema.starts_with("# Schema aggregated by SchemaAggregator\n"));
//! assert!(schema.contains("type Query {"));
//! assert!(!schema.contains("type Mutation {"));
//! assert!(schema.ends_with("# End of Schema aggregated from {users,scalars} by SchemaAggregator"));
//! ```

mod error;
mod render;
mod select;

use std::io::{self, Write};

use partial_schema_core::{Registry, RegistryProvider};
use tracing::debug;

pub use error::{AggregateError, Result};
pub use select::{MAX_REQUIREMENTS_DEPTH, Selection, Selector};

/// Tool name used in attribution comments unless configured otherwise.
pub const DEFAULT_TOOL_NAME: &str = "SchemaAggregator";

/// Selects partials and renders the aggregated schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregator {
    tool_name: String,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::with_tool_name(DEFAULT_TOOL_NAME)
    }
}

impl Aggregator {
    /// Creates an aggregator that names itself `tool_name` in the output.
    pub fn with_tool_name(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
        }
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    /// Resolves `selectors` and their requirements without rendering.
    ///
    /// # Errors
    ///
    /// See [`AggregateError`]: unresolved selectors or requirements, a
    /// suspected requirements cycle, or an invalid `/…/` pattern.
    pub fn select<'r, S: AsRef<str>>(
        &self,
        registry: &'r Registry,
        selectors: &[S],
    ) -> Result<Selection<'r>> {
        select::select(registry, selectors)
    }

    /// Aggregates into a string.
    pub fn aggregate<S: AsRef<str>>(
        &self,
        registry: &Registry,
        selectors: &[S],
    ) -> Result<String> {
        let selection = self.resolve(registry, selectors)?;
        self.render(&selection)
    }

    /// Renders a selection obtained from [`select`](Self::select).
    ///
    /// Lets a caller that also needs the selected documents resolve the
    /// selectors once.
    pub fn render(&self, selection: &Selection<'_>) -> Result<String> {
        let buffer = self.render_to_buffer(selection)?;
        String::from_utf8(buffer)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err).into())
    }

    /// Aggregates into `target`.
    ///
    /// Nothing is written unless the whole aggregation succeeds.
    pub fn aggregate_to<S: AsRef<str>, W: Write>(
        &self,
        registry: &Registry,
        selectors: &[S],
        mut target: W,
    ) -> Result<()> {
        let selection = self.resolve(registry, selectors)?;
        let buffer = self.render_to_buffer(&selection)?;
        target.write_all(&buffer)?;
        target.flush()?;
        Ok(())
    }

    /// Aggregates over one snapshot taken from `provider`.
    pub fn aggregate_from<P: RegistryProvider + ?Sized, S: AsRef<str>>(
        &self,
        provider: &P,
        selectors: &[S],
    ) -> Result<String> {
        let snapshot = provider.snapshot();
        self.aggregate(&snapshot, selectors)
    }

    fn resolve<'r, S: AsRef<str>>(
        &self,
        registry: &'r Registry,
        selectors: &[S],
    ) -> Result<Selection<'r>> {
        debug!(
            tool = %self.tool_name,
            request = ?selectors.iter().map(|s| s.as_ref()).collect::<Vec<&str>>(),
            providers = registry.len(),
            "Aggregating schemas"
        );

        let selection = select::select(registry, selectors)?;
        debug!(selected = selection.len(), "Selected partials");
        Ok(selection)
    }

    fn render_to_buffer(&self, selection: &Selection<'_>) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        render::render(&self.tool_name, selection, &mut buffer)?;
        Ok(buffer)
    }
}
