//! Error types for aggregation.

use std::collections::BTreeSet;

use partial_schema_core::Identity;
use thiserror::Error;

/// Errors that can end an aggregation call.
///
/// Every variant means no output was produced.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// Selectors or transitive requirements that no registered partial
    /// provides. Collected over the whole call before being reported.
    #[error("missing providers: {}", join(.0))]
    MissingProviders(BTreeSet<String>),

    /// The requirements closure went deeper than the depth bound, which
    /// almost always means partials require each other in a loop.
    #[error(
        "requirements depth over {max_depth}, requirements cycle suspected at partial {identity}"
    )]
    RequirementsCycle { max_depth: usize, identity: Identity },

    /// A `/…/` selector whose pattern does not compile.
    #[error("invalid selector '{selector}': {source}")]
    InvalidSelector {
        selector: String,
        #[source]
        source: regex::Error,
    },

    /// Reading a section or writing the output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn join(items: &BTreeSet<String>) -> String {
    items.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

/// Convenience alias for results with [`AggregateError`].
pub type Result<T> = std::result::Result<T, AggregateError>;
