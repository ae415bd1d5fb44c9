//! Selector resolution and requirements closure.
//!
//! Each selector is either a literal identity (`name` or `name-X.Y.Z`) or a
//! `/regexp/` matched against partial names. Every document a selector picks
//! is added together with everything it requires, transitively. Documents
//! keep the position at which they were first added.

use std::collections::BTreeSet;
use std::sync::Arc;

use indexmap::IndexMap;
use partial_schema_core::{Document, Identity, Registry};
use regex::Regex;
use tracing::debug;

use crate::error::{AggregateError, Result};

/// Maximum requirements depth before a cycle is assumed.
///
/// This bounds the length of any requirements path followed from a selected
/// document. It is a heuristic guard: a legitimately deep (acyclic) chain
/// trips it as well, and a cycle is only reported once the bound is hit.
pub const MAX_REQUIREMENTS_DEPTH: usize = 5;

/// A parsed selector.
#[derive(Debug, Clone)]
pub enum Selector {
    /// `/…/`: every partial whose whole name matches.
    Pattern(Regex),
    /// A single identity.
    Literal(Identity),
    /// Text that is neither; always reported as missing.
    Invalid(String),
}

impl Selector {
    /// Parses a selector string.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::InvalidSelector`] when a `/…/` pattern does
    /// not compile.
    ///
    /// # Examples
    ///
    /// ```
    /// use partial_schema_aggregator::Selector;
    ///
    /// assert!(matches!(Selector::parse("/a.*/").unwrap(), Selector::Pattern(_)));
    /// assert!(matches!(Selector::parse("users-1.0.0").unwrap(), Selector::Literal(_)));
    /// assert!(matches!(Selector::parse("Users").unwrap(), Selector::Invalid(_)));
    /// assert!(Selector::parse("/(/").is_err());
    /// ```
    pub fn parse(selector: &str) -> Result<Self> {
        if selector.len() >= 2 && selector.starts_with('/') && selector.ends_with('/') {
            let inner = &selector[1..selector.len() - 1];
            let regex = Regex::new(&format!("^(?:{inner})$")).map_err(|source| {
                AggregateError::InvalidSelector {
                    selector: selector.to_string(),
                    source,
                }
            })?;
            return Ok(Self::Pattern(regex));
        }
        Ok(match Identity::parse_bare(selector) {
            Some(identity) => Self::Literal(identity),
            None => Self::Invalid(selector.to_string()),
        })
    }
}

/// The documents chosen by one aggregation call, in output order.
#[derive(Debug, Clone)]
pub struct Selection<'r> {
    documents: Vec<&'r Arc<Document>>,
}

impl<'r> Selection<'r> {
    pub fn documents(&self) -> &[&'r Arc<Document>] {
        &self.documents
    }

    pub fn identities(&self) -> impl Iterator<Item = &Identity> {
        self.documents.iter().map(|doc| doc.identity())
    }

    pub fn contains(&self, identity: &Identity) -> bool {
        self.identities().any(|id| id == identity)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Resolves `selectors` against `registry`.
///
/// Selectors are processed in order. Pattern matches are taken in identity
/// order. Unresolvable selectors and requirements are collected and reported
/// together once every selector has been processed; a requirements cycle
/// aborts immediately.
pub(crate) fn select<'r, S: AsRef<str>>(
    registry: &'r Registry,
    selectors: &[S],
) -> Result<Selection<'r>> {
    let mut closure = Closure {
        registry,
        selected: IndexMap::new(),
        missing: BTreeSet::new(),
    };

    for raw in selectors {
        let raw = raw.as_ref();
        match Selector::parse(raw)? {
            Selector::Pattern(regex) => {
                debug!(pattern = %regex, "Selecting partials matching pattern");
                for doc in registry
                    .values()
                    .filter(|doc| regex.is_match(doc.identity().name()))
                {
                    closure.add_with_requirements(doc)?;
                }
            }
            Selector::Literal(identity) => {
                debug!(%identity, "Selecting partial");
                match registry.get(&identity) {
                    Some(doc) => closure.add_with_requirements(doc)?,
                    None => {
                        closure.missing.insert(raw.to_string());
                    }
                }
            }
            Selector::Invalid(text) => {
                closure.missing.insert(text);
            }
        }
    }

    if !closure.missing.is_empty() {
        debug!(
            missing = ?closure.missing,
            available = registry.len(),
            "Requested partials not found"
        );
        return Err(AggregateError::MissingProviders(closure.missing));
    }

    Ok(Selection {
        documents: closure.selected.into_values().collect(),
    })
}

struct Closure<'r> {
    registry: &'r Registry,
    selected: IndexMap<&'r Identity, &'r Arc<Document>>,
    missing: BTreeSet<String>,
}

impl<'r> Closure<'r> {
    /// Adds `root` and its requirements, depth first, in requirement order.
    ///
    /// A document already selected keeps its position, but its requirements
    /// are still followed along the new path so that a loop keeps growing the
    /// depth until [`MAX_REQUIREMENTS_DEPTH`] is exceeded.
    fn add_with_requirements(&mut self, root: &'r Arc<Document>) -> Result<()> {
        let mut pending = vec![(root, 0usize)];

        while let Some((doc, depth)) = pending.pop() {
            if depth > MAX_REQUIREMENTS_DEPTH {
                return Err(AggregateError::RequirementsCycle {
                    max_depth: MAX_REQUIREMENTS_DEPTH,
                    identity: doc.identity().clone(),
                });
            }

            self.selected.entry(doc.identity()).or_insert(doc);

            for required in doc.requires().iter().rev() {
                match self.registry.get_key_value(required) {
                    Some((_, required_doc)) => pending.push((required_doc, depth + 1)),
                    None => {
                        self.missing.insert(required.to_string());
                    }
                }
            }
        }

        Ok(())
    }
}
