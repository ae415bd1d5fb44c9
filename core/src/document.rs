//! Parsed partials and their sections.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::{self, Read};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::parser::scan_sections;
use crate::{Identity, PartialSource};

/// Name of the digest algorithm, as it appears in [`Document::digest`].
pub const DIGEST_ALGORITHM: &str = "SHA-256";

/// The section kinds recognized in a partial.
///
/// Ordered as they are declared, which is also the order
/// [`Document::sections`] yields them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SectionKind {
    /// Mandatory; its description names the partial.
    Partial,
    /// Description lists the partials this one depends on.
    Requires,
    /// Copied verbatim at the top of the aggregated schema.
    Prologue,
    /// Copied inside the `type Query { }` block.
    Query,
    /// Copied inside the `type Mutation { }` block.
    Mutation,
    /// Copied verbatim after the blocks.
    Types,
}

impl SectionKind {
    pub const ALL: [SectionKind; 6] = [
        SectionKind::Partial,
        SectionKind::Requires,
        SectionKind::Prologue,
        SectionKind::Query,
        SectionKind::Mutation,
        SectionKind::Types,
    ];

    /// The header word, e.g. `"QUERY"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Partial => "PARTIAL",
            Self::Requires => "REQUIRES",
            Self::Prologue => "PROLOGUE",
            Self::Query => "QUERY",
            Self::Mutation => "MUTATION",
            Self::Types => "TYPES",
        }
    }

    /// The header word capitalized as a schema type name, e.g. `"Query"`.
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Partial => "Partial",
            Self::Requires => "Requires",
            Self::Prologue => "Prologue",
            Self::Query => "Query",
            Self::Mutation => "Mutation",
            Self::Types => "Types",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a header word is not a known section kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown section kind '{0}'")]
pub struct UnknownSectionKind(pub String);

impl FromStr for SectionKind {
    type Err = UnknownSectionKind;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownSectionKind(s.to_string()))
    }
}

/// One section of a [`Document`].
///
/// The body is not held in memory. [`open`](Section::open) reopens the
/// owning document's source and returns a reader bounded to this section's
/// byte range, so sections can be read any number of times, in any order.
#[derive(Debug, Clone)]
pub struct Section {
    kind: SectionKind,
    description: String,
    start: u64,
    len: u64,
    source: Arc<dyn PartialSource>,
}

impl Section {
    pub fn kind(&self) -> SectionKind {
        self.kind
    }

    /// The trimmed text following the header's colon.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Length of the body in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Opens a fresh reader over the body.
    ///
    /// # Errors
    ///
    /// Propagates any I/O error from reopening the source, and returns
    /// [`io::ErrorKind::UnexpectedEof`] if the source has become shorter
    /// than the recorded section start.
    pub fn open(&self) -> io::Result<io::Take<Box<dyn Read + Send>>> {
        let mut reader = self.source.open()?;
        let skipped = io::copy(&mut reader.by_ref().take(self.start), &mut io::sink())?;
        if skipped < self.start {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "{} ended before section {} at byte {}",
                    self.source.describe(),
                    self.kind,
                    self.start
                ),
            ));
        }
        Ok(reader.take(self.len))
    }

    /// Reads the whole body into a string.
    pub fn read_to_string(&self) -> io::Result<String> {
        let mut content = String::with_capacity(self.len as usize);
        self.open()?.read_to_string(&mut content)?;
        Ok(content)
    }
}

/// A parsed partial: identity, content digest, sections, and requirements.
///
/// Built once by [`Document::parse`] and immutable afterwards. Cloning is
/// cheap; the source is shared.
#[derive(Debug, Clone)]
pub struct Document {
    identity: Identity,
    digest: String,
    sections: BTreeMap<SectionKind, Section>,
    requires: BTreeSet<Identity>,
    source: Arc<dyn PartialSource>,
}

impl Document {
    /// Parses `source` into a document.
    ///
    /// # Errors
    ///
    /// Returns [`PartialError::Syntax`](crate::PartialError::Syntax) when the
    /// source is not a valid partial, or
    /// [`PartialError::Io`](crate::PartialError::Io) when it cannot be read.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use partial_schema_core::{Document, Identity, MemorySource, SectionKind};
    ///
    /// let text = "PARTIAL: users\nREQUIRES: base, scalars-1.0.0\nQUERY:\n  user(id: ID): User\n";
    /// let doc = Document::parse(
    ///     Identity::from_file_name("users.txt"),
    ///     Arc::new(MemorySource::new("users.txt", text)),
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(doc.sections().count(), 3);
    /// assert_eq!(doc.requires().len(), 2);
    /// let query = doc.section(SectionKind::Query).unwrap();
    /// assert_eq!(query.read_to_string().unwrap(), "  user(id: ID): User\n");
    /// ```
    pub fn parse(identity: Identity, source: Arc<dyn PartialSource>) -> Result<Self> {
        let scanned = scan_sections(source.open()?)?;
        let digest = compute_digest(source.open()?)?;

        let sections: BTreeMap<SectionKind, Section> = scanned
            .into_iter()
            .map(|s| {
                let section = Section {
                    kind: s.kind,
                    description: s.description,
                    start: s.start,
                    len: s.end - s.start,
                    source: Arc::clone(&source),
                };
                (s.kind, section)
            })
            .collect();

        let requires = sections
            .get(&SectionKind::Requires)
            .map(|s| Identity::from_requirement_list(s.description()))
            .unwrap_or_default();

        Ok(Self {
            identity,
            digest,
            sections,
            requires,
            source,
        })
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Digest of the raw source bytes, formatted as `SHA-256: <hex>`.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.get(&kind)
    }

    /// Present sections, in [`SectionKind`] order.
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.values()
    }

    /// Identities named in the `REQUIRES` header, empty when absent.
    pub fn requires(&self) -> &BTreeSet<Identity> {
        &self.requires
    }

    /// Where this document was read from.
    pub fn source(&self) -> String {
        self.source.describe()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.identity, self.source.describe())
    }
}

/// Hashes everything `reader` yields and formats it as `SHA-256: <hex>`.
pub fn compute_digest(mut reader: impl Read) -> io::Result<String> {
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(format!("{DIGEST_ALGORITHM}: {:x}", hasher.finalize()))
}
