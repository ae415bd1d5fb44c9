//! Core types for composing schema partials.
//!
//! A *partial* is a small text file holding a fragment of a schema. It is
//! named by its resource file name (`name[-X.Y.Z].txt`) and split into
//! sections by header lines:
//!
//! ```text
//! PARTIAL: Users and their lookups
//! REQUIRES: base.scalars, paging-1.0.0
//! QUERY:
//!   user(id: ID!): User
//! TYPES:
//! type User { id: ID! }
//! ```
//!
//! - [`Identity`]: the `(name, version)` of a partial, parsed from file
//!   names, paths, URLs, and `REQUIRES` lists.
//! - [`Document`]: a parsed partial with lazily readable [`Section`]s, a
//!   SHA-256 digest, and the set of identities it requires.
//! - [`PartialSource`]: a re-openable text source ([`FileSource`],
//!   [`MemorySource`]).
//! - [`Registry`] / [`RegistryProvider`]: the point-in-time snapshot
//!   aggregation works on.
//!
//! Malformed partials fail with a [`SyntaxError`] wrapped in
//! [`PartialError`].

mod document;
mod error;
mod identity;
mod parser;
mod registry;
mod source;

pub use document::{
    DIGEST_ALGORITHM, Document, Section, SectionKind, UnknownSectionKind, compute_digest,
};
pub use error::{PartialError, Result, SyntaxError};
pub use identity::{Identity, ParseVersionError, Version};
pub use registry::{Registry, RegistryProvider};
pub use source::{FileSource, MemorySource, PartialSource};
