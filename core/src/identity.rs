//! Partial identities: a name plus an optional `X.Y.Z` version.
//!
//! Identities are derived from resource names (`name[-X.Y.Z].txt`), from
//! paths and URLs ending in such a name, and from the comma-separated
//! dependency lists found in `REQUIRES` headers.
//!
//! # Examples
//!
//! ```
//! use partial_schema_core::{Identity, Version};
//!
//! let id = Identity::from_file_name("partial-2.0.0.txt");
//! assert_eq!(id.name(), "partial");
//! assert_eq!(id.version(), Some(Version::new(2, 0, 0)));
//! assert_eq!(id.to_string(), "partial-2.0.0");
//!
//! assert!(Identity::from_file_name("partial-a.b.c.txt").is_empty());
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// Bare identity grammar, shared by every entry point below.
const NAME_AND_VERSION: &str = r"([a-z][a-zA-Z0-9_.]*)(?:-(\d+)\.(\d+)\.(\d+))?";

static FILE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^{NAME_AND_VERSION}\.txt$")).expect("static regex must compile")
});

static BARE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^{NAME_AND_VERSION}$")).expect("static regex must compile")
});

/// A `major.minor.patch` version triple.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Error returned when a string is not a `X.Y.Z` version.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid version '{0}', expected MAJOR.MINOR.PATCH")]
pub struct ParseVersionError(String);

impl FromStr for Version {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseVersionError(s.to_string());
        let mut parts = s.split('.');
        let mut next = || -> Result<u64, ParseVersionError> {
            let part = parts.next().ok_or_else(invalid)?;
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse().map_err(|_| invalid())
        };
        let version = Version::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(version)
    }
}

/// The `(name, version)` pair designating a partial.
///
/// Equality, hashing and ordering are structural: by name, then by version,
/// with an unversioned identity ordered before any versioned one of the same
/// name. [`Identity::EMPTY`] stands for "could not be parsed".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identity {
    name: String,
    version: Option<Version>,
}

impl Identity {
    /// Sentinel for input that does not follow the naming grammar.
    pub const EMPTY: Identity = Identity {
        name: String::new(),
        version: None,
    };

    /// Creates an identity without validating `name` against the grammar.
    pub fn new(name: impl Into<String>, version: Option<Version>) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<Version> {
        self.version
    }

    /// Returns `true` for the [`Identity::EMPTY`] sentinel.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    /// Parses a resource file name of the form `name[-X.Y.Z].txt`.
    ///
    /// The whole string must match; anything else yields [`Identity::EMPTY`].
    ///
    /// ```
    /// use partial_schema_core::Identity;
    ///
    /// assert_eq!(Identity::from_file_name("p.txt").name(), "p");
    /// assert!(Identity::from_file_name("p.txt").version().is_none());
    /// assert!(Identity::from_file_name("1.2.3").is_empty());
    /// ```
    pub fn from_file_name(file_name: &str) -> Self {
        FILE_NAME_RE
            .captures(file_name)
            .and_then(|caps| from_captures(&caps))
            .unwrap_or(Self::EMPTY)
    }

    /// Parses the final component of `path` as a file name.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .file_name()
            .and_then(|name| name.to_str())
            .map(Self::from_file_name)
            .unwrap_or(Self::EMPTY)
    }

    /// Parses the final path segment of `url` as a file name.
    ///
    /// Unparsable URLs and URLs whose path ends with `/` yield
    /// [`Identity::EMPTY`].
    ///
    /// ```
    /// use partial_schema_core::Identity;
    ///
    /// let id = Identity::from_url("file:///root/partial-2.0.0.txt");
    /// assert_eq!(id.to_string(), "partial-2.0.0");
    /// assert!(Identity::from_url("file:///root/").is_empty());
    /// ```
    pub fn from_url(url: &str) -> Self {
        let Ok(url) = url::Url::parse(url) else {
            return Self::EMPTY;
        };
        url.path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
            .map(Self::from_file_name)
            .unwrap_or(Self::EMPTY)
    }

    /// Parses a single bare `name[-X.Y.Z]` token, ignoring surrounding
    /// whitespace.
    pub fn parse_bare(token: &str) -> Option<Self> {
        BARE_RE
            .captures(token.trim())
            .and_then(|caps| from_captures(&caps))
    }

    /// Parses a comma-separated dependency list such as the description of a
    /// `REQUIRES` header.
    ///
    /// Tokens that do not follow the grammar are dropped silently, and
    /// duplicates collapse.
    ///
    /// ```
    /// use partial_schema_core::Identity;
    ///
    /// let ids = Identity::from_requirement_list("partial, a_partial-1.0.0, 0");
    /// let names: Vec<String> = ids.iter().map(ToString::to_string).collect();
    /// assert_eq!(names, ["a_partial-1.0.0", "partial"]);
    /// ```
    pub fn from_requirement_list(list: &str) -> BTreeSet<Self> {
        list.split(',').filter_map(Self::parse_bare).collect()
    }
}

fn from_captures(caps: &Captures<'_>) -> Option<Identity> {
    let name = caps.get(1)?.as_str();
    let version = match (caps.get(2), caps.get(3), caps.get(4)) {
        (Some(major), Some(minor), Some(patch)) => Some(Version::new(
            major.as_str().parse().ok()?,
            minor.as_str().parse().ok()?,
            patch.as_str().parse().ok()?,
        )),
        _ => None,
    };
    Some(Identity::new(name, version))
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version {
            Some(version) => write!(f, "{}-{}", self.name, version),
            None => f.write_str(&self.name),
        }
    }
}
