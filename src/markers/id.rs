/*!
 * Marker Identifiers
 *
 * A marker is the trailing segment of a sequential namespace entry, e.g.
 * `lock-0000000042`. Ordering compares the embedded counter as an integer so
 * that differing digit widths or prefixes never misorder markers.
 */

use crate::core::errors::{LockError, LockResult};
use crate::core::limits::{MAX_SEQUENCE_DIGITS, SEQUENCE_WIDTH};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// One lock marker in the shared namespace
///
/// Cheap to clone: the name is reference counted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MarkerId {
    name: Arc<str>,
    sequence: u64,
}

impl MarkerId {
    /// Parse a bare marker name (no `/`)
    pub fn parse(name: &str) -> LockResult<Self> {
        if name.is_empty() {
            return Err(LockError::invalid_marker(name, "empty marker name"));
        }
        if name.contains('/') {
            return Err(LockError::invalid_marker(name, "marker name contains '/'"));
        }

        let digits = name
            .bytes()
            .rev()
            .take_while(|b| b.is_ascii_digit())
            .count();

        if digits == 0 {
            return Err(LockError::invalid_marker(name, "missing sequence suffix"));
        }

        let suffix = &name[name.len() - digits..];
        // Leading zeros do not count against the width limit
        let significant = suffix.trim_start_matches('0');
        if significant.len() > MAX_SEQUENCE_DIGITS {
            return Err(LockError::invalid_marker(name, "sequence suffix too long"));
        }

        let sequence = if significant.is_empty() {
            0
        } else {
            significant
                .parse::<u64>()
                .map_err(|e| LockError::invalid_marker(name, e.to_string()))?
        };

        Ok(Self {
            name: Arc::from(name),
            sequence,
        })
    }

    /// Extract the marker from a full notification path (its last `/` segment)
    pub fn from_path(path: &str) -> LockResult<Self> {
        let segment = path
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| LockError::MalformedPath(path.to_string()))?;
        Self::parse(segment)
    }

    /// Build the conventional zero-padded marker name for `prefix` and `sequence`
    pub fn format(prefix: &str, sequence: u64) -> String {
        format!("{}{:0width$}", prefix, sequence, width = SEQUENCE_WIDTH)
    }

    /// Full marker name
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Embedded sequence counter
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Everything before the sequence counter
    pub fn prefix(&self) -> &str {
        let digits = self
            .name
            .bytes()
            .rev()
            .take_while(|b| b.is_ascii_digit())
            .count();
        &self.name[..self.name.len() - digits]
    }
}

impl Ord for MarkerId {
    fn cmp(&self, other: &Self) -> Ordering {
        // Name breaks ties so Ord agrees with Eq
        self.sequence
            .cmp(&other.sequence)
            .then_with(|| self.name.cmp(&other.name))
    }
}

impl PartialOrd for MarkerId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl std::str::FromStr for MarkerId {
    type Err = LockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MarkerId {
    type Error = LockError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MarkerId> for String {
    fn from(id: MarkerId) -> Self {
        id.name.to_string()
    }
}

impl AsRef<str> for MarkerId {
    fn as_ref(&self) -> &str {
        &self.name
    }
}
