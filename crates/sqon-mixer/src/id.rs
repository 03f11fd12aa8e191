//! Entry identifiers and the workspace-owned generator that mints them.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Opaque identifier for a mixer entry.
///
/// Rendered as `{namespace}_{counter}`. Identifiers are compared as strings;
/// the counter is only meaningful to the generator that produced it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EntryId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EntryId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntryId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EntryId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Monotonic identifier generator.
///
/// The counter only moves forward: identifiers are never handed out twice,
/// even after the entry they named has been removed. State is reset only by
/// constructing a new generator.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    namespace: String,
    next: u64,
}

impl IdGenerator {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            next: 0,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The identifier the next call to [`IdGenerator::next_id`] will return.
    pub fn peek(&self) -> EntryId {
        self.format(self.next)
    }

    pub fn next_id(&mut self) -> EntryId {
        let id = self.format(self.next);
        self.next += 1;
        id
    }

    /// Number of identifiers issued so far.
    pub fn issued(&self) -> u64 {
        self.next
    }

    fn format(&self, n: u64) -> EntryId {
        EntryId(format!("{}_{}", self.namespace, n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn unlabelled_generator_matches_bare_counter_format() {
        let mut ids = IdGenerator::new("");
        assert_eq!(ids.next_id().as_str(), "_0");
        assert_eq!(ids.next_id().as_str(), "_1");
        assert_eq!(ids.issued(), 2);
    }

    #[test]
    fn peek_does_not_advance() {
        let mut ids = IdGenerator::new("facets");
        assert_eq!(ids.peek().as_str(), "facets_0");
        assert_eq!(ids.peek().as_str(), "facets_0");
        assert_eq!(ids.next_id().as_str(), "facets_0");
        assert_eq!(ids.peek().as_str(), "facets_1");
    }

    #[test]
    fn generated_ids_are_unique() {
        let mut ids = IdGenerator::new("x");
        let seen: BTreeSet<EntryId> = (0..500).map(|_| ids.next_id()).collect();
        assert_eq!(seen.len(), 500);
    }
}
