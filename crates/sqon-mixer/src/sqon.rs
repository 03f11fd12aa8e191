//! Expression shapes: unresolved compounds held by the mixer and the
//! concrete trees handed to a query engine.
//!
//! ```text
//! CompoundExpression<L>   op + [Child::Leaf(L) | Child::Reference(EntryId)]
//!     │ resolve
//!     ▼
//! Sqon<L>                 op + [Sqon::Leaf(L) | Sqon::Compound(..)]
//! ```

use crate::id::EntryId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Boolean combination operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combinator {
    And,
    Or,
    Not,
}

impl Combinator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Combinator::And => "and",
            Combinator::Or => "or",
            Combinator::Not => "not",
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One child of an unresolved compound: a leaf carried by value, or the
/// identifier of another entry in the same mixer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Child<L> {
    Leaf(L),
    Reference(EntryId),
}

impl<L> Child<L> {
    pub fn reference(&self) -> Option<&EntryId> {
        match self {
            Child::Reference(id) => Some(id),
            Child::Leaf(_) => None,
        }
    }
}

/// A compound payload whose reference children have not been expanded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundExpression<L> {
    pub op: Combinator,
    pub content: Vec<Child<L>>,
}

impl<L> CompoundExpression<L> {
    pub fn new(op: Combinator, content: Vec<Child<L>>) -> Self {
        Self { op, content }
    }

    /// Referenced identifiers in child order, duplicates included.
    pub fn references(&self) -> impl Iterator<Item = &EntryId> {
        self.content.iter().filter_map(Child::reference)
    }
}

/// A fully resolved expression tree. Contains no entry identifiers.
///
/// Serialize-only: untagged, a leaf whose own form is `{op, content}` is
/// indistinguishable from a compound once written out.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Sqon<L> {
    Compound { op: Combinator, content: Vec<Sqon<L>> },
    Leaf(L),
}

impl<L> Sqon<L> {
    pub fn compound(op: Combinator, content: Vec<Sqon<L>>) -> Self {
        Sqon::Compound { op, content }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Sqon::Leaf(_))
    }

    pub fn op(&self) -> Option<Combinator> {
        match self {
            Sqon::Compound { op, .. } => Some(*op),
            Sqon::Leaf(_) => None,
        }
    }

    /// All leaves in depth-first, left-to-right order.
    pub fn leaves(&self) -> Vec<&L> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a L>) {
        match self {
            Sqon::Leaf(leaf) => out.push(leaf),
            Sqon::Compound { content, .. } => {
                for child in content {
                    child.collect_leaves(out);
                }
            }
        }
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        match self {
            Sqon::Leaf(_) => 1,
            Sqon::Compound { content, .. } => {
                1 + content.iter().map(Sqon::depth).max().unwrap_or(0)
            }
        }
    }
}
