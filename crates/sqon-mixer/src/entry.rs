//! Entries: immutable, mixer-owned nodes and the handles callers hold.

use crate::error::MixerError;
use crate::id::EntryId;
use crate::mixer::Mixer;
use crate::sqon::{CompoundExpression, Sqon};
use std::collections::BTreeSet;
use std::sync::Arc;

/// What an entry holds: a leaf or an unresolved compound.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload<L> {
    Leaf(L),
    Compound(CompoundExpression<L>),
}

impl<L> Payload<L> {
    /// Distinct identifiers referenced directly by this payload.
    pub fn direct_references(&self) -> BTreeSet<EntryId> {
        match self {
            Payload::Leaf(_) => BTreeSet::new(),
            Payload::Compound(compound) => compound.references().cloned().collect(),
        }
    }
}

/// Handle to an entry registered in a [`Mixer`].
///
/// Cloning is cheap: payload and reference set are shared. The handle holds
/// no link back to its mixer, so every forwarding method takes the mixer
/// explicitly.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<L> {
    id: EntryId,
    payload: Arc<Payload<L>>,
    references: Arc<BTreeSet<EntryId>>,
}

impl<L: Clone> Entry<L> {
    pub(crate) fn new(id: EntryId, payload: Payload<L>) -> Self {
        let references = payload.direct_references();
        Self {
            id,
            payload: Arc::new(payload),
            references: Arc::new(references),
        }
    }

    pub fn id(&self) -> &EntryId {
        &self.id
    }

    pub fn payload(&self) -> &Payload<L> {
        &self.payload
    }

    /// Identifiers this entry references directly, computed at creation.
    pub fn references(&self) -> &BTreeSet<EntryId> {
        &self.references
    }

    pub fn is_leaf(&self) -> bool {
        matches!(*self.payload, Payload::Leaf(_))
    }

    /// `mixer.and([self, rest..])`
    pub fn and(
        &self,
        mixer: &mut Mixer<L>,
        rest: impl IntoIterator<Item = Operand<L>>,
    ) -> Result<Entry<L>, MixerError> {
        mixer.and(self.prepend(rest))
    }

    /// `mixer.or([self, rest..])`
    pub fn or(
        &self,
        mixer: &mut Mixer<L>,
        rest: impl IntoIterator<Item = Operand<L>>,
    ) -> Result<Entry<L>, MixerError> {
        mixer.or(self.prepend(rest))
    }

    /// `mixer.not([self, rest..])`
    pub fn not(
        &self,
        mixer: &mut Mixer<L>,
        rest: impl IntoIterator<Item = Operand<L>>,
    ) -> Result<Entry<L>, MixerError> {
        mixer.not(self.prepend(rest))
    }

    pub fn resolve(&self, mixer: &Mixer<L>) -> Result<Sqon<L>, MixerError> {
        mixer.resolve(self.id.as_str())
    }

    pub fn all_references(&self, mixer: &Mixer<L>) -> Result<BTreeSet<EntryId>, MixerError> {
        mixer.all_references(self.id.as_str())
    }

    /// Whether combining this entry with `others` would be rejected.
    pub fn has_loops<'a>(
        &self,
        mixer: &Mixer<L>,
        others: impl IntoIterator<Item = &'a EntryId>,
    ) -> Result<bool, MixerError> {
        let mut ids = vec![self.id.clone()];
        ids.extend(others.into_iter().cloned());
        mixer.has_loops(&ids)
    }

    fn prepend(&self, rest: impl IntoIterator<Item = Operand<L>>) -> Vec<Operand<L>> {
        std::iter::once(Operand::from(self)).chain(rest).collect()
    }
}

/// One operand given to a combination, before it is validated.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand<L> {
    /// Embedded by value.
    Leaf(L),
    /// An entry of the mixer, by handle or by identifier.
    Reference(EntryId),
}

impl<L> Operand<L> {
    pub fn leaf(leaf: L) -> Self {
        Operand::Leaf(leaf)
    }

    pub fn reference(id: impl Into<EntryId>) -> Self {
        Operand::Reference(id.into())
    }
}

impl<L> From<&Entry<L>> for Operand<L> {
    fn from(entry: &Entry<L>) -> Self {
        Operand::Reference(entry.id.clone())
    }
}

impl<L> From<Entry<L>> for Operand<L> {
    fn from(entry: Entry<L>) -> Self {
        Operand::Reference(entry.id)
    }
}

impl<L> From<EntryId> for Operand<L> {
    fn from(id: EntryId) -> Self {
        Operand::Reference(id)
    }
}

impl<L> From<&EntryId> for Operand<L> {
    fn from(id: &EntryId) -> Self {
        Operand::Reference(id.clone())
    }
}

impl<L> From<&str> for Operand<L> {
    fn from(id: &str) -> Self {
        Operand::Reference(EntryId::new(id))
    }
}

impl<L> From<String> for Operand<L> {
    fn from(id: String) -> Self {
        Operand::Reference(EntryId::from(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqon::{Child, Combinator};

    #[test]
    fn compound_payload_dedupes_direct_references() {
        let payload: Payload<&str> = Payload::Compound(CompoundExpression::new(
            Combinator::Or,
            vec![
                Child::Reference(EntryId::new("_1")),
                Child::Leaf("x"),
                Child::Reference(EntryId::new("_1")),
                Child::Reference(EntryId::new("_0")),
            ],
        ));
        let direct = payload.direct_references();
        let refs: Vec<&str> = direct
            .iter()
            .map(|id| id.as_str())
            .collect();
        assert_eq!(refs, vec!["_0", "_1"]);
    }

    #[test]
    fn leaf_entry_has_no_references() {
        let entry = Entry::new(EntryId::new("_0"), Payload::Leaf("x"));
        assert!(entry.is_leaf());
        assert!(entry.references().is_empty());
    }

    #[test]
    fn operands_convert_from_handles_and_ids() {
        let entry = Entry::new(EntryId::new("_7"), Payload::Leaf(1u8));
        assert_eq!(Operand::from(&entry), Operand::reference("_7"));
        assert_eq!(Operand::<u8>::from("_7"), Operand::Reference(EntryId::new("_7")));
        assert_eq!(Operand::<u8>::from(String::from("_7")), Operand::from(entry));
    }
}
