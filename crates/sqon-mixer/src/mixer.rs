//! The mixer: the workspace that owns entries and their reference graph.
//!
//! This is the single authority for identifier existence:
//! - mint identifiers
//! - build and register compounds after validating references
//! - reject combinations that would close a reference cycle
//! - resolve entries into self-contained trees

use crate::config::{MixerConfig, ReferencePolicy};
use crate::entry::{Entry, Operand, Payload};
use crate::error::MixerError;
use crate::graph::ReferenceGraph;
use crate::id::{EntryId, IdGenerator};
use crate::sqon::{Child, Combinator, CompoundExpression, Sqon};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, trace};

/// Workspace of registered filter expressions.
///
/// Entries are immutable once registered, so checking for cycles when a
/// compound is registered is enough to keep the graph acyclic.
#[derive(Debug, Clone)]
pub struct Mixer<L> {
    entries: BTreeMap<EntryId, Entry<L>>,
    graph: ReferenceGraph,
    ids: IdGenerator,
    config: MixerConfig,
    created_at: DateTime<Utc>,
}

impl<L: Clone> Default for Mixer<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Clone> Mixer<L> {
    /// Mixer with an empty namespace: identifiers are `_0`, `_1`, ...
    ///
    /// Two unlabelled mixers issue the same identifiers, so a handle from
    /// one can pass validation in the other. Use [`Mixer::labelled`] or
    /// [`MixerConfig::timestamp`] when handles may cross mixers.
    pub fn new() -> Self {
        Self::with_config(MixerConfig::default())
    }

    /// Mixer whose identifiers are namespaced by `label` and creation time.
    pub fn labelled(label: impl Into<String>) -> Self {
        Self::with_config(MixerConfig::labelled(label).with_timestamp())
    }

    pub fn with_config(config: MixerConfig) -> Self {
        let created_at = Utc::now();
        let ids = IdGenerator::new(config.namespace(created_at));
        debug!(namespace = ids.namespace(), policy = ?config.policy, "created mixer");
        Self {
            entries: BTreeMap::new(),
            graph: ReferenceGraph::new(),
            ids,
            config,
            created_at,
        }
    }

    pub fn config(&self) -> &MixerConfig {
        &self.config
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn namespace(&self) -> &str {
        self.ids.namespace()
    }

    /// The identifier the next registered entry will receive.
    pub fn next_id(&self) -> EntryId {
        self.ids.peek()
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in identifier order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry<L>> {
        self.entries.values()
    }

    pub fn has(&self, id: impl AsRef<str>) -> bool {
        self.entries.contains_key(id.as_ref())
    }

    pub fn get(&self, id: impl AsRef<str>) -> Option<&Entry<L>> {
        self.entries.get(id.as_ref())
    }

    /// Register a leaf under a fresh identifier.
    pub fn put(&mut self, leaf: L) -> Entry<L> {
        self.insert(Payload::Leaf(leaf))
    }

    /// Delete an entry.
    ///
    /// No cascade and no reference check: entries that still reference `id`
    /// will fail to resolve afterwards. The identifier is never reissued.
    pub fn remove(&mut self, id: impl AsRef<str>) -> Option<Entry<L>> {
        let id = id.as_ref();
        let removed = self.entries.remove(id)?;
        self.graph.remove_node(id);
        debug!(id, "removed entry");
        Some(removed)
    }

    /// Build an unresolved compound from `operands` without registering it.
    ///
    /// Every reference operand must name an entry of this mixer.
    pub fn combine(
        &self,
        op: Combinator,
        operands: impl IntoIterator<Item = Operand<L>>,
    ) -> Result<CompoundExpression<L>, MixerError> {
        let content = operands
            .into_iter()
            .map(|operand| match operand {
                Operand::Leaf(leaf) => Ok(Child::Leaf(leaf)),
                Operand::Reference(id) if self.has(&id) => Ok(Child::Reference(id)),
                Operand::Reference(id) => Err(MixerError::UnknownReference { id }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CompoundExpression::new(op, content))
    }

    /// Register a prebuilt compound as a new entry.
    ///
    /// References are re-validated and the cycle pre-check runs before
    /// anything is inserted. On error the mixer is unchanged and no
    /// identifier is consumed.
    pub fn register(&mut self, compound: CompoundExpression<L>) -> Result<Entry<L>, MixerError> {
        let prospective = self.ids.peek();
        let candidates: BTreeSet<EntryId> = compound.references().cloned().collect();

        // A reference to the identifier about to be issued is a self-loop,
        // which the cycle check reports; everything else must exist.
        if let Some(missing) = candidates
            .iter()
            .find(|id| **id != prospective && !self.has(id))
        {
            return Err(MixerError::UnknownReference {
                id: missing.clone(),
            });
        }

        if let Some(ids) = self.find_loop(&prospective, &candidates) {
            debug!(id = %prospective, ?ids, "rejected combination");
            return Err(MixerError::CycleDetected { ids });
        }

        Ok(self.insert(Payload::Compound(compound)))
    }

    /// Register `and(operands)`.
    ///
    /// Under the default [`ReferencePolicy::AllowShared`], combining an
    /// entry with something that already references it is a diamond and is
    /// accepted. [`ReferencePolicy::Strict`] rejects it:
    ///
    /// ```
    /// use sqon_mixer::{Mixer, MixerConfig, MixerError, Operand, ReferencePolicy};
    ///
    /// let strict = MixerConfig::default().with_policy(ReferencePolicy::Strict);
    /// let mut mixer = Mixer::with_config(strict);
    /// let base = mixer.put("sex = F");
    /// let negated = mixer.not([Operand::from(&base)])?;
    ///
    /// let err = mixer.and([Operand::from(&base), Operand::from(&negated)]);
    /// assert!(matches!(err, Err(MixerError::CycleDetected { .. })));
    ///
    /// let mut mixer = Mixer::new();
    /// let base = mixer.put("sex = F");
    /// let negated = mixer.not([Operand::from(&base)])?;
    /// assert!(mixer.and([Operand::from(&base), Operand::from(&negated)]).is_ok());
    /// # Ok::<(), MixerError>(())
    /// ```
    pub fn and(
        &mut self,
        operands: impl IntoIterator<Item = Operand<L>>,
    ) -> Result<Entry<L>, MixerError> {
        let compound = self.combine(Combinator::And, operands)?;
        self.register(compound)
    }

    pub fn or(
        &mut self,
        operands: impl IntoIterator<Item = Operand<L>>,
    ) -> Result<Entry<L>, MixerError> {
        let compound = self.combine(Combinator::Or, operands)?;
        self.register(compound)
    }

    pub fn not(
        &mut self,
        operands: impl IntoIterator<Item = Operand<L>>,
    ) -> Result<Entry<L>, MixerError> {
        let compound = self.combine(Combinator::Not, operands)?;
        self.register(compound)
    }

    /// Expand `id` into a tree with every reference replaced by its value.
    ///
    /// Child order is preserved. A shared dependency is expanded once per
    /// reference site.
    pub fn resolve(&self, id: impl AsRef<str>) -> Result<Sqon<L>, MixerError> {
        let id = id.as_ref();
        let entry = self.entries.get(id).ok_or_else(|| MixerError::unknown(id))?;

        let compound = match entry.payload() {
            Payload::Leaf(leaf) => return Ok(Sqon::Leaf(leaf.clone())),
            Payload::Compound(compound) => compound,
        };

        let content = compound
            .content
            .iter()
            .map(|child| match child {
                Child::Leaf(leaf) => Ok(Sqon::Leaf(leaf.clone())),
                Child::Reference(reference) => {
                    trace!(parent = id, %reference, "resolving referenced entry");
                    self.resolve(reference)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Sqon::compound(compound.op, content))
    }

    /// Every identifier reachable from `id` through references.
    ///
    /// Identifiers of removed entries are included but not expanded.
    pub fn all_references(&self, id: impl AsRef<str>) -> Result<BTreeSet<EntryId>, MixerError> {
        let id = id.as_ref();
        if !self.has(id) {
            return Err(MixerError::unknown(id));
        }
        Ok(self.graph.closure(id))
    }

    /// Whether registering a compound over `ids` would be rejected.
    pub fn has_loops(&self, ids: &[EntryId]) -> Result<bool, MixerError> {
        if let Some(missing) = ids.iter().find(|id| !self.has(id)) {
            return Err(MixerError::UnknownReference {
                id: missing.clone(),
            });
        }
        let candidates: BTreeSet<EntryId> = ids.iter().cloned().collect();
        Ok(self.find_loop(&self.ids.peek(), &candidates).is_some())
    }

    /// Cycle pre-check for a prospective entry referencing `candidates`.
    ///
    /// Searches the mixer's graph, with the prospective entry overlaid, for
    /// a cycle through the prospective entry. Under
    /// [`ReferencePolicy::Strict`] a candidate reachable from another
    /// candidate is also reported, as `[holder, reached]`.
    fn find_loop(
        &self,
        prospective: &EntryId,
        candidates: &BTreeSet<EntryId>,
    ) -> Option<Vec<EntryId>> {
        if let Some(cycle) = self.graph.find_cycle_with(prospective, candidates) {
            return Some(cycle);
        }

        if self.config.policy == ReferencePolicy::Strict {
            for holder in candidates {
                let closure = self.graph.closure(holder.as_str());
                if let Some(reached) = candidates
                    .iter()
                    .find(|other| *other != holder && closure.contains(*other))
                {
                    return Some(vec![holder.clone(), reached.clone()]);
                }
            }
        }

        None
    }

    fn insert(&mut self, payload: Payload<L>) -> Entry<L> {
        let id = self.ids.next_id();
        let entry = Entry::new(id.clone(), payload);
        self.graph.insert_node(id.clone(), entry.references().clone());
        debug!(
            %id,
            references = entry.references().len(),
            leaf = entry.is_leaf(),
            "registered entry"
        );
        self.entries.insert(id, entry.clone());
        entry
    }
}
