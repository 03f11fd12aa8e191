//! Thread-safe wrapper around [`Mixer`].
//!
//! Mutations hold the write lock for their whole validate-check-insert
//! sequence, so two writers can never interleave identifier assignment or
//! race a cycle check against an insert. Reads share the read lock.

use crate::config::MixerConfig;
use crate::entry::{Entry, Operand};
use crate::error::MixerError;
use crate::id::EntryId;
use crate::mixer::Mixer;
use crate::sqon::{CompoundExpression, Sqon};
use std::collections::BTreeSet;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug)]
pub struct SharedMixer<L> {
    inner: Arc<RwLock<Mixer<L>>>,
}

impl<L> Clone for SharedMixer<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: Clone> Default for SharedMixer<L> {
    fn default() -> Self {
        Self::new(Mixer::new())
    }
}

impl<L: Clone> From<Mixer<L>> for SharedMixer<L> {
    fn from(mixer: Mixer<L>) -> Self {
        Self::new(mixer)
    }
}

impl<L: Clone> SharedMixer<L> {
    pub fn new(mixer: Mixer<L>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(mixer)),
        }
    }

    pub fn with_config(config: MixerConfig) -> Self {
        Self::new(Mixer::with_config(config))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Mixer<L>>, MixerError> {
        self.inner.read().map_err(|_| MixerError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Mixer<L>>, MixerError> {
        self.inner.write().map_err(|_| MixerError::LockPoisoned)
    }

    pub fn len(&self) -> Result<usize, MixerError> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, MixerError> {
        Ok(self.read()?.is_empty())
    }

    pub fn has(&self, id: impl AsRef<str>) -> Result<bool, MixerError> {
        Ok(self.read()?.has(id))
    }

    /// Cloned handle for `id`, if present.
    pub fn get(&self, id: impl AsRef<str>) -> Result<Option<Entry<L>>, MixerError> {
        Ok(self.read()?.get(id).cloned())
    }

    pub fn put(&self, leaf: L) -> Result<Entry<L>, MixerError> {
        Ok(self.write()?.put(leaf))
    }

    pub fn remove(&self, id: impl AsRef<str>) -> Result<Option<Entry<L>>, MixerError> {
        Ok(self.write()?.remove(id))
    }

    pub fn register(&self, compound: CompoundExpression<L>) -> Result<Entry<L>, MixerError> {
        self.write()?.register(compound)
    }

    pub fn and(
        &self,
        operands: impl IntoIterator<Item = Operand<L>>,
    ) -> Result<Entry<L>, MixerError> {
        self.write()?.and(operands)
    }

    pub fn or(
        &self,
        operands: impl IntoIterator<Item = Operand<L>>,
    ) -> Result<Entry<L>, MixerError> {
        self.write()?.or(operands)
    }

    pub fn not(
        &self,
        operands: impl IntoIterator<Item = Operand<L>>,
    ) -> Result<Entry<L>, MixerError> {
        self.write()?.not(operands)
    }

    pub fn resolve(&self, id: impl AsRef<str>) -> Result<Sqon<L>, MixerError> {
        self.read()?.resolve(id)
    }

    pub fn all_references(&self, id: impl AsRef<str>) -> Result<BTreeSet<EntryId>, MixerError> {
        self.read()?.all_references(id)
    }

    pub fn has_loops(&self, ids: &[EntryId]) -> Result<bool, MixerError> {
        self.read()?.has_loops(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReferencePolicy;
    use crate::sqon::{Child, Combinator};
    use std::thread;

    #[test]
    fn concurrent_puts_never_share_an_id() {
        let shared: SharedMixer<u32> = SharedMixer::default();
        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let shared = shared.clone();
                thread::spawn(move || {
                    (0..50)
                        .map(|n| shared.put(worker * 100 + n).expect("put").id().clone())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids = BTreeSet::new();
        for handle in handles {
            ids.extend(handle.join().expect("worker must not panic"));
        }
        assert_eq!(ids.len(), 200);
        assert_eq!(shared.len().expect("len"), 200);
    }

    #[test]
    fn resolves_through_shared_handle() {
        let shared = SharedMixer::default();
        let a = shared.put("a").expect("put");
        let b = shared.put("b").expect("put");
        let either = shared.or([(&a).into(), (&b).into()]).expect("or");

        let reader = shared.clone();
        let tree = thread::spawn(move || reader.resolve(either.id()))
            .join()
            .expect("reader must not panic")
            .expect("resolve");
        assert_eq!(tree.leaves(), vec![&"a", &"b"]);
    }

    #[test]
    fn lookup_register_and_remove_through_shared_handle() {
        let shared = SharedMixer::default();
        let a = shared.put("a").expect("put");
        let not_a = shared.not([(&a).into()]).expect("not");

        assert_eq!(shared.get(not_a.id()).expect("get"), Some(not_a.clone()));
        let pair = [a.id().clone(), not_a.id().clone()];
        assert!(!shared.has_loops(&pair).expect("has_loops"));

        let either = shared
            .register(CompoundExpression::new(
                Combinator::Or,
                vec![Child::Reference(a.id().clone()), Child::Leaf("b")],
            ))
            .expect("register");
        assert_eq!(either.references(), &BTreeSet::from([a.id().clone()]));

        assert_eq!(shared.remove(a.id()).expect("remove"), Some(a.clone()));
        assert_eq!(shared.get(a.id()).expect("get"), None);
        assert!(matches!(
            shared.has_loops(&pair),
            Err(MixerError::UnknownReference { id }) if id == *a.id()
        ));
    }

    #[test]
    fn shared_handle_honours_strict_policy() {
        let shared =
            SharedMixer::with_config(MixerConfig::default().with_policy(ReferencePolicy::Strict));
        let a = shared.put("a").expect("put");
        let not_a = shared.not([(&a).into()]).expect("not");

        assert!(
            shared
                .has_loops(&[a.id().clone(), not_a.id().clone()])
                .expect("has_loops")
        );
    }

    #[test]
    fn poisoned_lock_surfaces_as_error() {
        let shared: SharedMixer<u8> = SharedMixer::default();
        let poisoner = shared.clone();
        let _ = thread::spawn(move || {
            let _guard = poisoner.inner.write().expect("first lock");
            panic!("poison the lock");
        })
        .join();

        assert!(matches!(shared.put(1), Err(MixerError::LockPoisoned)));
    }
}
