//! Error types for mixer operations.

use crate::id::EntryId;

/// Errors raised by the mixer.
///
/// Every error terminates only the call that raised it; the mixer is left
/// exactly as it was before the call.
#[derive(Debug, thiserror::Error)]
pub enum MixerError {
    /// An identifier or handle does not name an entry in this mixer.
    #[error("unknown reference: {id} is not an entry in this mixer")]
    UnknownReference { id: EntryId },

    /// Registering the combination would introduce a reference cycle.
    #[error("cycle detected among references: {}", join_ids(.ids))]
    CycleDetected { ids: Vec<EntryId> },

    /// The lock guarding a shared mixer was poisoned by a panicking writer.
    #[error("shared mixer lock poisoned")]
    LockPoisoned,

    #[error("invalid mixer config: {source}")]
    Config {
        #[source]
        source: toml::de::Error,
    },
}

impl MixerError {
    pub(crate) fn unknown(id: impl Into<EntryId>) -> Self {
        Self::UnknownReference { id: id.into() }
    }
}

fn join_ids(ids: &[EntryId]) -> String {
    ids.iter()
        .map(EntryId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}
