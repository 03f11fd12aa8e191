//! # sqon-mixer
//!
//! Reference-tracked workspace for Boolean combinations of SQON filters.
//!
//! Callers register leaf filters, combine registered entries by reference
//! with `and` / `or` / `not`, and resolve any entry into a self-contained
//! tree for a query engine. The mixer owns identifiers, keeps the
//! reference graph acyclic, and never inspects leaves.
//!
//! ## Architecture
//!
//! ```text
//! IdGenerator            ← namespaced, monotonic identifiers
//!     │
//! Mixer<L>               ← entries + reference graph, the only authority
//!     │                    for identifier existence
//! Entry<L>               ← immutable handle: id, payload, direct references
//!     │
//! ReferenceGraph         ← closures and cycle search
//!     │
//! Sqon<L>                ← resolved tree, no identifiers left
//! ```
//!
//! ```
//! use sqon_mixer::{Combinator, Mixer, Operand, Sqon};
//!
//! let mut mixer = Mixer::new();
//! let adult = mixer.put("age >= 18");
//! let female = mixer.put("sex = F");
//! let both = mixer.and([Operand::from(&adult), Operand::from(&female)])?;
//!
//! assert_eq!(
//!     mixer.resolve(both.id())?,
//!     Sqon::compound(
//!         Combinator::And,
//!         vec![Sqon::Leaf("age >= 18"), Sqon::Leaf("sex = F")],
//!     )
//! );
//! # Ok::<(), sqon_mixer::MixerError>(())
//! ```

pub mod config;
pub mod entry;
pub mod error;
pub mod graph;
pub mod id;
pub mod mixer;
pub mod shared;
pub mod sqon;

pub use config::{MixerConfig, ReferencePolicy};
pub use entry::{Entry, Operand, Payload};
pub use error::MixerError;
pub use graph::ReferenceGraph;
pub use id::{EntryId, IdGenerator};
pub use mixer::Mixer;
pub use shared::SharedMixer;
pub use sqon::{Child, Combinator, CompoundExpression, Sqon};
