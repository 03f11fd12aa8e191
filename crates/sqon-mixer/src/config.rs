//! Mixer configuration.
//!
//! ```toml
//! label = "explorer"
//! timestamp = true
//! policy = "strict"
//! ```

use crate::error::MixerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the cycle pre-check treats shared dependencies among the operands of
/// one combination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferencePolicy {
    /// Diamonds are accepted: an operand may already be reachable from
    /// another operand of the same combination.
    #[default]
    AllowShared,
    /// Reject a combination where one referenced operand appears in the
    /// transitive closure of another.
    Strict,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MixerConfig {
    /// Namespace label prefixed to every identifier.
    pub label: Option<String>,
    /// Append the creation time (ms since epoch) to the namespace.
    pub timestamp: bool,
    pub policy: ReferencePolicy,
}

impl MixerConfig {
    pub fn labelled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    pub fn with_timestamp(mut self) -> Self {
        self.timestamp = true;
        self
    }

    pub fn with_policy(mut self, policy: ReferencePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn from_toml_str(text: &str) -> Result<Self, MixerError> {
        toml::from_str(text).map_err(|source| MixerError::Config { source })
    }

    /// Identifier namespace for a mixer created at `created_at`.
    ///
    /// Empty when neither a label nor a timestamp is configured.
    pub fn namespace(&self, created_at: DateTime<Utc>) -> String {
        let mut parts = Vec::with_capacity(2);
        if let Some(label) = self.label.as_deref().filter(|label| !label.is_empty()) {
            parts.push(label.to_string());
        }
        if self.timestamp {
            parts.push(created_at.timestamp_millis().to_string());
        }
        parts.join("_")
    }
}
