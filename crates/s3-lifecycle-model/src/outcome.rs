//! Result of reconciling one rule on one bucket.

use serde::{Deserialize, Serialize};

/// What a reconciliation call did to the bucket's rule collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    /// The rule was present with the desired parameters; nothing written.
    Unchanged,
    /// The rule was missing and has been appended.
    Created,
    /// The rule was present with other parameters and has been updated in place.
    Updated,
}

impl Outcome {
    /// Returns the string value of this outcome.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Created => "created",
            Self::Updated => "updated",
        }
    }

    /// Whether the outcome requires writing the rule collection back.
    #[must_use]
    pub fn requires_write(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
