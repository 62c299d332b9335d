use serde::{Deserialize, Serialize};
use std::fmt;

/// What the write path actually did with a `NewMemory`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOutcome {
    /// A brand-new row was inserted.
    Created,
    /// An existing near-identical memory absorbed the write.
    Deduplicated,
    /// Evidence was merged into an existing similar memory.
    Consolidated,
    /// The write contradicted an existing memory, which is now superseded.
    ConflictResolved,
    /// The merge promoted a draft to active.
    Matured,
}

impl WriteOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Deduplicated => "deduplicated",
            Self::Consolidated => "consolidated",
            Self::ConflictResolved => "conflict_resolved",
            Self::Matured => "matured",
        }
    }
}

impl fmt::Display for WriteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
