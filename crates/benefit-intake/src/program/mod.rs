//! Program and block definitions authored by administrators.

mod block_definition;
mod predicate;
mod program_definition;

use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

pub use block_definition::{BlockDefinition, ProgramQuestionDefinition};
pub use predicate::{
    LeafOperation, Operator, PredicateDefinition, PredicateExpressionNode, PredicateValue,
};
pub use program_definition::{ProgramDefinition, ProgramDefinitionBuilder, ProgramError};

/// Identifier wrapper for program versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgramId(pub u64);

impl ProgramId {
    /// Value written to `program_updated_in`; `None` when the id does not fit a stored long.
    pub fn stamp(self) -> Option<i64> {
        i64::try_from(self.0).ok()
    }

    /// True when a stored `program_updated_in` value names this program.
    pub fn is_stamped_as(self, stored: i64) -> bool {
        u64::try_from(stored).is_ok_and(|id| id == self.0)
    }
}

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Block identifier, unique only within one program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockDefinitionId(pub u64);

impl fmt::Display for BlockDefinitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lazily computed value cached on an immutable definition.
///
/// Ignored by equality so cached and uncached copies compare equal.
#[derive(Clone)]
pub(crate) struct Memo<T>(OnceLock<T>);

impl<T> Memo<T> {
    pub(crate) fn get_or_init(&self, init: impl FnOnce() -> T) -> &T {
        self.0.get_or_init(init)
    }
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self(OnceLock::new())
    }
}

impl<T> PartialEq for Memo<T> {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl<T> Eq for Memo<T> {}

impl<T> fmt::Debug for Memo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0.get().is_some() {
            "Memo(cached)"
        } else {
            "Memo(pending)"
        })
    }
}
