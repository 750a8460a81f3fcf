//! Handles to facts inserted into a session.

use std::any::TypeId;
use std::fmt;

use crate::fact::FactId;

/// Identifies one live fact of a [`ScoringSession`](super::ScoringSession).
///
/// Returned by `insert`; pass it to `update` and `retract`. The handle stays
/// valid across updates and is invalidated by `retract`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FactHandle {
    pub(crate) id: FactId,
    pub(crate) type_id: TypeId,
    pub(crate) type_name: &'static str,
}

impl FactHandle {
    pub fn id(&self) -> FactId {
        self.id
    }

    /// Rust type name of the fact's value.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Display for FactHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = self.type_name.rsplit("::").next().unwrap_or(self.type_name);
        write!(f, "{}{}", short, self.id)
    }
}
