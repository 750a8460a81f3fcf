// Joiners for join and exists streams.
//
// A joiner is either indexing (an equality key extracted from each side) or
// filtering (an arbitrary predicate over the left tuple and the right tuple).
// Within one call every indexing joiner must come before every filtering
// joiner, and `none()` stands alone.
//
// # Example
//
// ```
// use streamforge_scoring::stream::joiner::{equal, filtering, Joiner};
// use streamforge_scoring::Tuple;
//
// let joiners: Vec<Joiner> = vec![
//     equal(|l: &Tuple| *l.a::<(u32, i64)>(), |r: &Tuple| *r.a::<(u32, i64)>()),
//     filtering(|l: &Tuple, r: &Tuple| l.a::<(u32, i64)>().1 < r.a::<(u32, i64)>().1),
// ];
// assert!(joiners[0].is_indexing());
// assert!(!joiners[1].is_indexing());
// ```

mod compiled;
mod equal;
mod filtering;


use std::fmt;

use crate::fact::Fact;
use crate::tuple::Tuple;

pub(crate) use compiled::{CompiledJoiners, JoinKey};
pub use equal::{equal, equal_by};
pub use filtering::{filtering, none};

/// Extracts one indexing key component from a tuple.
pub type DynKeyFn = Box<dyn Fn(&Tuple) -> Fact + Send + Sync>;

/// Predicate over a (left, right) tuple pair.
pub type DynPairPredicate = Box<dyn Fn(&Tuple, &Tuple) -> bool + Send + Sync>;

/// One match rule of a join or exists call.
pub enum Joiner {
    /// Equality on a key extracted from each side. Indexable.
    Equal { left: DynKeyFn, right: DynKeyFn },
    /// Arbitrary predicate over both sides. Not indexable.
    Filtering(DynPairPredicate),
    /// Cartesian match. Must be the only joiner of its call.
    None,
}

impl Joiner {
    /// Returns true for joiners that contribute to the hash index key.
    pub fn is_indexing(&self) -> bool {
        matches!(self, Joiner::Equal { .. })
    }

    fn kind(&self) -> &'static str {
        match self {
            Joiner::Equal { .. } => "equal",
            Joiner::Filtering(_) => "filtering",
            Joiner::None => "none",
        }
    }
}

impl fmt::Debug for Joiner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Joiner::{}", self.kind())
    }
}
